//! Perspective camera with damped orbit controls and view presets.

use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use super::picking::Ray;

pub const FOV_DEGREES: f32 = 45.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 5000.0;
pub const DAMPING_FACTOR: f32 = 0.05;
pub const MIN_DISTANCE: f32 = 100.0;
/// Lower bound of the far orbit limit
pub const BASE_MAX_DISTANCE: f32 = 1000.0;
/// Camera travel per zoom in/out step
pub const ZOOM_STEP: f32 = 50.0;

/// Axis-aligned extent of the rendered structure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for SceneBounds {
    fn default() -> Self {
        Self {
            min: Vec3::splat(-100.0),
            max: Vec3::splat(100.0),
        }
    }
}

impl SceneBounds {
    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Longest side
    pub fn extent(&self) -> f32 {
        self.size().max_element()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraPreset {
    Isometric,
    /// Elevation, looking along -Z
    Front,
    /// Plan, looking down -Y
    Top,
    /// End-on, looking along -X
    Side,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 500.0),
            fov_degrees: FOV_DEGREES,
            aspect: 800.0 / 400.0,
            near: NEAR,
            far: FAR,
        }
    }
}

impl PerspectiveCamera {
    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    pub fn view_matrix(&self, target: Vec3) -> Mat4 {
        Mat4::look_at_rh(self.position, target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    /// Ray from the camera through a pixel of a `width` x `height` surface
    pub fn screen_ray(&self, target: Vec3, px: f32, py: f32, width: f32, height: f32) -> Ray {
        let ndc_x = (px / width) * 2.0 - 1.0;
        let ndc_y = 1.0 - (py / height) * 2.0;

        let vp_inv = (self.projection_matrix() * self.view_matrix(target)).inverse();
        let near = vp_inv * Vec4::new(ndc_x, ndc_y, -1.0, 1.0);
        let far = vp_inv * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let near = near.truncate() / near.w;
        let far = far.truncate() / far.w;

        Ray {
            origin: self.position,
            direction: (far - near).normalize_or_zero(),
        }
    }
}

/// Damped orbit around a target point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitControls {
    pub target: Vec3,
    pub damping: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Rotation still to be applied (yaw, pitch), radians
    pending: (f32, f32),
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            damping: DAMPING_FACTOR,
            min_distance: MIN_DISTANCE,
            max_distance: BASE_MAX_DISTANCE,
            pending: (0.0, 0.0),
        }
    }
}

impl OrbitControls {
    /// Far limit for a structure of the given extent
    pub fn max_distance_for(extent: f32) -> f32 {
        BASE_MAX_DISTANCE.max(4.0 * extent)
    }

    /// Queue a drag rotation (radians)
    pub fn rotate(&mut self, yaw: f32, pitch: f32) {
        self.pending.0 += yaw;
        self.pending.1 += pitch;
    }

    pub fn is_settled(&self) -> bool {
        self.pending.0.abs() < 1e-5 && self.pending.1.abs() < 1e-5
    }

    /// One frame: apply a damped share of the pending rotation, clamp distance
    pub fn update(&mut self, camera: &mut PerspectiveCamera) {
        let offset = camera.position - self.target;
        let radius = offset.length();

        let (d_yaw, d_pitch) = (self.pending.0 * self.damping, self.pending.1 * self.damping);
        self.pending.0 -= d_yaw;
        self.pending.1 -= d_pitch;
        if self.is_settled() {
            self.pending = (0.0, 0.0);
        }

        let mut yaw = offset.x.atan2(offset.z);
        let mut polar = if radius > 0.0 { (offset.y / radius).clamp(-1.0, 1.0).acos() } else { 0.0 };
        yaw += d_yaw;
        polar = (polar - d_pitch).clamp(1e-3, std::f32::consts::PI - 1e-3);

        let distance = radius.clamp(self.min_distance, self.max_distance);
        let direction = Vec3::new(polar.sin() * yaw.sin(), polar.cos(), polar.sin() * yaw.cos());
        camera.position = self.target + direction * distance;
    }
}

/// Camera plus controls, with presets derived from the structure bounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraRig {
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
}

impl CameraRig {
    pub fn for_bounds(bounds: &SceneBounds, width: f32, height: f32) -> Self {
        let mut rig = Self::default();
        rig.camera.set_aspect(width, height);
        rig.fit(bounds);
        rig.reset(bounds);
        rig
    }

    /// Re-derive the far orbit limit from the bounds
    pub fn fit(&mut self, bounds: &SceneBounds) {
        self.controls.max_distance = OrbitControls::max_distance_for(bounds.extent());
    }

    /// Recentre on the structure's centroid, default oblique position
    pub fn reset(&mut self, bounds: &SceneBounds) {
        let size = bounds.size();
        let target = bounds.centroid();
        self.controls.target = target;
        self.camera.position = target + Vec3::new(size.x * 1.5, size.y * 2.0, size.z * 3.0);
        self.controls.update(&mut self.camera);
    }

    pub fn apply_preset(&mut self, preset: CameraPreset, bounds: &SceneBounds) {
        let Vec3 { x: length, y: height, z: width } = bounds.size();
        let target = bounds.centroid();
        let offset = match preset {
            CameraPreset::Isometric => Vec3::splat(width.max(height).max(length) * 1.5 * 0.7),
            CameraPreset::Front => Vec3::new(0.0, 0.0, height.max(length) * 1.2),
            // A tiny Z component keeps look-at well defined straight overhead
            CameraPreset::Top => {
                let d = width.max(length) * 1.5;
                Vec3::new(0.0, d, d * 1e-3)
            }
            CameraPreset::Side => Vec3::new(width.max(height) * 4.0, 0.0, 0.0),
        };
        self.controls.target = target;
        self.camera.position = target + offset;
        self.controls.update(&mut self.camera);
    }

    /// Move along the view vector by `ZOOM_STEP`; negative steps zoom out
    fn dolly(&mut self, step: f32) {
        let direction = (self.controls.target - self.camera.position).normalize_or_zero();
        self.camera.position += direction * step;
        self.controls.update(&mut self.camera);
    }

    pub fn zoom_in(&mut self) {
        self.dolly(ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.dolly(-ZOOM_STEP);
    }

    pub fn distance(&self) -> f32 {
        (self.camera.position - self.controls.target).length()
    }

    pub fn screen_ray(&self, px: f32, py: f32, width: f32, height: f32) -> Ray {
        self.camera.screen_ray(self.controls.target, px, py, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bounds() -> SceneBounds {
        SceneBounds {
            min: Vec3::new(-160.0, -140.0, -10.0),
            max: Vec3::new(160.0, 20.0, 10.0),
        }
    }

    #[test]
    fn test_far_limit_grows_with_structure() {
        assert_eq!(OrbitControls::max_distance_for(100.0), 1000.0);
        assert_eq!(OrbitControls::max_distance_for(2000.0), 8000.0);
    }

    #[test]
    fn test_reset_targets_centroid() {
        let rig = CameraRig::for_bounds(&bounds(), 800.0, 400.0);
        assert_eq!(rig.controls.target, Vec3::new(0.0, -60.0, 0.0));
        assert!(rig.distance() >= MIN_DISTANCE);
        assert!(rig.distance() <= rig.controls.max_distance + 1e-3);
        assert_eq!(rig.camera.far, FAR);
    }

    #[test]
    fn test_zoom_moves_by_fixed_step() {
        let mut rig = CameraRig::for_bounds(&bounds(), 800.0, 400.0);
        rig.apply_preset(CameraPreset::Front, &bounds());
        let before = rig.distance();
        rig.zoom_in();
        assert_relative_eq!(rig.distance(), before - ZOOM_STEP, epsilon = 1e-2);
        rig.zoom_out();
        assert_relative_eq!(rig.distance(), before, epsilon = 1e-2);
    }

    #[test]
    fn test_zoom_is_clamped_to_min_distance() {
        let mut rig = CameraRig::for_bounds(&bounds(), 800.0, 400.0);
        for _ in 0..40 {
            rig.zoom_in();
        }
        assert_relative_eq!(rig.distance(), MIN_DISTANCE, epsilon = 1e-2);
    }

    #[test]
    fn test_presets_look_along_axes() {
        let mut rig = CameraRig::for_bounds(&bounds(), 800.0, 400.0);
        let target = bounds().centroid();

        rig.apply_preset(CameraPreset::Front, &bounds());
        let dir = (rig.camera.position - target).normalize();
        assert_relative_eq!(dir.z, 1.0, epsilon = 1e-3);

        rig.apply_preset(CameraPreset::Top, &bounds());
        let dir = (rig.camera.position - target).normalize();
        assert_relative_eq!(dir.y, 1.0, epsilon = 1e-2);

        rig.apply_preset(CameraPreset::Side, &bounds());
        let dir = (rig.camera.position - target).normalize();
        assert_relative_eq!(dir.x, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_damped_rotation_settles() {
        let mut rig = CameraRig::for_bounds(&bounds(), 800.0, 400.0);
        let start = rig.camera.position;
        rig.controls.rotate(0.5, 0.0);
        rig.controls.update(&mut rig.camera);
        let first = rig.camera.position;
        assert_ne!(first, start);
        for _ in 0..400 {
            rig.controls.update(&mut rig.camera);
        }
        assert!(rig.controls.is_settled());
    }

    #[test]
    fn test_center_ray_hits_target_direction() {
        let rig = CameraRig::for_bounds(&bounds(), 800.0, 400.0);
        let ray = rig.screen_ray(400.0, 200.0, 800.0, 400.0);
        let expected = (rig.controls.target - rig.camera.position).normalize();
        assert_relative_eq!(ray.direction.dot(expected), 1.0, epsilon = 1e-3);
    }
}
