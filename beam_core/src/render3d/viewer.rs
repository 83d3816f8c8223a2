//! # 3D Viewer Lifecycle
//!
//! `Viewer3D` owns the camera rig and the current scene, and drives a
//! [`RenderBackend`] through mount, rebuild, per-frame ticks and teardown.
//!
//! The scene is rebuilt from scratch whenever the model version, the view
//! mode or the overlay changes. Every GPU resource of the previous scene is
//! released before the next one is uploaded. Teardown always runs in this
//! order:
//!
//! 1. input listeners removed
//! 2. pending animation frame cancelled
//! 3. orbit controls unbound
//! 4. scene geometries and materials disposed
//! 5. renderer detached
//!
//! Container resize and visibility events never resize the renderer
//! directly. They schedule a debounced re-measurement through a
//! [`ViewportTracker`], and [`Viewer3D::poll_viewport`] applies it once due.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diagram::DiagramOverlay;
use crate::errors::{CalcError, CalcResult};
use crate::projection::{Viewport, ViewportTracker};
use crate::render2d::ViewMode;

use super::builder::{build_scene, diagram_plane_z, scene_bounds, SceneInput};
use super::camera::{CameraPreset, CameraRig, SceneBounds};
use super::picking::{pick_tagged, ray_plane_z};
use super::scene::{Geometry, Material, NodeKind, Scene};

// ============================================================================
// Backend seam
// ============================================================================

/// Opaque handle to a backend-owned resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub u64);

/// Handle of a requested animation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Listener {
    Resize,
    PointerMove,
    PointerLeave,
}

const LISTENERS: [Listener; 3] = [Listener::Resize, Listener::PointerMove, Listener::PointerLeave];

/// What a concrete renderer (WebGL, wgpu, headless) must provide
pub trait RenderBackend {
    fn attach(&mut self, width: u32, height: u32) -> CalcResult<()>;
    fn resize(&mut self, width: u32, height: u32);
    fn detach(&mut self);

    fn create_geometry(&mut self, geometry: &Geometry) -> ResourceId;
    fn create_material(&mut self, material: &Material) -> ResourceId;
    fn dispose_geometry(&mut self, id: ResourceId);
    fn dispose_material(&mut self, id: ResourceId);

    fn draw(&mut self, scene: &Scene, rig: &CameraRig);
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);

    fn add_listener(&mut self, listener: Listener);
    fn remove_listener(&mut self, listener: Listener);
    fn bind_controls(&mut self);
    fn unbind_controls(&mut self);
}

// ============================================================================
// Headless backend
// ============================================================================

/// One backend call, as recorded by [`HeadlessBackend`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendEvent {
    Attach { width: u32, height: u32 },
    Resize { width: u32, height: u32 },
    Detach,
    CreateGeometry(ResourceId),
    CreateMaterial(ResourceId),
    DisposeGeometry(ResourceId),
    DisposeMaterial(ResourceId),
    Draw,
    RequestFrame(FrameHandle),
    CancelFrame(FrameHandle),
    AddListener(Listener),
    RemoveListener(Listener),
    BindControls,
    UnbindControls,
}

#[derive(Debug, Default)]
pub struct HeadlessState {
    pub attached: bool,
    pub live_geometries: usize,
    pub live_materials: usize,
    pub listeners: Vec<Listener>,
    pub controls_bound: bool,
    pub pending_frame: Option<FrameHandle>,
    pub draws: usize,
    pub events: Vec<BackendEvent>,
    next_id: u64,
}

impl HeadlessState {
    /// True when nothing the viewer acquired is still held
    pub fn is_released(&self) -> bool {
        !self.attached
            && self.live_geometries == 0
            && self.live_materials == 0
            && self.listeners.is_empty()
            && !self.controls_bound
            && self.pending_frame.is_none()
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Backend without a GPU: counts live resources and records every call.
///
/// The state is shared so it can be inspected after the viewer is dropped.
#[derive(Debug, Clone, Default)]
pub struct HeadlessBackend {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Rc<RefCell<HeadlessState>> {
        Rc::clone(&self.state)
    }

    fn record(&self, event: BackendEvent) {
        self.state.borrow_mut().events.push(event);
    }
}

impl RenderBackend for HeadlessBackend {
    fn attach(&mut self, width: u32, height: u32) -> CalcResult<()> {
        if self.state.borrow().attached {
            return Err(CalcError::Internal { message: "renderer already attached".to_string() });
        }
        self.state.borrow_mut().attached = true;
        self.record(BackendEvent::Attach { width, height });
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.record(BackendEvent::Resize { width, height });
    }

    fn detach(&mut self) {
        self.state.borrow_mut().attached = false;
        self.record(BackendEvent::Detach);
    }

    fn create_geometry(&mut self, _geometry: &Geometry) -> ResourceId {
        let id = {
            let mut state = self.state.borrow_mut();
            state.live_geometries += 1;
            ResourceId(state.next())
        };
        self.record(BackendEvent::CreateGeometry(id));
        id
    }

    fn create_material(&mut self, _material: &Material) -> ResourceId {
        let id = {
            let mut state = self.state.borrow_mut();
            state.live_materials += 1;
            ResourceId(state.next())
        };
        self.record(BackendEvent::CreateMaterial(id));
        id
    }

    fn dispose_geometry(&mut self, id: ResourceId) {
        {
            let mut state = self.state.borrow_mut();
            state.live_geometries = state.live_geometries.saturating_sub(1);
        }
        self.record(BackendEvent::DisposeGeometry(id));
    }

    fn dispose_material(&mut self, id: ResourceId) {
        {
            let mut state = self.state.borrow_mut();
            state.live_materials = state.live_materials.saturating_sub(1);
        }
        self.record(BackendEvent::DisposeMaterial(id));
    }

    fn draw(&mut self, _scene: &Scene, _rig: &CameraRig) {
        self.state.borrow_mut().draws += 1;
        self.record(BackendEvent::Draw);
    }

    fn request_frame(&mut self) -> FrameHandle {
        let handle = {
            let mut state = self.state.borrow_mut();
            let handle = FrameHandle(state.next());
            state.pending_frame = Some(handle);
            handle
        };
        self.record(BackendEvent::RequestFrame(handle));
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        {
            let mut state = self.state.borrow_mut();
            if state.pending_frame == Some(handle) {
                state.pending_frame = None;
            }
        }
        self.record(BackendEvent::CancelFrame(handle));
    }

    fn add_listener(&mut self, listener: Listener) {
        self.state.borrow_mut().listeners.push(listener);
        self.record(BackendEvent::AddListener(listener));
    }

    fn remove_listener(&mut self, listener: Listener) {
        self.state.borrow_mut().listeners.retain(|l| *l != listener);
        self.record(BackendEvent::RemoveListener(listener));
    }

    fn bind_controls(&mut self) {
        self.state.borrow_mut().controls_bound = true;
        self.record(BackendEvent::BindControls);
    }

    fn unbind_controls(&mut self) {
        self.state.borrow_mut().controls_bound = false;
        self.record(BackendEvent::UnbindControls);
    }
}

// ============================================================================
// Viewer
// ============================================================================

/// What the pointer is over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HoverInfo {
    /// Beam or column dimensions
    Member { tooltip: String },
    /// Nearest diagram sample (world x, display value)
    Diagram { x: f64, value: f64 },
}

/// Inputs the current scene was built from
#[derive(Debug, Clone, PartialEq)]
struct SceneKey {
    version: u64,
    mode: ViewMode,
    overlay: Option<DiagramOverlay>,
}

impl SceneKey {
    fn of(input: &SceneInput<'_>, version: u64) -> Self {
        Self {
            version,
            mode: input.mode,
            overlay: input.overlay.cloned(),
        }
    }
}

pub struct Viewer3D<B: RenderBackend> {
    backend: B,
    rig: CameraRig,
    bounds: SceneBounds,
    scene: Scene,
    key: Option<SceneKey>,
    plane_z: f32,
    geometries: Vec<ResourceId>,
    materials: Vec<ResourceId>,
    frame: Option<FrameHandle>,
    size: (u32, u32),
    tracker: ViewportTracker,
    mounted: bool,
}

impl<B: RenderBackend> Viewer3D<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            rig: CameraRig::default(),
            bounds: SceneBounds::default(),
            scene: Scene::new(),
            key: None,
            plane_z: 0.0,
            geometries: Vec::new(),
            materials: Vec::new(),
            frame: None,
            size: (0, 0),
            tracker: ViewportTracker::new(),
            mounted: false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn bounds(&self) -> SceneBounds {
        self.bounds
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Attach the renderer, bind input and build the first scene
    pub fn mount(&mut self, input: &SceneInput<'_>, version: u64, width: u32, height: u32) -> CalcResult<()> {
        if self.mounted {
            return Ok(());
        }
        if width == 0 || height == 0 {
            return Err(CalcError::invalid_input("viewport", format!("{}x{}", width, height), "must be non-zero"));
        }

        self.backend.attach(width, height)?;
        self.size = (width, height);
        self.tracker = ViewportTracker::starting_at(Viewport::new(width as f64, height as f64));
        self.mounted = true;
        for listener in LISTENERS {
            self.backend.add_listener(listener);
        }
        self.backend.bind_controls();

        self.bounds = scene_bounds(input.model);
        self.rig = CameraRig::for_bounds(&self.bounds, width as f32, height as f32);
        self.rebuild(input, version);
        self.frame = Some(self.backend.request_frame());
        debug!(width, height, "3D viewer mounted");
        Ok(())
    }

    /// Rebuild when the model version, mode or overlay changed.
    ///
    /// Returns whether a rebuild happened.
    pub fn update(&mut self, input: &SceneInput<'_>, version: u64) -> bool {
        if !self.mounted {
            return false;
        }
        let key = SceneKey::of(input, version);
        if self.key.as_ref() == Some(&key) {
            return false;
        }
        self.bounds = scene_bounds(input.model);
        self.rig.fit(&self.bounds);
        self.rebuild(input, version);
        true
    }

    fn rebuild(&mut self, input: &SceneInput<'_>, version: u64) {
        self.release_scene();

        self.scene = build_scene(input);
        self.plane_z = diagram_plane_z(input.model);
        self.key = Some(SceneKey::of(input, version));

        let backend = &mut self.backend;
        let (geometries, materials) = (&mut self.geometries, &mut self.materials);
        self.scene.traverse(|node| match &node.kind {
            NodeKind::Mesh { geometry, material } => {
                geometries.push(backend.create_geometry(geometry));
                materials.push(backend.create_material(material));
            }
            NodeKind::Sprite { material, .. } => materials.push(backend.create_material(material)),
            _ => {}
        });
        debug!(
            version,
            geometries = self.geometries.len(),
            materials = self.materials.len(),
            "3D scene uploaded"
        );
    }

    fn release_scene(&mut self) {
        if self.geometries.is_empty() && self.materials.is_empty() {
            return;
        }
        debug!(
            geometries = self.geometries.len(),
            materials = self.materials.len(),
            "disposing 3D scene"
        );
        for id in self.geometries.drain(..) {
            self.backend.dispose_geometry(id);
        }
        for id in self.materials.drain(..) {
            self.backend.dispose_material(id);
        }
    }

    /// One animation frame: advance damping, draw, schedule the next frame
    pub fn tick(&mut self) {
        if !self.mounted {
            return;
        }
        self.rig.controls.update(&mut self.rig.camera);
        self.backend.draw(&self.scene, &self.rig);
        self.frame = Some(self.backend.request_frame());
    }

    /// Window resize listener fired
    pub fn on_resize(&mut self, now: Instant) {
        if self.mounted {
            self.tracker.on_resize(now);
        }
    }

    /// Container visibility observer fired
    pub fn on_visibility(&mut self, visible: bool, now: Instant) {
        if self.mounted {
            self.tracker.on_visibility(visible, now);
        }
    }

    /// Apply the container's measured size if a re-measurement is due.
    ///
    /// Returns true when the renderer was resized. Zero-width readings from a
    /// hidden container are dropped.
    pub fn poll_viewport(&mut self, now: Instant, width: u32, height: u32) -> bool {
        if !self.mounted || !self.tracker.poll(now, Viewport::new(width as f64, height as f64)) {
            return false;
        }
        let viewport = self.tracker.viewport();
        let (width, height) = (viewport.width.round() as u32, viewport.height.round() as u32);
        if (width, height) == self.size {
            return false;
        }
        self.size = (width, height);
        self.rig.camera.set_aspect(width as f32, height as f32);
        self.backend.resize(width, height);
        debug!(width, height, "3D viewport resized");
        true
    }

    /// Pointer lookup at pixel `(px, py)`
    pub fn hover(&self, px: f32, py: f32) -> Option<HoverInfo> {
        if !self.mounted {
            return None;
        }
        let (w, h) = (self.size.0 as f32, self.size.1 as f32);
        let ray = self.rig.screen_ray(px, py, w, h);

        let key = self.key.as_ref()?;
        match key.mode {
            ViewMode::Diagram => {
                let overlay = key.overlay.as_ref()?;
                let hit = ray_plane_z(&ray, self.plane_z)?;
                let sample = overlay.nearest(hit.x as f64)?;
                Some(HoverInfo::Diagram { x: sample.x, value: sample.value })
            }
            ViewMode::Loads => pick_tagged(&self.scene, &ray).map(|tag| HoverInfo::Member { tooltip: tag.tooltip() }),
        }
    }

    // ========================================================================
    // Camera commands
    // ========================================================================

    pub fn apply_preset(&mut self, preset: CameraPreset) {
        self.rig.apply_preset(preset, &self.bounds);
    }

    pub fn reset_camera(&mut self) {
        self.rig.reset(&self.bounds);
    }

    pub fn zoom_in(&mut self) {
        self.rig.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.rig.zoom_out();
    }

    /// Release everything in teardown order. Safe to call twice.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        for listener in LISTENERS {
            self.backend.remove_listener(listener);
        }
        if let Some(frame) = self.frame.take() {
            self.backend.cancel_frame(frame);
        }
        self.backend.unbind_controls();
        self.release_scene();
        self.backend.detach();

        self.scene = Scene::new();
        self.key = None;
        self.mounted = false;
        debug!("3D viewer unmounted");
    }
}

impl<B: RenderBackend> Drop for Viewer3D<B> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{DiagramKind, DiagramPoint};
    use crate::model::StructuralModel;
    use glam::Vec3;
    use std::time::Duration;

    fn frame() -> StructuralModel {
        StructuralModel::new()
            .add_pillar(20.0, -160.0)
            .unwrap()
            .add_pillar(20.0, 160.0)
            .unwrap()
            .add_point_load(0.0, -10.0)
            .unwrap()
    }

    fn to_pixel(rig: &CameraRig, world: Vec3) -> (f32, f32) {
        let view = rig.camera.view_matrix(rig.controls.target);
        let clip = rig.camera.projection_matrix() * view * world.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        ((ndc.x + 1.0) * 0.5 * 800.0, (1.0 - ndc.y) * 0.5 * 400.0)
    }

    fn mounted(model: &StructuralModel) -> (Viewer3D<HeadlessBackend>, Rc<RefCell<HeadlessState>>) {
        let backend = HeadlessBackend::new();
        let state = backend.state();
        let mut viewer = Viewer3D::new(backend);
        viewer.mount(&SceneInput::loads(model), 1, 800, 400).unwrap();
        (viewer, state)
    }

    #[test]
    fn test_mount_uploads_every_resource() {
        let model = frame();
        let (viewer, state) = mounted(&model);
        let stats = viewer.scene().stats();
        let state = state.borrow();
        assert!(state.attached);
        assert!(state.controls_bound);
        assert_eq!(state.listeners.len(), 3);
        assert_eq!(state.live_geometries, stats.geometries);
        assert_eq!(state.live_materials, stats.materials);
        assert!(state.pending_frame.is_some());
    }

    #[test]
    fn test_update_skips_unchanged_inputs() {
        let model = frame();
        let (mut viewer, _) = mounted(&model);
        assert!(!viewer.update(&SceneInput::loads(&model), 1));
        assert!(viewer.update(&SceneInput::loads(&model), 2));
        assert!(viewer.update(&SceneInput::diagram(&model, None), 2));
    }

    #[test]
    fn test_repeated_rebuilds_do_not_leak() {
        let mut model = frame();
        let (mut viewer, state) = mounted(&model);
        for version in 2..20u64 {
            model = model.add_point_load(10.0 * version as f64 - 150.0, -1.0).unwrap();
            viewer.update(&SceneInput::loads(&model), version);
        }
        let stats = viewer.scene().stats();
        let state = state.borrow();
        assert_eq!(state.live_geometries, stats.geometries);
        assert_eq!(state.live_materials, stats.materials);
    }

    #[test]
    fn test_teardown_order() {
        let model = frame();
        let (mut viewer, state) = mounted(&model);
        viewer.tick();
        state.borrow_mut().events.clear();
        viewer.unmount();

        let state = state.borrow();
        assert!(state.is_released());
        let position = |pred: fn(&BackendEvent) -> bool| state.events.iter().position(pred).unwrap();
        let last_listener = state
            .events
            .iter()
            .rposition(|e| matches!(e, BackendEvent::RemoveListener(_)))
            .unwrap();
        let cancel = position(|e| matches!(e, BackendEvent::CancelFrame(_)));
        let unbind = position(|e| matches!(e, BackendEvent::UnbindControls));
        let first_dispose = position(|e| matches!(e, BackendEvent::DisposeGeometry(_) | BackendEvent::DisposeMaterial(_)));
        let detach = position(|e| matches!(e, BackendEvent::Detach));
        assert!(last_listener < cancel);
        assert!(cancel < unbind);
        assert!(unbind < first_dispose);
        assert!(first_dispose < detach);
        assert_eq!(detach, state.events.len() - 1);
    }

    #[test]
    fn test_drop_releases_everything() {
        let model = frame();
        let (viewer, state) = mounted(&model);
        drop(viewer);
        assert!(state.borrow().is_released());
    }

    #[test]
    fn test_unmount_is_idempotent() {
        let model = frame();
        let (mut viewer, state) = mounted(&model);
        viewer.unmount();
        let events = state.borrow().events.len();
        viewer.unmount();
        assert_eq!(state.borrow().events.len(), events);
        assert!(!viewer.is_mounted());
    }

    #[test]
    fn test_hover_reports_member_tooltip() {
        let model = frame();
        let (mut viewer, _) = mounted(&model);
        viewer.apply_preset(CameraPreset::Front);
        let (px, py) = to_pixel(viewer.rig(), Vec3::new(0.0, 0.0, 10.0));
        match viewer.hover(px, py) {
            Some(HoverInfo::Member { tooltip }) => assert_eq!(tooltip, "V1: 20 × 40 cm, L = 320 cm"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(viewer.hover(0.0, 0.0).is_none());
    }

    #[test]
    fn test_hover_reads_diagram_plane() {
        let model = frame();
        let overlay = DiagramOverlay::from_points(
            &model,
            DiagramKind::Shear,
            vec![DiagramPoint::new(-160.0, 5.0), DiagramPoint::new(0.0, 0.0), DiagramPoint::new(160.0, -5.0)],
        );
        let (mut viewer, _) = mounted(&model);
        viewer.update(&SceneInput::diagram(&model, Some(&overlay)), 2);
        viewer.apply_preset(CameraPreset::Front);
        match viewer.hover(400.0, 200.0) {
            Some(HoverInfo::Diagram { x, .. }) => assert_eq!(x, 0.0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_resize_is_debounced() {
        let model = frame();
        let (mut viewer, state) = mounted(&model);
        let start = Instant::now();

        assert!(!viewer.poll_viewport(start, 1024, 400));
        viewer.on_resize(start);
        assert!(!viewer.poll_viewport(start + Duration::from_millis(50), 1024, 400));
        assert!(viewer.poll_viewport(start + Duration::from_millis(100), 1024, 400));
        assert!(!viewer.poll_viewport(start + Duration::from_millis(200), 1024, 400));

        let resizes: Vec<_> = state
            .borrow()
            .events
            .iter()
            .filter(|e| matches!(e, BackendEvent::Resize { .. }))
            .cloned()
            .collect();
        assert_eq!(resizes, vec![BackendEvent::Resize { width: 1024, height: 400 }]);
    }

    #[test]
    fn test_hidden_container_keeps_last_size() {
        let model = frame();
        let (mut viewer, state) = mounted(&model);
        let start = Instant::now();

        viewer.on_visibility(false, start);
        assert!(!viewer.poll_viewport(start + Duration::from_millis(100), 0, 0));
        viewer.on_visibility(true, start);
        assert!(!viewer.poll_viewport(start + Duration::from_millis(100), 0, 0));
        assert!(!state.borrow().events.iter().any(|e| matches!(e, BackendEvent::Resize { .. })));

        viewer.on_visibility(true, start);
        assert!(viewer.poll_viewport(start + Duration::from_millis(100), 640, 480));
        assert_eq!(viewer.rig().camera.aspect, 640.0 / 480.0);
    }

    #[test]
    fn test_mount_rejects_zero_viewport() {
        let model = frame();
        let mut viewer = Viewer3D::new(HeadlessBackend::new());
        let err = viewer.mount(&SceneInput::loads(&model), 1, 0, 400).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(!viewer.is_mounted());
    }
}
