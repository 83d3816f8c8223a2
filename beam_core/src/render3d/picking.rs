//! Pointer picking: ray against the diagram plane or tagged meshes.

use glam::Vec3;

use super::scene::{Geometry, MeshTag, Scene};

/// A ray in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn centered(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }
}

/// Ray-AABB intersection using the slab method.
/// Returns the distance along the ray to the nearest hit, or None.
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    let inv_dir = ray.direction.recip();

    let t1 = (aabb.min - ray.origin) * inv_dir;
    let t2 = (aabb.max - ray.origin) * inv_dir;

    let tmin = t1.min(t2).max_element();
    let tmax = t1.max(t2).min_element();

    if tmax < 0.0 || tmin > tmax {
        return None;
    }

    Some(if tmin < 0.0 { tmax } else { tmin })
}

/// Intersection with the plane `z = depth`
pub fn ray_plane_z(ray: &Ray, depth: f32) -> Option<Vec3> {
    if ray.direction.z.abs() < 1e-6 {
        return None;
    }
    let t = (depth - ray.origin.z) / ray.direction.z;
    (t >= 0.0).then(|| ray.at(t))
}

/// Nearest tagged box mesh hit by the ray
pub fn pick_tagged<'a>(scene: &'a Scene, ray: &Ray) -> Option<&'a MeshTag> {
    let mut best: Option<(&MeshTag, f32)> = None;

    for (tag, geometry, position) in scene.tagged_meshes() {
        let Geometry::Box { size } = geometry else {
            continue;
        };
        if let Some(dist) = ray_aabb(ray, &Aabb::centered(position, *size)) {
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((tag, dist));
            }
        }
    }

    best.map(|(tag, _)| tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render3d::scene::{Material, MaterialKind, SceneNode};

    fn down_from(x: f32) -> Ray {
        Ray {
            origin: Vec3::new(x, 500.0, 0.0),
            direction: Vec3::new(0.0, -1.0, 0.0),
        }
    }

    #[test]
    fn test_slab_hit_and_miss() {
        let aabb = Aabb::centered(Vec3::ZERO, Vec3::splat(20.0));
        assert_eq!(ray_aabb(&down_from(0.0), &aabb), Some(490.0));
        assert_eq!(ray_aabb(&down_from(50.0), &aabb), None);
    }

    #[test]
    fn test_plane_intersection() {
        let ray = Ray {
            origin: Vec3::new(10.0, 0.0, 100.0),
            direction: Vec3::new(0.0, 0.0, -1.0),
        };
        assert_eq!(ray_plane_z(&ray, 30.0), Some(Vec3::new(10.0, 0.0, 30.0)));
        assert_eq!(ray_plane_z(&down_from(0.0), 30.0), None);
    }

    #[test]
    fn test_pick_prefers_nearest_mesh() {
        let mut scene = Scene::new();
        let material = Material::new(MaterialKind::Standard, "#808080");
        scene.add(
            SceneNode::mesh("V1", Geometry::Box { size: Vec3::new(100.0, 40.0, 20.0) }, material.clone(), Vec3::ZERO)
                .with_tag(MeshTag::Beam { id: "V1".into(), width: 20.0, height: 40.0, length: 100.0 }),
        );
        scene.add(
            SceneNode::mesh("P1", Geometry::Box { size: Vec3::new(20.0, 100.0, 20.0) }, material, Vec3::new(0.0, -70.0, 0.0))
                .with_tag(MeshTag::Column { id: "P1".into(), width: 20.0 }),
        );

        let hit = pick_tagged(&scene, &down_from(0.0)).unwrap();
        assert!(matches!(hit, MeshTag::Beam { id, .. } if id == "V1"));
        assert!(pick_tagged(&scene, &down_from(300.0)).is_none());
    }
}
