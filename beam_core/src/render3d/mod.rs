//! # 3D Renderer
//!
//! The 3D view as a pure function of its inputs: [`build_scene`] turns a
//! model snapshot (plus view mode and optional diagram overlay) into a
//! plain-data [`Scene`], and [`Viewer3D`] drives a [`RenderBackend`]
//! through the mount, rebuild and teardown lifecycle.
//!
//! ```
//! use beam_core::model::StructuralModel;
//! use beam_core::render3d::{build_scene, SceneInput};
//!
//! let model = StructuralModel::new()
//!     .add_pillar(20.0, -160.0).unwrap()
//!     .add_pillar(20.0, 160.0).unwrap();
//! let scene = build_scene(&SceneInput::loads(&model));
//! assert_eq!(scene.stats().tagged, 3);
//! ```

pub mod builder;
pub mod camera;
pub mod picking;
pub mod scene;
pub mod viewer;

pub use builder::{build_scene, scene_bounds, SceneInput};
pub use camera::{CameraPreset, CameraRig, OrbitControls, PerspectiveCamera, SceneBounds};
pub use picking::{pick_tagged, ray_aabb, ray_plane_z, Aabb, Ray};
pub use scene::{Geometry, Material, MaterialKind, MeshTag, NodeKind, Scene, SceneNode, SceneStats};
pub use viewer::{BackendEvent, HeadlessBackend, HeadlessState, HoverInfo, RenderBackend, Viewer3D};
