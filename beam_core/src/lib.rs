//! # beam_core - Structural Beam Editor Core
//!
//! `beam_core` holds everything behind the longitudinal beam editor: the
//! structural model of pillars, beams and loads, the editing engine that
//! keeps it consistent, and the renderers that turn a model snapshot into a
//! 2D SVG elevation or a 3D scene graph. Results from the external
//! calculation service are read back as shear/moment diagrams.
//!
//! ## Design Philosophy
//!
//! - **Immutable snapshots**: every edit validates first and returns a new model
//! - **JSON-First**: models, commands, errors and scenes are all serializable
//! - **Rich Errors**: rejections name the entity that blocked them
//! - **Pure renderers**: views are functions of (model, mode, overlay, viewport)
//!
//! ## Quick Start
//!
//! ```rust
//! use beam_core::editing::{EditCommand, ModelStore};
//!
//! let mut store = ModelStore::new();
//! store.apply(&EditCommand::AddPillar { width: 20.0, position: -160.0 })?;
//! store.apply(&EditCommand::AddPillar { width: 20.0, position: 160.0 })?;
//!
//! assert_eq!(store.model().beams[0].id, "V1");
//! assert_eq!(store.version(), 2);
//! # Ok::<(), beam_core::CalcError>(())
//! ```
//!
//! ## Modules
//!
//! - [`model`] - Pillars, beams, loads and renumbering
//! - [`editing`] - Validated edits with cascade deletes, and the versioned store
//! - [`projection`] - World to screen mapping and viewport tracking
//! - [`render2d`] - SVG elevation with loads or diagrams
//! - [`render3d`] - Scene graph, camera, picking and viewer lifecycle
//! - [`diagram`] - Shear/moment extraction from calculation results
//! - [`request`] - Body posted to the calculation endpoint
//! - [`config`] - Calculation endpoint configuration
//! - [`file_io`] - JSON documents on disk
//! - [`errors`] - Structured error types

pub mod config;
pub mod diagram;
pub mod editing;
pub mod errors;
pub mod file_io;
pub mod model;
pub mod palette;
pub mod projection;
pub mod render2d;
pub mod render3d;
pub mod request;

// Re-export commonly used types at crate root for convenience
pub use config::CalcEndpointConfig;
pub use diagram::{DiagramKind, DiagramOverlay, SeriesExtractor};
pub use editing::{EditCommand, ModelStore};
pub use errors::{CalcError, CalcResult};
pub use model::StructuralModel;
pub use projection::{Projection, Viewport};
pub use render2d::{Beam2DView, ViewMode};
pub use request::CalculationRequest;
