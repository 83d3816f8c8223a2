//! # Coordinate Projection
//!
//! Maps world positions (cm along the structural axis) onto screen x
//! coordinates. A [`Projection`] is recomputed for every render and on every
//! viewport change; [`viewport`] tracks the container size.
//!
//! ```rust
//! use beam_core::model::StructuralModel;
//! use beam_core::projection::{Projection, DEFAULT_PADDING};
//!
//! let model = StructuralModel::new()
//!     .add_pillar(20.0, -160.0).unwrap()
//!     .add_pillar(20.0, 160.0).unwrap();
//! let proj = Projection::fit(&model, 800.0, DEFAULT_PADDING);
//!
//! assert_eq!(proj.world_to_screen(-160.0), 80.0);
//! assert_eq!(proj.world_to_screen(160.0), 720.0);
//! ```

pub mod viewport;

pub use viewport::{Viewport, ViewportTracker};

use serde::{Deserialize, Serialize};

use crate::model::StructuralModel;

/// Horizontal padding on each side of the drawing (px)
pub const DEFAULT_PADDING: f64 = 80.0;

/// World range used when the structure is empty
pub const EMPTY_RANGE: (f64, f64) = (-200.0, 200.0);

/// Linear world -> screen map: `padding + (x - min_pos) * scale`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub min_pos: f64,
    pub max_pos: f64,
    pub scale: f64,
    pub padding: f64,
}

impl Projection {
    /// Fit the structure's extent into `width` minus `padding` on both sides.
    ///
    /// A zero span uses scale 1; a negative drawing extent clamps the scale to 0.
    pub fn fit(model: &StructuralModel, width: f64, padding: f64) -> Self {
        let (min_pos, max_pos) = model.extent().unwrap_or(EMPTY_RANGE);
        Self::from_range(min_pos, max_pos, width, padding)
    }

    pub fn from_range(min_pos: f64, max_pos: f64, width: f64, padding: f64) -> Self {
        let span = max_pos - min_pos;
        let available = (width - 2.0 * padding).max(0.0);
        let scale = if span > 0.0 { available / span } else { 1.0 };
        Self { min_pos, max_pos, scale, padding }
    }

    pub fn world_to_screen(&self, x: f64) -> f64 {
        self.padding + (x - self.min_pos) * self.scale
    }

    /// Inverse of [`world_to_screen`](Self::world_to_screen); `min_pos` when the scale is 0
    pub fn screen_to_world(&self, sx: f64) -> f64 {
        if self.scale == 0.0 {
            return self.min_pos;
        }
        self.min_pos + (sx - self.padding) / self.scale
    }

    /// Screen length of a world length
    pub fn span_px(&self, world_length: f64) -> f64 {
        world_length.abs() * self.scale
    }
}
