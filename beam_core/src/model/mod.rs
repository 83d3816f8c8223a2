//! # Structural Model
//!
//! The in-memory graph of supports (pillars) and spans (beams) plus the
//! point and distributed loads attached to them.
//!
//! ## Structure
//!
//! ```text
//! StructuralModel
//! ├── pillars: Vec<Pillar>                 (P1..Pn, left to right)
//! ├── beams: Vec<Beam>                     (V1..Vn, by leftmost end)
//! ├── point_loads: Vec<PointLoad>          (CP1.., append-only)
//! └── distributed_loads: Vec<DistributedLoad> (CD1.., optional beam_id)
//! ```
//!
//! A `StructuralModel` is treated as an immutable snapshot: editing
//! operations (see [`crate::editing`]) return a new value instead of
//! mutating the current one.
//!
//! ## Example
//!
//! ```rust
//! use beam_core::model::StructuralModel;
//!
//! let model = StructuralModel::new()
//!     .add_pillar(20.0, -160.0).unwrap()
//!     .add_pillar(20.0, 160.0).unwrap();
//!
//! assert_eq!(model.beams.len(), 1);
//! assert_eq!(model.extent(), Some((-160.0, 160.0)));
//! ```

pub mod entities;
pub mod renumber;

pub use entities::{
    Beam, Direction, DistributedLoad, Pillar, PointLoad, DEFAULT_BEAM_HEIGHT, DEFAULT_BEAM_WIDTH,
};
pub use renumber::renumber;

use serde::{Deserialize, Serialize};

use entities::{id_suffix, DISTRIBUTED_LOAD_PREFIX, POINT_LOAD_PREFIX};

/// Root container for one structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralModel {
    #[serde(default)]
    pub pillars: Vec<Pillar>,

    #[serde(default)]
    pub beams: Vec<Beam>,

    #[serde(default)]
    pub point_loads: Vec<PointLoad>,

    #[serde(default)]
    pub distributed_loads: Vec<DistributedLoad>,

    /// Number of point-load ids issued since the last reset
    #[serde(default)]
    pub point_load_seq: u32,

    /// Number of distributed-load ids issued since the last reset
    #[serde(default)]
    pub distributed_load_seq: u32,
}

impl StructuralModel {
    /// Create an empty structure
    pub fn new() -> Self {
        Self::default()
    }

    /// True when there are no pillars and no beams
    pub fn is_empty(&self) -> bool {
        self.pillars.is_empty() && self.beams.is_empty()
    }

    pub fn pillar(&self, id: &str) -> Option<&Pillar> {
        self.pillars.iter().find(|p| p.id == id)
    }

    pub fn beam(&self, id: &str) -> Option<&Beam> {
        self.beams.iter().find(|b| b.id == id)
    }

    pub fn leftmost_pillar(&self) -> Option<&Pillar> {
        self.pillars
            .iter()
            .min_by(|a, b| a.position.total_cmp(&b.position))
    }

    pub fn rightmost_pillar(&self) -> Option<&Pillar> {
        self.pillars
            .iter()
            .max_by(|a, b| a.position.total_cmp(&b.position))
    }

    /// Every pillar position and beam endpoint, in model order
    pub fn positions(&self) -> impl Iterator<Item = f64> + '_ {
        self.pillars.iter().map(|p| p.position).chain(
            self.beams
                .iter()
                .flat_map(|b| [b.start_position, b.end_position]),
        )
    }

    /// `(min, max)` over all pillar positions and beam endpoints.
    ///
    /// `None` for an empty structure.
    pub fn extent(&self) -> Option<(f64, f64)> {
        self.positions().fold(None, |acc, x| match acc {
            None => Some((x, x)),
            Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
        })
    }

    /// Beam end positions sorted and de-duplicated (diagram node markers)
    pub fn junction_positions(&self) -> Vec<f64> {
        let mut xs: Vec<f64> = self
            .beams
            .iter()
            .flat_map(|b| [b.start_position, b.end_position])
            .collect();
        xs.sort_by(|a, b| a.total_cmp(b));
        xs.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
        xs
    }

    /// Tallest beam section, if any beams exist
    pub fn max_beam_height(&self) -> Option<f64> {
        self.beams.iter().map(|b| b.height).reduce(f64::max)
    }

    /// Cantilever beams with their origin pillar id and direction
    pub fn cantilevers(&self) -> impl Iterator<Item = (&Beam, &str, Direction)> + '_ {
        self.beams
            .iter()
            .filter_map(|b| b.cantilever_origin().map(|(p, d)| (b, p, d)))
    }

    /// Next point-load id (`CP{n}`), never reusing an issued suffix
    pub(crate) fn next_point_load_id(&self) -> (String, u32) {
        let used = self
            .point_loads
            .iter()
            .filter_map(|l| id_suffix(&l.id, POINT_LOAD_PREFIX))
            .max()
            .unwrap_or(0);
        let n = self.point_load_seq.max(used) + 1;
        (format!("{}{}", POINT_LOAD_PREFIX, n), n)
    }

    /// Next distributed-load id (`CD{n}`)
    pub(crate) fn next_distributed_load_id(&self) -> (String, u32) {
        let used = self
            .distributed_loads
            .iter()
            .filter_map(|l| id_suffix(&l.id, DISTRIBUTED_LOAD_PREFIX))
            .max()
            .unwrap_or(0);
        let n = self.distributed_load_seq.max(used) + 1;
        (format!("{}{}", DISTRIBUTED_LOAD_PREFIX, n), n)
    }
}
