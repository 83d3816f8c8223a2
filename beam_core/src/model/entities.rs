//! Pillars, beams and the two load kinds.
//!
//! Positions are world coordinates along the single structural axis, in
//! centimetres. Ids are user-facing labels (`P1`, `V1`, `CP1`, `CD1`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CalcError;

/// Default cross-section of beams synthesized between neighbouring pillars (cm)
pub const DEFAULT_BEAM_WIDTH: f64 = 20.0;
pub const DEFAULT_BEAM_HEIGHT: f64 = 40.0;

/// Id prefixes
pub const PILLAR_PREFIX: &str = "P";
pub const BEAM_PREFIX: &str = "V";
pub const POINT_LOAD_PREFIX: &str = "CP";
pub const DISTRIBUTED_LOAD_PREFIX: &str = "CD";

/// Side of a pillar a cantilever points to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Sign applied to a length measured from the base pillar
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
        }
    }
}

impl FromStr for Direction {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" | "esquerda" => Ok(Direction::Left),
            "right" | "r" | "direita" => Ok(Direction::Right),
            other => Err(CalcError::invalid_input(
                "direction",
                other,
                "Direction must be 'left' or 'right'",
            )),
        }
    }
}

/// A point support along the structural axis (square column section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pillar {
    pub id: String,
    /// Side of the square cross-section (cm)
    pub width: f64,
    pub position: f64,
}

/// A span between two pillars, or a cantilever with one free end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beam {
    pub id: String,
    pub width: f64,
    pub height: f64,
    /// Not necessarily smaller than `end_position`
    pub start_position: f64,
    pub end_position: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_pillar_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_pillar_id: Option<String>,
}

impl Beam {
    pub fn min_position(&self) -> f64 {
        self.start_position.min(self.end_position)
    }

    pub fn max_position(&self) -> f64 {
        self.start_position.max(self.end_position)
    }

    pub fn length(&self) -> f64 {
        (self.end_position - self.start_position).abs()
    }

    /// Closed-interval containment
    pub fn contains(&self, position: f64) -> bool {
        position >= self.min_position() && position <= self.max_position()
    }

    pub fn references_pillar(&self, pillar_id: &str) -> bool {
        self.start_pillar_id.as_deref() == Some(pillar_id)
            || self.end_pillar_id.as_deref() == Some(pillar_id)
    }

    /// True when exactly one end is unsupported
    pub fn is_cantilever(&self) -> bool {
        self.start_pillar_id.is_some() != self.end_pillar_id.is_some()
    }

    /// Origin pillar and pointing direction of a cantilever.
    ///
    /// Returns `None` for beams supported at both ends.
    pub fn cantilever_origin(&self) -> Option<(&str, Direction)> {
        let (origin, base, free) = match (&self.start_pillar_id, &self.end_pillar_id) {
            (Some(p), None) => (p.as_str(), self.start_position, self.end_position),
            (None, Some(p)) => (p.as_str(), self.end_position, self.start_position),
            _ => return None,
        };
        let direction = if free < base { Direction::Left } else { Direction::Right };
        Some((origin, direction))
    }
}

/// A concentrated force; negative magnitude points downward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointLoad {
    pub id: String,
    pub position: f64,
    pub magnitude: f64,
}

/// A force per unit length over an interval, optionally bound to a beam
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributedLoad {
    pub id: String,
    pub start_position: f64,
    pub end_position: f64,
    pub magnitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beam_id: Option<String>,
}

impl DistributedLoad {
    pub fn min_position(&self) -> f64 {
        self.start_position.min(self.end_position)
    }

    pub fn max_position(&self) -> f64 {
        self.start_position.max(self.end_position)
    }
}

/// Parse the numeric suffix of an id such as `CP12`
pub(crate) fn id_suffix(id: &str, prefix: &str) -> Option<u32> {
    id.strip_prefix(prefix).and_then(|n| n.parse().ok())
}
