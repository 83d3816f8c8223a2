//! # Diagram Data
//!
//! Shear and moment series pulled out of an externally computed result
//! payload, shared by the 2D and 3D renderers.
//!
//! The payload has no fixed schema. [`SeriesExtractor`] tries a short list
//! of named strategies in order and returns an empty series when none of
//! them recognizes anything; callers then show a "no data" placeholder.
//!
//! ## Display convention
//!
//! Shear values are shown as-is. Moment values are multiplied by 0.01 and
//! sign-flipped, see [`DiagramKind::display_value`].
//!
//! ## Example
//!
//! ```rust
//! use beam_core::diagram::{extract_series, DiagramKind};
//! use beam_core::model::StructuralModel;
//! use serde_json::json;
//!
//! let payload = json!({ "results": { "x": [0.0, 100.0], "shear": [5.0, -5.0] } });
//! let series = extract_series(&payload, &StructuralModel::new(), DiagramKind::Shear);
//! assert_eq!(series.len(), 2);
//!
//! let nothing = extract_series(&json!({ "ok": true }), &StructuralModel::new(), DiagramKind::Shear);
//! assert!(nothing.is_empty());
//! ```

pub mod aliases;
pub mod extract;
pub mod overlay;

pub use aliases::{AliasConfig, DEFAULT_ALIASES};
pub use extract::{AliasSearchStrategy, DiscretizationStrategy, SeriesExtractor, SeriesStrategy};
pub use overlay::{DiagramOverlay, MarkerRole, ValueMarker};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CalcError;
use crate::model::StructuralModel;

/// Factor applied to moments before display (sign flip included)
pub const MOMENT_DISPLAY_FACTOR: f64 = -0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramKind {
    Shear,
    Moment,
}

impl DiagramKind {
    /// Engineering display convention for a raw payload value
    pub fn display_value(&self, raw: f64) -> f64 {
        match self {
            DiagramKind::Shear => raw,
            DiagramKind::Moment => raw * MOMENT_DISPLAY_FACTOR,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            DiagramKind::Shear => "Shear",
            DiagramKind::Moment => "Moment",
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagramKind::Shear => write!(f, "shear"),
            DiagramKind::Moment => write!(f, "moment"),
        }
    }
}

impl FromStr for DiagramKind {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match aliases::normalize_key(s).as_str() {
            "shear" | "v" | "cortante" => Ok(DiagramKind::Shear),
            "moment" | "m" | "momento" => Ok(DiagramKind::Moment),
            _ => Err(CalcError::invalid_input(
                "diagram",
                s,
                "Diagram must be 'shear' or 'moment'",
            )),
        }
    }
}

/// One sample of a diagram: world position (cm) and value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiagramPoint {
    pub x: f64,
    pub value: f64,
}

impl DiagramPoint {
    pub fn new(x: f64, value: f64) -> Self {
        Self { x, value }
    }
}

/// Extract raw series with the built-in aliases and strategies.
pub fn extract_series(
    payload: &serde_json::Value,
    model: &StructuralModel,
    kind: DiagramKind,
) -> Vec<DiagramPoint> {
    SeriesExtractor::default().extract(payload, model, kind)
}

/// Sample closest to `x` (ties resolve to the earlier sample)
pub fn nearest_sample(points: &[DiagramPoint], x: f64) -> Option<&DiagramPoint> {
    points.iter().fold(None, |best: Option<&DiagramPoint>, p| match best {
        Some(b) if (b.x - x).abs() <= (p.x - x).abs() => Some(b),
        _ => Some(p),
    })
}

/// Linear interpolation over samples sorted by `x`; clamps outside the range
pub fn value_at(points: &[DiagramPoint], x: f64) -> Option<f64> {
    let first = points.first()?;
    let last = points.last()?;
    if x <= first.x {
        return Some(first.value);
    }
    if x >= last.x {
        return Some(last.value);
    }
    points.windows(2).find_map(|w| {
        let (a, b) = (w[0], w[1]);
        if x < a.x || x > b.x {
            return None;
        }
        let dx = b.x - a.x;
        if dx.abs() < f64::EPSILON {
            return Some(a.value);
        }
        Some(a.value + (b.value - a.value) * (x - a.x) / dx)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_moment_display_convention() {
        assert_relative_eq!(DiagramKind::Moment.display_value(2500.0), -25.0);
        assert_eq!(DiagramKind::Shear.display_value(-12.0), -12.0);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("Momento".parse::<DiagramKind>().unwrap(), DiagramKind::Moment);
        assert_eq!("shear".parse::<DiagramKind>().unwrap(), DiagramKind::Shear);
        assert!("torsion".parse::<DiagramKind>().is_err());
    }

    #[test]
    fn test_nearest_sample() {
        let points = vec![DiagramPoint::new(0.0, 1.0), DiagramPoint::new(10.0, 2.0), DiagramPoint::new(20.0, 3.0)];
        assert_eq!(nearest_sample(&points, 12.0).unwrap().value, 2.0);
        assert_eq!(nearest_sample(&points, 15.0).unwrap().value, 2.0);
        assert_eq!(nearest_sample(&points, 99.0).unwrap().value, 3.0);
        assert!(nearest_sample(&[], 0.0).is_none());
    }

    #[test]
    fn test_value_at_interpolates() {
        let points = vec![DiagramPoint::new(0.0, 0.0), DiagramPoint::new(10.0, 10.0)];
        assert_relative_eq!(value_at(&points, 2.5).unwrap(), 2.5);
        assert_eq!(value_at(&points, -5.0), Some(0.0));
        assert_eq!(value_at(&points, 50.0), Some(10.0));
        assert_eq!(value_at(&[], 1.0), None);
    }
}
