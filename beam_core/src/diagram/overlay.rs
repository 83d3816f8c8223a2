//! Display-ready diagram: samples in display units plus value markers.
//!
//! Markers go at every beam junction, and at the global maximum and minimum
//! unless those coincide with a junction marker.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::StructuralModel;

use super::{nearest_sample, value_at, DiagramKind, DiagramPoint, SeriesExtractor};

/// Two markers closer than this (cm) are the same marker
pub const COINCIDENCE_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerRole {
    Node,
    Max,
    Min,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueMarker {
    pub x: f64,
    pub value: f64,
    pub role: MarkerRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramOverlay {
    pub kind: DiagramKind,
    /// Samples in display units, sorted by `x`
    pub points: Vec<DiagramPoint>,
    pub markers: Vec<ValueMarker>,
}

impl DiagramOverlay {
    pub fn build(model: &StructuralModel, payload: &Value, kind: DiagramKind, extractor: &SeriesExtractor) -> Self {
        let points = extractor
            .extract(payload, model, kind)
            .into_iter()
            .map(|p| DiagramPoint::new(p.x, kind.display_value(p.value)))
            .collect();
        Self::from_points(model, kind, points)
    }

    /// Overlay from display-unit samples already sorted by `x`
    pub fn from_points(model: &StructuralModel, kind: DiagramKind, points: Vec<DiagramPoint>) -> Self {
        let mut markers: Vec<ValueMarker> = Vec::new();
        if points.is_empty() {
            return Self { kind, points, markers };
        }

        for x in model.junction_positions() {
            if let Some(value) = value_at(&points, x) {
                markers.push(ValueMarker { x, value, role: MarkerRole::Node });
            }
        }

        let max = points.iter().copied().reduce(|a, b| if b.value > a.value { b } else { a });
        let min = points.iter().copied().reduce(|a, b| if b.value < a.value { b } else { a });

        for (extreme, role) in [(max, MarkerRole::Max), (min, MarkerRole::Min)] {
            let Some(p) = extreme else { continue };
            let coincident = markers
                .iter()
                .any(|m| (m.x - p.x).abs() < COINCIDENCE_TOLERANCE);
            if !coincident {
                markers.push(ValueMarker { x: p.x, value: p.value, role });
            }
        }

        Self { kind, points, markers }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Largest absolute display value (0 for an empty or flat-zero diagram)
    pub fn peak_amplitude(&self) -> f64 {
        self.points.iter().map(|p| p.value.abs()).fold(0.0, f64::max)
    }

    /// Nearest sample to a world position (tooltips)
    pub fn nearest(&self, x: f64) -> Option<&DiagramPoint> {
        nearest_sample(&self.points, x)
    }
}

/// Value label text, two decimals
pub fn format_value(value: f64) -> String {
    format!("{:.2}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn pair() -> StructuralModel {
        StructuralModel::new()
            .add_pillar(20.0, 0.0)
            .unwrap()
            .add_pillar(20.0, 400.0)
            .unwrap()
    }

    #[test]
    fn test_moment_overlay_applies_display_convention() {
        let payload = json!({ "x": [0, 200, 400], "moment": [0, 5000, 0] });
        let overlay = DiagramOverlay::build(&pair(), &payload, DiagramKind::Moment, &SeriesExtractor::default());
        assert_relative_eq!(overlay.points[1].value, -50.0);
        assert_relative_eq!(overlay.peak_amplitude(), 50.0);
    }

    #[test]
    fn test_markers_at_nodes_and_extremes() {
        let points = vec![
            DiagramPoint::new(0.0, 10.0),
            DiagramPoint::new(100.0, 30.0),
            DiagramPoint::new(300.0, -20.0),
            DiagramPoint::new(400.0, -5.0),
        ];
        let overlay = DiagramOverlay::from_points(&pair(), DiagramKind::Shear, points);
        let roles: Vec<_> = overlay.markers.iter().map(|m| (m.role, m.x)).collect();
        assert_eq!(
            roles,
            vec![
                (MarkerRole::Node, 0.0),
                (MarkerRole::Node, 400.0),
                (MarkerRole::Max, 100.0),
                (MarkerRole::Min, 300.0),
            ]
        );
    }

    #[test]
    fn test_extreme_on_node_is_skipped() {
        let points = vec![DiagramPoint::new(0.0, 40.0), DiagramPoint::new(400.0, -40.0)];
        let overlay = DiagramOverlay::from_points(&pair(), DiagramKind::Shear, points);
        assert_eq!(overlay.markers.len(), 2);
        assert!(overlay.markers.iter().all(|m| m.role == MarkerRole::Node));
    }

    #[test]
    fn test_empty_overlay_has_no_markers() {
        let overlay = DiagramOverlay::build(&pair(), &json!({}), DiagramKind::Shear, &SeriesExtractor::default());
        assert!(overlay.is_empty());
        assert!(overlay.markers.is_empty());
        assert!(overlay.nearest(10.0).is_none());
    }
}
