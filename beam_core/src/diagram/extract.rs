//! Series extraction strategies.
//!
//! Strategies run in order; the first that yields samples wins.
//!
//! 1. [`DiscretizationStrategy`] - a per-element array where each entry has
//!    parallel `x`/value arrays and an element label. Local abscissas are
//!    remapped onto the labelled beam's world span.
//! 2. [`AliasSearchStrategy`] - breadth-first walk over the whole payload
//!    looking for an `x` array beside a value array, an array of point
//!    objects, or an array of `[x, value]` pairs.

use std::collections::VecDeque;

use serde_json::{Map, Value};
use tracing::debug;

use crate::model::{Beam, StructuralModel};

use super::aliases::{matches, AliasConfig};
use super::{DiagramKind, DiagramPoint};

/// Upper bound on payload nodes visited by a breadth-first search
const MAX_VISITED: usize = 100_000;

pub trait SeriesStrategy {
    fn name(&self) -> &'static str;

    /// `None` when the strategy does not recognize the payload
    fn extract(
        &self,
        payload: &Value,
        model: &StructuralModel,
        kind: DiagramKind,
        aliases: &AliasConfig,
    ) -> Option<Vec<DiagramPoint>>;
}

// ============================================================================
// Extractor
// ============================================================================

pub struct SeriesExtractor {
    aliases: AliasConfig,
    strategies: Vec<Box<dyn SeriesStrategy>>,
}

impl Default for SeriesExtractor {
    fn default() -> Self {
        Self::new(AliasConfig::default())
    }
}

impl SeriesExtractor {
    /// Built-in strategies with the given aliases
    pub fn new(aliases: AliasConfig) -> Self {
        Self {
            aliases,
            strategies: vec![Box::new(DiscretizationStrategy), Box::new(AliasSearchStrategy)],
        }
    }

    pub fn aliases(&self) -> &AliasConfig {
        &self.aliases
    }

    /// Raw samples sorted by `x`; empty when nothing matches
    pub fn extract(&self, payload: &Value, model: &StructuralModel, kind: DiagramKind) -> Vec<DiagramPoint> {
        for strategy in &self.strategies {
            if let Some(mut points) = strategy.extract(payload, model, kind, &self.aliases) {
                points.retain(|p| p.x.is_finite() && p.value.is_finite());
                if points.is_empty() {
                    continue;
                }
                points.sort_by(|a, b| a.x.total_cmp(&b.x));
                debug!(strategy = strategy.name(), %kind, samples = points.len(), "diagram series found");
                return points;
            }
        }
        debug!(%kind, "no diagram series in payload");
        Vec::new()
    }
}

// ============================================================================
// Payload helpers
// ============================================================================

fn field<'a>(obj: &'a Map<String, Value>, aliases: &[String]) -> Option<&'a Value> {
    obj.iter().find(|(k, _)| matches(aliases, k)).map(|(_, v)| v)
}

fn numbers(value: &Value) -> Option<Vec<f64>> {
    let items = value.as_array()?;
    if items.is_empty() {
        return None;
    }
    items.iter().map(Value::as_f64).collect()
}

fn zip_points(xs: &[f64], values: &[f64]) -> Vec<DiagramPoint> {
    xs.iter()
        .zip(values)
        .map(|(&x, &value)| DiagramPoint::new(x, value))
        .collect()
}

/// Breadth-first search for the first value satisfying `visit`
fn breadth_first<'a, T>(root: &'a Value, mut visit: impl FnMut(&'a Value) -> Option<T>) -> Option<T> {
    let mut queue = VecDeque::from([root]);
    let mut visited = 0;
    while let Some(node) = queue.pop_front() {
        visited += 1;
        if visited > MAX_VISITED {
            return None;
        }
        if let Some(found) = visit(node) {
            return Some(found);
        }
        match node {
            Value::Object(map) => queue.extend(map.values()),
            Value::Array(items) => queue.extend(items.iter()),
            _ => {}
        }
    }
    None
}

// ============================================================================
// Strategy 1: per-element discretization
// ============================================================================

pub struct DiscretizationStrategy;

impl DiscretizationStrategy {
    /// Beam an entry belongs to: id match, then the label's number, then position
    fn resolve_beam<'m>(model: &'m StructuralModel, label: Option<&Value>, index: usize) -> Option<&'m Beam> {
        let by_label = label.and_then(|l| {
            let text = match l {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            if let Some(beam) = model.beams.iter().find(|b| b.id.eq_ignore_ascii_case(&text)) {
                return Some(beam);
            }
            let digits: String = text.chars().filter(char::is_ascii_digit).collect();
            let n: usize = digits.parse().ok()?;
            model.beams.get(n.checked_sub(1)?)
        });
        by_label.or_else(|| model.beams.get(index))
    }

    fn element_points(
        entry: &Map<String, Value>,
        beam: Option<&Beam>,
        kind: DiagramKind,
        aliases: &AliasConfig,
    ) -> Vec<DiagramPoint> {
        let (Some(xs), Some(values)) = (
            field(entry, &aliases.x).and_then(numbers),
            field(entry, aliases.for_kind(kind)).and_then(numbers),
        ) else {
            return Vec::new();
        };

        let Some(beam) = beam else {
            return zip_points(&xs, &values);
        };

        let local_min = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let local_max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let local_span = local_max - local_min;
        // local 0 is the beam's start, which is the base pillar for a cantilever
        let (start, end) = (beam.start_position, beam.end_position);

        xs.iter()
            .zip(&values)
            .map(|(&x, &value)| {
                let t = if local_span > 0.0 { (x - local_min) / local_span } else { 0.0 };
                DiagramPoint::new(start + t * (end - start), value)
            })
            .collect()
    }
}

impl SeriesStrategy for DiscretizationStrategy {
    fn name(&self) -> &'static str {
        "discretization"
    }

    fn extract(
        &self,
        payload: &Value,
        model: &StructuralModel,
        kind: DiagramKind,
        aliases: &AliasConfig,
    ) -> Option<Vec<DiagramPoint>> {
        let elements = breadth_first(payload, |node| {
            let obj = node.as_object()?;
            let items = field(obj, &aliases.discretization)?.as_array()?;
            items.iter().any(Value::is_object).then_some(items)
        })?;

        let mut points = Vec::new();
        for (index, entry) in elements.iter().enumerate() {
            let Some(entry) = entry.as_object() else {
                continue;
            };
            let beam = Self::resolve_beam(model, field(entry, &aliases.element_label), index);
            points.extend(Self::element_points(entry, beam, kind, aliases));
        }

        (!points.is_empty()).then_some(points)
    }
}

// ============================================================================
// Strategy 2: alias search
// ============================================================================

pub struct AliasSearchStrategy;

impl AliasSearchStrategy {
    /// `[{x, value}, ...]` or `[[x, value], ...]`
    fn point_array(items: &[Value], kind: DiagramKind, aliases: &AliasConfig) -> Option<Vec<DiagramPoint>> {
        if items.is_empty() {
            return None;
        }
        items
            .iter()
            .map(|item| match item {
                Value::Object(obj) => Some(DiagramPoint::new(
                    field(obj, &aliases.x)?.as_f64()?,
                    field(obj, aliases.for_kind(kind))?.as_f64()?,
                )),
                Value::Array(pair) if pair.len() == 2 => {
                    Some(DiagramPoint::new(pair[0].as_f64()?, pair[1].as_f64()?))
                }
                _ => None,
            })
            .collect()
    }
}

impl SeriesStrategy for AliasSearchStrategy {
    fn name(&self) -> &'static str {
        "alias-search"
    }

    fn extract(
        &self,
        payload: &Value,
        _model: &StructuralModel,
        kind: DiagramKind,
        aliases: &AliasConfig,
    ) -> Option<Vec<DiagramPoint>> {
        breadth_first(payload, |node| {
            let obj = node.as_object()?;
            let series = field(obj, aliases.for_kind(kind))?;

            if let (Some(xs), Some(values)) = (field(obj, &aliases.x).and_then(numbers), numbers(series)) {
                return Some(zip_points(&xs, &values));
            }
            if let Some(points) = series.as_array().and_then(|a| Self::point_array(a, kind, aliases)) {
                return Some(points);
            }
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_beams() -> StructuralModel {
        StructuralModel::new()
            .add_pillar(20.0, -160.0)
            .unwrap()
            .add_pillar(20.0, 160.0)
            .unwrap()
            .add_pillar(20.0, 400.0)
            .unwrap()
    }

    #[test]
    fn test_discretization_remaps_local_coordinates() {
        let payload = json!({
            "discretizacaoPorElemento": [
                { "elemento": "V2", "x": [0.0, 1.2, 2.4], "cortante": [10.0, 0.0, -10.0] },
                { "elemento": "V1", "x": [0.0, 3.2], "cortante": [20.0, -20.0] }
            ]
        });
        let points = SeriesExtractor::default().extract(&payload, &two_beams(), DiagramKind::Shear);

        let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![-160.0, 160.0, 160.0, 280.0, 400.0]);
        assert_eq!(points[0].value, 20.0);
        assert_eq!(points[4].value, -10.0);
    }

    #[test]
    fn test_discretization_falls_back_to_entry_index() {
        let payload = json!({
            "elements": [
                { "x": [0.0, 1.0], "moment": [0.0, 100.0] }
            ]
        });
        let points = SeriesExtractor::default().extract(&payload, &two_beams(), DiagramKind::Moment);
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].x, 160.0);
    }

    #[test]
    fn test_left_cantilever_keeps_support_value_at_its_base() {
        let model = StructuralModel::new()
            .add_pillar(20.0, -160.0)
            .unwrap()
            .add_pillar(20.0, 160.0)
            .unwrap()
            .add_cantilever(20.0, 40.0, 100.0, crate::model::Direction::Left)
            .unwrap();
        let cantilever = model.beams.iter().find(|b| b.end_pillar_id.is_none()).unwrap();
        assert_eq!((cantilever.start_position, cantilever.end_position), (-160.0, -260.0));

        let payload = json!({
            "elements": [ { "element": cantilever.id.clone(), "x": [0.0, 1.0], "shear": [10.0, 0.0] } ]
        });
        let points = SeriesExtractor::default().extract(&payload, &model, DiagramKind::Shear);
        assert_eq!(points, vec![DiagramPoint::new(-260.0, 0.0), DiagramPoint::new(-160.0, 10.0)]);
    }

    #[test]
    fn test_alias_search_finds_nested_parallel_arrays() {
        let payload = json!({
            "status": "ok",
            "data": { "diagramas": { "X": [0, 50, 100], "Momento Fletor": [0, 900, 0] } }
        });
        let points = SeriesExtractor::default().extract(&payload, &StructuralModel::new(), DiagramKind::Moment);
        assert_eq!(points.len(), 3);
        assert_eq!(points[1], DiagramPoint::new(50.0, 900.0));
    }

    #[test]
    fn test_alias_search_point_objects_and_pairs() {
        let objects = json!({ "shear": [ { "x": 1, "v": 3 }, { "x": 0, "v": 4 } ] });
        let points = SeriesExtractor::default().extract(&objects, &StructuralModel::new(), DiagramKind::Shear);
        assert_eq!(points, vec![DiagramPoint::new(0.0, 4.0), DiagramPoint::new(1.0, 3.0)]);

        let pairs = json!({ "result": [ { "moment": [[0, 1], [10, 2]] } ] });
        let points = SeriesExtractor::default().extract(&pairs, &StructuralModel::new(), DiagramKind::Moment);
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn test_unrecognized_payload_is_empty() {
        let payload = json!({ "reactions": [1, 2, 3], "message": "done" });
        let model = two_beams();
        assert!(SeriesExtractor::default().extract(&payload, &model, DiagramKind::Shear).is_empty());
        assert!(SeriesExtractor::default().extract(&Value::Null, &model, DiagramKind::Moment).is_empty());
    }

    #[test]
    fn test_custom_alias_is_honored() {
        let aliases = AliasConfig::from_json(r#"{ "shear": ["esforco_q"] }"#).unwrap();
        let payload = json!({ "x": [0, 1], "esforco_q": [1, 2] });
        let points = SeriesExtractor::new(aliases).extract(&payload, &StructuralModel::new(), DiagramKind::Shear);
        assert_eq!(points.len(), 2);
    }
}
