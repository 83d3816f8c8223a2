//! # Structural Editing Engine
//!
//! Mutation operations over [`StructuralModel`] snapshots. Each operation
//! validates everything first and only then builds the new snapshot, so a
//! rejected operation never leaves a partially edited model behind.
//!
//! Structural operations (pillars, beams) finish with
//! [`renumber`](crate::model::renumber); load operations do not.
//!
//! - [`command`] - serializable [`EditCommand`] wrapper for scripts and UIs
//! - [`store`] - [`ModelStore`] holding the current snapshot and its version

pub mod command;
pub mod store;

pub use command::{DistributedPlacement, EditCommand};
pub use store::ModelStore;

use std::collections::HashSet;

use tracing::debug;

use crate::errors::{CalcError, CalcResult};
use crate::model::{
    renumber, Beam, Direction, DistributedLoad, Pillar, PointLoad, StructuralModel,
    DEFAULT_BEAM_HEIGHT, DEFAULT_BEAM_WIDTH,
};

/// Two positions closer than this are the same point on the axis (cm)
pub const POSITION_EPSILON: f64 = 1e-6;

// Provisional ids, replaced by renumbering before the snapshot is returned
const PENDING_PILLAR: &str = "P?";
const PENDING_BEAM_LEFT: &str = "V?L";
const PENDING_BEAM_RIGHT: &str = "V?R";
const PENDING_CANTILEVER: &str = "V?C";

// ============================================================================
// Input validation
// ============================================================================

fn ensure_finite(field: &str, value: f64) -> CalcResult<()> {
    if !value.is_finite() {
        return Err(CalcError::invalid_input(field, value.to_string(), "Value must be a finite number"));
    }
    Ok(())
}

fn ensure_positive(field: &str, value: f64) -> CalcResult<()> {
    ensure_finite(field, value)?;
    if value <= 0.0 {
        return Err(CalcError::invalid_input(field, value.to_string(), "Value must be greater than zero"));
    }
    Ok(())
}

fn ensure_nonzero(field: &str, value: f64) -> CalcResult<()> {
    ensure_finite(field, value)?;
    if value == 0.0 {
        return Err(CalcError::invalid_input(field, value.to_string(), "Magnitude cannot be zero"));
    }
    Ok(())
}

impl StructuralModel {
    /// Load placement range: `(min, max)` over pillars and beam endpoints.
    fn load_bounds(&self) -> CalcResult<(f64, f64)> {
        self.extent().ok_or_else(|| CalcError::EmptyStructure {
            reason: "add pillars before placing loads".to_string(),
        })
    }

    fn ensure_within(&self, field: &str, position: f64, bounds: (f64, f64)) -> CalcResult<()> {
        let (min, max) = bounds;
        if position < min || position > max {
            return Err(CalcError::out_of_bounds(field, position, min, max));
        }
        Ok(())
    }

    // ========================================================================
    // Pillars
    // ========================================================================

    /// Add a pillar and connect it to its nearest neighbours.
    ///
    /// Rejected when the position falls on the free side of an existing
    /// cantilever, or exactly on an existing pillar. A default 20×40 beam is
    /// synthesized towards the left and right neighbour pillars; a beam that
    /// already joined those two neighbours is split.
    ///
    /// ```rust
    /// use beam_core::model::StructuralModel;
    ///
    /// let model = StructuralModel::new().add_pillar(20.0, -160.0).unwrap();
    /// assert_eq!(model.pillars[0].id, "P1");
    /// assert!(model.beams.is_empty());
    /// ```
    pub fn add_pillar(&self, width: f64, position: f64) -> CalcResult<StructuralModel> {
        ensure_positive("width", width)?;
        ensure_finite("position", position)?;

        if let Some(existing) = self
            .pillars
            .iter()
            .find(|p| (p.position - position).abs() < POSITION_EPSILON)
        {
            return Err(CalcError::invalid_input(
                "position",
                position.to_string(),
                format!("Pillar {} already stands at this position", existing.id),
            ));
        }

        for (beam, pillar_id, direction) in self.cantilevers() {
            let Some(origin) = self.pillar(pillar_id) else {
                continue;
            };
            let blocked = match direction {
                Direction::Left => position < origin.position,
                Direction::Right => position > origin.position,
            };
            if blocked {
                return Err(CalcError::PlacementConflict {
                    position,
                    beam_id: beam.id.clone(),
                    pillar_id: origin.id.clone(),
                });
            }
        }

        let left = self
            .pillars
            .iter()
            .filter(|p| p.position < position)
            .max_by(|a, b| a.position.total_cmp(&b.position));
        let right = self
            .pillars
            .iter()
            .filter(|p| p.position > position)
            .min_by(|a, b| a.position.total_cmp(&b.position));

        let mut next = self.clone();

        if let (Some(l), Some(r)) = (left, right) {
            if let Some(idx) = next
                .beams
                .iter()
                .position(|b| b.references_pillar(&l.id) && b.references_pillar(&r.id))
            {
                let split = next.beams.remove(idx);
                debug!(beam = %split.id, "splitting span for interior pillar");
                for load in next
                    .distributed_loads
                    .iter_mut()
                    .filter(|d| d.beam_id.as_deref() == Some(split.id.as_str()))
                {
                    load.beam_id = None;
                }
            }
        }

        next.pillars.push(Pillar {
            id: PENDING_PILLAR.to_string(),
            width,
            position,
        });

        if let Some(l) = left {
            next.beams.push(Beam {
                id: PENDING_BEAM_LEFT.to_string(),
                width: DEFAULT_BEAM_WIDTH,
                height: DEFAULT_BEAM_HEIGHT,
                start_position: l.position,
                end_position: position,
                start_pillar_id: Some(l.id.clone()),
                end_pillar_id: Some(PENDING_PILLAR.to_string()),
            });
        }
        if let Some(r) = right {
            next.beams.push(Beam {
                id: PENDING_BEAM_RIGHT.to_string(),
                width: DEFAULT_BEAM_WIDTH,
                height: DEFAULT_BEAM_HEIGHT,
                start_position: position,
                end_position: r.position,
                start_pillar_id: Some(PENDING_PILLAR.to_string()),
                end_pillar_id: Some(r.id.clone()),
            });
        }

        renumber(&mut next);
        Ok(next)
    }

    /// Remove a corner (leftmost or rightmost) pillar.
    ///
    /// Every beam resting on it is removed with its dependent loads.
    pub fn remove_pillar(&self, pillar_id: &str) -> CalcResult<StructuralModel> {
        let pillar = self
            .pillar(pillar_id)
            .ok_or_else(|| CalcError::not_found("Pillar", pillar_id))?;

        let is_corner = [self.leftmost_pillar(), self.rightmost_pillar()]
            .into_iter()
            .flatten()
            .any(|corner| corner.position == pillar.position);
        if !is_corner {
            return Err(CalcError::InteriorPillar {
                pillar_id: pillar.id.clone(),
            });
        }

        let doomed: Vec<String> = self
            .beams
            .iter()
            .filter(|b| b.references_pillar(pillar_id))
            .map(|b| b.id.clone())
            .collect();

        let mut next = self.clone();
        next.pillars.retain(|p| p.id != pillar_id);
        next.cascade_remove_beams(&doomed);
        renumber(&mut next);
        Ok(next)
    }

    // ========================================================================
    // Beams
    // ========================================================================

    /// Add a cantilever at the leftmost (`Left`) or rightmost (`Right`) pillar.
    ///
    /// Only one cantilever may leave a pillar in a given direction.
    pub fn add_cantilever(
        &self,
        width: f64,
        height: f64,
        length: f64,
        direction: Direction,
    ) -> CalcResult<StructuralModel> {
        ensure_positive("width", width)?;
        ensure_positive("height", height)?;
        ensure_positive("length", length)?;

        let base = match direction {
            Direction::Left => self.leftmost_pillar(),
            Direction::Right => self.rightmost_pillar(),
        }
        .ok_or_else(|| CalcError::NoPillars {
            reason: "add a pillar before adding a cantilever".to_string(),
        })?;

        if self
            .cantilevers()
            .any(|(_, p, d)| p == base.id && d == direction)
        {
            return Err(CalcError::DuplicateCantilever {
                pillar_id: base.id.clone(),
                direction,
            });
        }

        let mut next = self.clone();
        next.beams.push(Beam {
            id: PENDING_CANTILEVER.to_string(),
            width,
            height,
            start_position: base.position,
            end_position: base.position + direction.sign() * length,
            start_pillar_id: Some(base.id.clone()),
            end_pillar_id: None,
        });

        renumber(&mut next);
        Ok(next)
    }

    /// Remove a beam with its bound distributed loads and the point loads on its span.
    pub fn remove_beam(&self, beam_id: &str) -> CalcResult<StructuralModel> {
        if self.beam(beam_id).is_none() {
            return Err(CalcError::not_found("Beam", beam_id));
        }

        let mut next = self.clone();
        next.cascade_remove_beams(&[beam_id.to_string()]);
        renumber(&mut next);
        Ok(next)
    }

    /// Drop the given beams, then every distributed load whose beam no longer
    /// exists and every point load lying on a removed span.
    fn cascade_remove_beams(&mut self, beam_ids: &[String]) {
        let removed: Vec<Beam> = self
            .beams
            .iter()
            .filter(|b| beam_ids.contains(&b.id))
            .cloned()
            .collect();
        self.beams.retain(|b| !beam_ids.contains(&b.id));

        let live: HashSet<&str> = self.beams.iter().map(|b| b.id.as_str()).collect();
        let before = (self.point_loads.len(), self.distributed_loads.len());

        self.distributed_loads
            .retain(|d| d.beam_id.as_deref().map_or(true, |id| live.contains(id)));
        self.point_loads
            .retain(|p| !removed.iter().any(|b| b.contains(p.position)));

        debug!(
            beams = removed.len(),
            point_loads = before.0 - self.point_loads.len(),
            distributed_loads = before.1 - self.distributed_loads.len(),
            "cascade delete"
        );
    }

    /// Clear every collection and restart load numbering.
    pub fn reset(&self) -> StructuralModel {
        StructuralModel::new()
    }

    // ========================================================================
    // Loads
    // ========================================================================

    /// Add a point load inside the structure's extent.
    pub fn add_point_load(&self, position: f64, magnitude: f64) -> CalcResult<StructuralModel> {
        ensure_finite("position", position)?;
        ensure_nonzero("magnitude", magnitude)?;
        let bounds = self.load_bounds()?;
        self.ensure_within("position", position, bounds)?;

        let (id, seq) = self.next_point_load_id();
        let mut next = self.clone();
        next.point_loads.push(PointLoad { id, position, magnitude });
        next.point_load_seq = seq;
        Ok(next)
    }

    /// Add a distributed load over an explicit interval (`start < end`).
    pub fn add_distributed_load(
        &self,
        start_position: f64,
        end_position: f64,
        magnitude: f64,
    ) -> CalcResult<StructuralModel> {
        ensure_finite("startPosition", start_position)?;
        ensure_finite("endPosition", end_position)?;
        ensure_nonzero("magnitude", magnitude)?;
        let bounds = self.load_bounds()?;
        self.ensure_within("startPosition", start_position, bounds)?;
        self.ensure_within("endPosition", end_position, bounds)?;
        if start_position >= end_position {
            return Err(CalcError::invalid_input(
                "endPosition",
                end_position.to_string(),
                format!("End must be greater than start ({})", start_position),
            ));
        }

        let (id, seq) = self.next_distributed_load_id();
        let mut next = self.clone();
        next.distributed_loads.push(DistributedLoad {
            id,
            start_position,
            end_position,
            magnitude,
            beam_id: None,
        });
        next.distributed_load_seq = seq;
        Ok(next)
    }

    /// Add a distributed load covering an existing beam, bound to it.
    pub fn add_distributed_load_on_beam(&self, beam_id: &str, magnitude: f64) -> CalcResult<StructuralModel> {
        ensure_nonzero("magnitude", magnitude)?;
        let beam = self
            .beam(beam_id)
            .ok_or_else(|| CalcError::not_found("Beam", beam_id))?;

        let (id, seq) = self.next_distributed_load_id();
        let mut next = self.clone();
        next.distributed_loads.push(DistributedLoad {
            id,
            start_position: beam.start_position,
            end_position: beam.end_position,
            magnitude,
            beam_id: Some(beam.id.clone()),
        });
        next.distributed_load_seq = seq;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> StructuralModel {
        StructuralModel::new()
            .add_pillar(20.0, -160.0)
            .unwrap()
            .add_pillar(20.0, 160.0)
            .unwrap()
    }

    #[test]
    fn test_first_pillar_pair() {
        let one = StructuralModel::new().add_pillar(20.0, -160.0).unwrap();
        assert_eq!(one.pillars.len(), 1);
        assert!(one.beams.is_empty());

        let two = one.add_pillar(20.0, 160.0).unwrap();
        assert_eq!(two.pillars[0].id, "P1");
        assert_eq!(two.pillars[1].id, "P2");
        let v1 = &two.beams[0];
        assert_eq!(v1.id, "V1");
        assert_eq!((v1.start_position, v1.end_position), (-160.0, 160.0));
        assert_eq!(v1.start_pillar_id.as_deref(), Some("P1"));
        assert_eq!(v1.end_pillar_id.as_deref(), Some("P2"));
        assert_eq!((v1.width, v1.height), (DEFAULT_BEAM_WIDTH, DEFAULT_BEAM_HEIGHT));
    }

    #[test]
    fn test_pillar_added_left_relabels_everything() {
        let model = pair().add_pillar(25.0, -400.0).unwrap();
        let positions: Vec<_> = model.pillars.iter().map(|p| (p.id.as_str(), p.position)).collect();
        assert_eq!(positions, vec![("P1", -400.0), ("P2", -160.0), ("P3", 160.0)]);
        assert_eq!(model.beams[0].id, "V1");
        assert_eq!(model.beams[0].start_position, -400.0);
        assert_eq!(model.beams[0].end_pillar_id.as_deref(), Some("P2"));
        assert_eq!(model.beams[1].start_pillar_id.as_deref(), Some("P2"));
    }

    #[test]
    fn test_interior_pillar_splits_span() {
        let model = pair()
            .add_distributed_load_on_beam("V1", -5.0)
            .unwrap()
            .add_pillar(20.0, 0.0)
            .unwrap();

        assert_eq!(model.beams.len(), 2);
        assert_eq!((model.beams[0].start_position, model.beams[0].end_position), (-160.0, 0.0));
        assert_eq!((model.beams[1].start_position, model.beams[1].end_position), (0.0, 160.0));
        assert_eq!(model.distributed_loads.len(), 1);
        assert_eq!(model.distributed_loads[0].beam_id, None);
    }

    #[test]
    fn test_duplicate_position_rejected() {
        let err = pair().add_pillar(20.0, 160.0).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(err.user_message().contains("P2"));
    }

    #[test]
    fn test_cantilever_blocks_pillars_on_its_side() {
        let model = pair().add_cantilever(20.0, 40.0, 100.0, Direction::Right).unwrap();
        let cantilever = model.beams.iter().find(|b| b.is_cantilever()).unwrap();
        assert_eq!(cantilever.end_position, 260.0);

        match model.add_pillar(20.0, 300.0).unwrap_err() {
            CalcError::PlacementConflict { pillar_id, beam_id, .. } => {
                assert_eq!(pillar_id, "P2");
                assert_eq!(beam_id, cantilever.id);
            }
            other => panic!("unexpected {:?}", other),
        }

        // Other side stays open
        assert!(model.add_pillar(20.0, -300.0).is_ok());
    }

    #[test]
    fn test_left_cantilever_extends_from_leftmost() {
        let model = pair().add_cantilever(15.0, 35.0, 80.0, Direction::Left).unwrap();
        let beam = &model.beams[0];
        assert_eq!(beam.id, "V1");
        assert_eq!(beam.start_position, -160.0);
        assert_eq!(beam.end_position, -240.0);
        assert_eq!(beam.start_pillar_id.as_deref(), Some("P1"));
        assert!(beam.end_pillar_id.is_none());
        assert_eq!(model.beams[1].id, "V2");
    }

    #[test]
    fn test_one_cantilever_per_extremity() {
        let model = pair().add_cantilever(20.0, 40.0, 100.0, Direction::Right).unwrap();
        let err = model
            .add_cantilever(20.0, 40.0, 50.0, Direction::Right)
            .unwrap_err();
        assert_eq!(
            err,
            CalcError::DuplicateCantilever { pillar_id: "P2".into(), direction: Direction::Right }
        );
        assert!(model.add_cantilever(20.0, 40.0, 50.0, Direction::Left).is_ok());
    }

    #[test]
    fn test_cantilever_requires_pillar() {
        let err = StructuralModel::new()
            .add_cantilever(20.0, 40.0, 100.0, Direction::Left)
            .unwrap_err();
        assert_eq!(err.error_code(), "NO_PILLARS");
    }

    #[test]
    fn test_interior_pillar_removal_rejected() {
        let model = pair().add_pillar(20.0, 400.0).unwrap();
        let err = model.remove_pillar("P2").unwrap_err();
        assert_eq!(err, CalcError::InteriorPillar { pillar_id: "P2".into() });
    }

    #[test]
    fn test_corner_pillar_removal_cascades() {
        let model = pair()
            .add_pillar(20.0, 400.0)
            .unwrap()
            .add_point_load(0.0, -10.0)
            .unwrap()
            .add_point_load(300.0, -10.0)
            .unwrap()
            .add_distributed_load_on_beam("V1", -2.0)
            .unwrap()
            .add_distributed_load_on_beam("V2", -3.0)
            .unwrap();

        let next = model.remove_pillar("P1").unwrap();
        assert_eq!(next.pillars.len(), 2);
        assert_eq!(next.pillars[0].position, 160.0);
        assert_eq!(next.beams.len(), 1);
        assert_eq!(next.beams[0].id, "V1");

        // CP1 sat on the removed span, CP2 survives
        let pl: Vec<_> = next.point_loads.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(pl, vec!["CP2"]);

        // CD1 bound to the removed beam, CD2 follows its beam's new id
        assert_eq!(next.distributed_loads.len(), 1);
        assert_eq!(next.distributed_loads[0].id, "CD2");
        assert_eq!(next.distributed_loads[0].beam_id.as_deref(), Some("V1"));
    }

    #[test]
    fn test_remove_beam_keeps_pillars() {
        let model = pair().add_point_load(10.0, -4.0).unwrap();
        let next = model.remove_beam("V1").unwrap();
        assert_eq!(next.pillars.len(), 2);
        assert!(next.beams.is_empty());
        assert!(next.point_loads.is_empty());
        assert_eq!(model.remove_beam("V7").unwrap_err().error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_point_load_bounds() {
        let model = pair();
        let err = model.add_point_load(200.0, -10.0).unwrap_err();
        assert_eq!(err, CalcError::out_of_bounds("position", 200.0, -160.0, 160.0));

        let next = model.add_point_load(0.0, -10.0).unwrap();
        assert_eq!(next.point_loads.len(), 1);
        assert_eq!(next.point_loads[0].id, "CP1");
        assert_eq!(next.point_loads[0].magnitude, -10.0);
    }

    #[test]
    fn test_loads_need_structure() {
        let err = StructuralModel::new().add_point_load(0.0, -1.0).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_STRUCTURE");
    }

    #[test]
    fn test_distributed_load_by_position() {
        let model = pair();
        assert!(model.add_distributed_load(50.0, -50.0, -3.0).is_err());
        assert!(model.add_distributed_load(-200.0, 0.0, -3.0).is_err());
        assert!(model.add_distributed_load(-10.0, 10.0, 0.0).is_err());

        let next = model.add_distributed_load(-100.0, 100.0, -3.0).unwrap();
        assert_eq!(next.distributed_loads[0].id, "CD1");
        assert!(next.distributed_loads[0].beam_id.is_none());
    }

    #[test]
    fn test_distributed_load_by_beam_adopts_endpoints() {
        let model = pair().add_cantilever(20.0, 40.0, 100.0, Direction::Left).unwrap();
        let next = model.add_distributed_load_on_beam("V1", -2.5).unwrap();
        let load = &next.distributed_loads[0];
        assert_eq!((load.start_position, load.end_position), (-160.0, -260.0));
        assert_eq!(load.beam_id.as_deref(), Some("V1"));
        assert!(model.add_distributed_load_on_beam("V9", -2.5).is_err());
    }

    #[test]
    fn test_load_ids_stay_monotonic_after_deletion() {
        let model = pair()
            .add_point_load(0.0, -1.0)
            .unwrap()
            .remove_beam("V1")
            .unwrap();
        assert!(model.point_loads.is_empty());
        let model = model
            .add_pillar(20.0, 300.0)
            .unwrap()
            .add_point_load(200.0, -1.0)
            .unwrap();
        assert_eq!(model.point_loads[0].id, "CP2");
    }

    #[test]
    fn test_rejection_leaves_model_untouched() {
        let model = pair();
        let before = model.clone();
        let _ = model.add_point_load(999.0, -1.0);
        let _ = model.remove_pillar("P9");
        assert_eq!(model, before);
    }

    #[test]
    fn test_reset_clears_everything() {
        let model = pair().add_point_load(0.0, -1.0).unwrap().reset();
        assert!(model.is_empty());
        assert!(model.point_loads.is_empty());
        assert_eq!(model.point_load_seq, 0);
    }
}
