//! Canonical left-to-right renumbering.
//!
//! Pillars are sorted by position and relabelled `P1..Pn`; beam pillar
//! references are rewritten through the old->new map. Beams are then sorted
//! by their leftmost end and relabelled `V1..Vn`, and distributed-load
//! `beam_id` back-references follow the second map. Load ids never change.

use std::collections::HashMap;

use super::entities::{BEAM_PREFIX, PILLAR_PREFIX};
use super::StructuralModel;

/// Renumber pillars and beams in place.
///
/// Runs after every structural mutation (pillar or beam added/removed),
/// never after a pure load mutation. Applying it twice equals applying it once.
pub fn renumber(model: &mut StructuralModel) {
    model
        .pillars
        .sort_by(|a, b| a.position.total_cmp(&b.position));

    let mut pillar_map: HashMap<String, String> = HashMap::with_capacity(model.pillars.len());
    for (i, pillar) in model.pillars.iter_mut().enumerate() {
        let new_id = format!("{}{}", PILLAR_PREFIX, i + 1);
        pillar_map.insert(std::mem::replace(&mut pillar.id, new_id.clone()), new_id);
    }

    for beam in model.beams.iter_mut() {
        remap(&mut beam.start_pillar_id, &pillar_map);
        remap(&mut beam.end_pillar_id, &pillar_map);
    }

    model
        .beams
        .sort_by(|a, b| a.min_position().total_cmp(&b.min_position()));

    let mut beam_map: HashMap<String, String> = HashMap::with_capacity(model.beams.len());
    for (i, beam) in model.beams.iter_mut().enumerate() {
        let new_id = format!("{}{}", BEAM_PREFIX, i + 1);
        beam_map.insert(std::mem::replace(&mut beam.id, new_id.clone()), new_id);
    }

    for load in model.distributed_loads.iter_mut() {
        remap(&mut load.beam_id, &beam_map);
    }
}

fn remap(reference: &mut Option<String>, map: &HashMap<String, String>) {
    if let Some(old) = reference.as_ref() {
        if let Some(new) = map.get(old) {
            *reference = Some(new.clone());
        }
    }
}
