//! Serializable edit commands.
//!
//! One variant per editing operation, so scripted sessions (`beam_cli apply`)
//! and interactive front-ends feed the same path into [`ModelStore`](super::ModelStore).
//!
//! ```json
//! [
//!   { "op": "add_pillar", "width": 20, "position": -160 },
//!   { "op": "add_pillar", "width": 20, "position": 160 },
//!   { "op": "add_distributed_load", "magnitude": -5,
//!     "placement": { "mode": "by_beam", "beam_id": "V1" } }
//! ]
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::CalcResult;
use crate::model::{Direction, StructuralModel};

/// How a distributed load gets its interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DistributedPlacement {
    ByPosition { start_position: f64, end_position: f64 },
    ByBeam { beam_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditCommand {
    AddPillar {
        width: f64,
        position: f64,
    },
    AddCantilever {
        width: f64,
        height: f64,
        length: f64,
        direction: Direction,
    },
    RemovePillar {
        id: String,
    },
    RemoveBeam {
        id: String,
    },
    AddPointLoad {
        position: f64,
        magnitude: f64,
    },
    AddDistributedLoad {
        magnitude: f64,
        placement: DistributedPlacement,
    },
    Reset,
}

impl EditCommand {
    /// Run the command against a snapshot, producing the next one.
    pub fn apply(&self, model: &StructuralModel) -> CalcResult<StructuralModel> {
        match self {
            EditCommand::AddPillar { width, position } => model.add_pillar(*width, *position),
            EditCommand::AddCantilever { width, height, length, direction } => {
                model.add_cantilever(*width, *height, *length, *direction)
            }
            EditCommand::RemovePillar { id } => model.remove_pillar(id),
            EditCommand::RemoveBeam { id } => model.remove_beam(id),
            EditCommand::AddPointLoad { position, magnitude } => {
                model.add_point_load(*position, *magnitude)
            }
            EditCommand::AddDistributedLoad { magnitude, placement } => match placement {
                DistributedPlacement::ByPosition { start_position, end_position } => {
                    model.add_distributed_load(*start_position, *end_position, *magnitude)
                }
                DistributedPlacement::ByBeam { beam_id } => {
                    model.add_distributed_load_on_beam(beam_id, *magnitude)
                }
            },
            EditCommand::Reset => Ok(model.reset()),
        }
    }

    /// Operation name as it appears on the wire (`op` tag)
    pub fn name(&self) -> &'static str {
        match self {
            EditCommand::AddPillar { .. } => "add_pillar",
            EditCommand::AddCantilever { .. } => "add_cantilever",
            EditCommand::RemovePillar { .. } => "remove_pillar",
            EditCommand::RemoveBeam { .. } => "remove_beam",
            EditCommand::AddPointLoad { .. } => "add_point_load",
            EditCommand::AddDistributedLoad { .. } => "add_distributed_load",
            EditCommand::Reset => "reset",
        }
    }

    /// True for commands that change pillars or beams (and therefore renumber)
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            EditCommand::AddPointLoad { .. } | EditCommand::AddDistributedLoad { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_parse_from_script() {
        let script = r#"[
            {"op": "add_pillar", "width": 20, "position": -160},
            {"op": "add_pillar", "width": 20, "position": 160},
            {"op": "add_cantilever", "width": 20, "height": 40, "length": 100, "direction": "right"},
            {"op": "add_distributed_load", "magnitude": -5,
             "placement": {"mode": "by_beam", "beam_id": "V1"}},
            {"op": "add_point_load", "position": 200, "magnitude": -12}
        ]"#;
        let commands: Vec<EditCommand> = serde_json::from_str(script).unwrap();
        assert_eq!(commands.len(), 5);

        let mut model = StructuralModel::new();
        for command in &commands {
            model = command.apply(&model).unwrap();
        }
        assert_eq!(model.beams.len(), 2);
        assert_eq!(model.distributed_loads[0].beam_id.as_deref(), Some("V1"));
        assert_eq!(model.point_loads[0].position, 200.0);
    }

    #[test]
    fn test_reset_tag_without_fields() {
        let command: EditCommand = serde_json::from_str(r#"{"op":"reset"}"#).unwrap();
        assert_eq!(command, EditCommand::Reset);
        assert_eq!(command.name(), "reset");
        assert!(command.is_structural());
    }

    #[test]
    fn test_load_commands_are_not_structural() {
        let command = EditCommand::AddDistributedLoad {
            magnitude: -1.0,
            placement: DistributedPlacement::ByPosition { start_position: 0.0, end_position: 1.0 },
        };
        assert!(!command.is_structural());
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["op"], "add_distributed_load");
        assert_eq!(json["placement"]["mode"], "by_position");
    }
}
