//! JSON body posted to the external calculation endpoint.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::model::{Beam, DistributedLoad, Pillar, PointLoad, StructuralModel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRequest {
    pub pillars: Vec<Pillar>,
    pub beams: Vec<Beam>,
    pub point_loads: Vec<PointLoad>,
    pub distributed_loads: Vec<DistributedLoad>,
}

impl CalculationRequest {
    /// Body for `model`; a structure without beams has nothing to calculate
    pub fn from_model(model: &StructuralModel) -> CalcResult<Self> {
        if model.beams.is_empty() {
            return Err(CalcError::EmptyStructure {
                reason: "add at least two pillars before running the calculation".to_string(),
            });
        }
        Ok(Self {
            pillars: model.pillars.clone(),
            beams: model.beams.clone(),
            point_loads: model.point_loads.clone(),
            distributed_loads: model.distributed_loads.clone(),
        })
    }

    pub fn to_json(&self) -> CalcResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_uses_camel_case_collections() {
        let model = StructuralModel::new()
            .add_pillar(20.0, -160.0)
            .unwrap()
            .add_pillar(20.0, 160.0)
            .unwrap()
            .add_point_load(0.0, -10.0)
            .unwrap()
            .add_distributed_load_on_beam("V1", -2.5)
            .unwrap();

        let json = serde_json::to_value(CalculationRequest::from_model(&model).unwrap()).unwrap();
        assert_eq!(json["pillars"][1]["id"], "P2");
        assert_eq!(json["beams"][0]["startPillarId"], "P1");
        assert_eq!(json["pointLoads"][0]["magnitude"], -10.0);
        assert_eq!(json["distributedLoads"][0]["beamId"], "V1");
        assert!(json.get("pointLoadSeq").is_none());
    }

    #[test]
    fn test_needs_a_beam() {
        let model = StructuralModel::new().add_pillar(20.0, 0.0).unwrap();
        let err = CalculationRequest::from_model(&model).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_STRUCTURE");
    }
}
