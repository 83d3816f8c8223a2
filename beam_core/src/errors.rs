//! # Error Types
//!
//! Structured error types for beam_core. Every rejected editing operation
//! maps to one of these variants, and [`CalcError::user_message`] renders the
//! blocking message shown to the user. Upstream calculation failures carry
//! the status, endpoint and body returned by the structure API.
//!
//! ## Example
//!
//! ```rust
//! use beam_core::errors::{CalcError, CalcResult};
//!
//! fn validate_width(width: f64) -> CalcResult<()> {
//!     if width <= 0.0 {
//!         return Err(CalcError::invalid_input("width", width.to_string(), "Width must be positive"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_width(-1.0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Direction;

/// Result type alias for beam_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Status reported when the calculation endpoint cannot be reached.
pub const UPSTREAM_UNAVAILABLE_STATUS: u16 = 502;

/// Fallback message when the transport gives no reason for a failed connection.
pub const UPSTREAM_UNAVAILABLE_MESSAGE: &str = "Erro ao conectar com API de estrutura.";

/// Structured error type for editing, rendering and calculation operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (non-finite, non-positive, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// An operation needs pillars and none exist
    #[error("No pillars available: {reason}")]
    NoPillars { reason: String },

    /// A new pillar would fall under the free end of a cantilever
    #[error("Position {position} is blocked by cantilever {beam_id} from pillar {pillar_id}")]
    PlacementConflict {
        position: f64,
        beam_id: String,
        pillar_id: String,
    },

    /// A cantilever already exists at this pillar and direction
    #[error("Pillar {pillar_id} already has a cantilever to the {direction}")]
    DuplicateCantilever {
        pillar_id: String,
        direction: Direction,
    },

    /// Only the leftmost and rightmost pillars may be removed
    #[error("Pillar {pillar_id} is an interior support and cannot be removed")]
    InteriorPillar { pillar_id: String },

    /// A referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A load position lies outside the structure
    #[error("Position {value} for '{field}' is outside the structure [{min}, {max}]")]
    OutOfBounds {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A load was requested but there is no structure to place it on
    #[error("No structure: {reason}")]
    EmptyStructure { reason: String },

    /// The calculation endpoint answered with a non-success status
    #[error("Upstream error {status_code} from {endpoint}")]
    Upstream {
        #[serde(rename = "statusCode")]
        status_code: u16,
        endpoint: String,
        #[serde(rename = "upstreamBody")]
        upstream_body: serde_json::Value,
    },

    /// The calculation endpoint could not be reached
    #[error("Upstream unavailable at {endpoint}: {message}")]
    UpstreamUnavailable { endpoint: String, message: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CalcError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an OutOfBounds error
    pub fn out_of_bounds(field: impl Into<String>, value: f64, min: f64, max: f64) -> Self {
        CalcError::OutOfBounds {
            field: field.into(),
            value,
            min,
            max,
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an UpstreamUnavailable error, falling back to the fixed message
    pub fn upstream_unavailable(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        CalcError::UpstreamUnavailable {
            endpoint: endpoint.into(),
            message: if message.trim().is_empty() {
                UPSTREAM_UNAVAILABLE_MESSAGE.to_string()
            } else {
                message
            },
        }
    }

    /// HTTP-style status associated with upstream failures
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CalcError::Upstream { status_code, .. } => Some(*status_code),
            CalcError::UpstreamUnavailable { .. } => Some(UPSTREAM_UNAVAILABLE_STATUS),
            _ => None,
        }
    }

    /// True for rejections raised before any mutation (the model is unchanged)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CalcError::InvalidInput { .. }
                | CalcError::NoPillars { .. }
                | CalcError::PlacementConflict { .. }
                | CalcError::DuplicateCantilever { .. }
                | CalcError::InteriorPillar { .. }
                | CalcError::NotFound { .. }
                | CalcError::OutOfBounds { .. }
                | CalcError::EmptyStructure { .. }
        )
    }

    /// Blocking message shown to the user, naming the offending entity.
    pub fn user_message(&self) -> String {
        match self {
            CalcError::InvalidInput { field, value, reason } => {
                format!("Invalid value '{}' for {}: {}.", value, field, reason)
            }
            CalcError::NoPillars { reason } => format!("No pillars available: {}.", reason),
            CalcError::PlacementConflict { position, beam_id, pillar_id } => format!(
                "Cannot add a pillar at {}: cantilever {} leaving pillar {} occupies that side.",
                position, beam_id, pillar_id
            ),
            CalcError::DuplicateCantilever { pillar_id, direction } => format!(
                "Pillar {} already has a cantilever to the {}.",
                pillar_id, direction
            ),
            CalcError::InteriorPillar { pillar_id } => format!(
                "Pillar {} is an interior support. Only corner pillars can be removed.",
                pillar_id
            ),
            CalcError::NotFound { entity, id } => format!("{} {} does not exist.", entity, id),
            CalcError::OutOfBounds { field, value, min, max } => format!(
                "The {} {} is outside the structure ({} to {}).",
                field, value, min, max
            ),
            CalcError::EmptyStructure { reason } => {
                format!("There is no structure yet: {}.", reason)
            }
            other => other.to_string(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::NoPillars { .. } => "NO_PILLARS",
            CalcError::PlacementConflict { .. } => "PLACEMENT_CONFLICT",
            CalcError::DuplicateCantilever { .. } => "DUPLICATE_CANTILEVER",
            CalcError::InteriorPillar { .. } => "INTERIOR_PILLAR",
            CalcError::NotFound { .. } => "NOT_FOUND",
            CalcError::OutOfBounds { .. } => "OUT_OF_BOUNDS",
            CalcError::EmptyStructure { .. } => "EMPTY_STRUCTURE",
            CalcError::Upstream { .. } => "UPSTREAM_ERROR",
            CalcError::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::SerializationError { reason: e.to_string() }
    }
}

impl From<std::fmt::Error> for CalcError {
    fn from(_: std::fmt::Error) -> Self {
        CalcError::Internal {
            message: "failed to format output".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::invalid_input("width", "-5", "Width must be positive");
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_upstream_error_uses_wire_field_names() {
        let error = CalcError::Upstream {
            status_code: 422,
            endpoint: "http://localhost:3001/beam2d/system".to_string(),
            upstream_body: serde_json::json!({ "message": "bad span" }),
        };
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["details"]["statusCode"], 422);
        assert_eq!(json["details"]["upstreamBody"]["message"], "bad span");
        assert_eq!(error.status_code(), Some(422));
    }

    #[test]
    fn test_unavailable_falls_back_to_fixed_message() {
        let error = CalcError::upstream_unavailable("http://x", "  ");
        match &error {
            CalcError::UpstreamUnavailable { message, .. } => {
                assert_eq!(message, UPSTREAM_UNAVAILABLE_MESSAGE)
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(error.status_code(), Some(502));
        assert!(!error.is_validation());
    }

    #[test]
    fn test_user_message_names_entities() {
        let error = CalcError::PlacementConflict {
            position: 300.0,
            beam_id: "V2".to_string(),
            pillar_id: "P2".to_string(),
        };
        let msg = error.user_message();
        assert!(msg.contains("V2"));
        assert!(msg.contains("P2"));
        assert!(error.is_validation());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::not_found("Beam", "V9").error_code(), "NOT_FOUND");
        assert_eq!(
            CalcError::InteriorPillar { pillar_id: "P2".into() }.error_code(),
            "INTERIOR_PILLAR"
        );
    }
}
