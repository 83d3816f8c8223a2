//! Blocking client for the external calculation endpoint.
//!
//! Successful responses are forwarded verbatim. Non-success statuses become
//! `CalcError::Upstream` carrying the parsed body (or the raw text when it
//! is not JSON); transport failures become `CalcError::UpstreamUnavailable`.
//! Nothing is retried.

use std::time::Duration;

use beam_core::{CalcEndpointConfig, CalcError, CalcResult, CalculationRequest};
use serde_json::Value;
use tracing::{info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Post the structure and return the result payload
pub fn post_calculation(config: &CalcEndpointConfig, request: &CalculationRequest) -> CalcResult<Value> {
    let endpoint = config.endpoint();
    info!(%endpoint, beams = request.beams.len(), "posting calculation request");

    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| CalcError::upstream_unavailable(&endpoint, e.to_string()))?;

    let response = client
        .post(&endpoint)
        .json(request)
        .send()
        .map_err(|e| {
            warn!(%endpoint, error = %e, "calculation endpoint unreachable");
            CalcError::upstream_unavailable(&endpoint, e.to_string())
        })?;

    let status = response.status().as_u16();
    let body = response
        .text()
        .map_err(|e| CalcError::upstream_unavailable(&endpoint, e.to_string()))?;

    interpret_response(&endpoint, status, &body)
}

/// Map an HTTP status and body to the payload or a structured error
pub fn interpret_response(endpoint: &str, status: u16, body: &str) -> CalcResult<Value> {
    if !(200..300).contains(&status) {
        let upstream_body = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
        };
        warn!(endpoint, status, "calculation endpoint returned an error");
        return Err(CalcError::Upstream {
            status_code: status,
            endpoint: endpoint.to_string(),
            upstream_body,
        });
    }

    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ENDPOINT: &str = "http://localhost:3001/beam2d/system";

    #[test]
    fn test_success_forwards_payload() {
        let payload = interpret_response(ENDPOINT, 200, r#"{"discretization":[]}"#).unwrap();
        assert_eq!(payload, json!({ "discretization": [] }));
    }

    #[test]
    fn test_error_status_keeps_json_body() {
        let err = interpret_response(ENDPOINT, 422, r#"{"message":"unstable"}"#).unwrap_err();
        match err {
            CalcError::Upstream { status_code, endpoint, upstream_body } => {
                assert_eq!(status_code, 422);
                assert_eq!(endpoint, ENDPOINT);
                assert_eq!(upstream_body["message"], "unstable");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_error_status_with_text_or_empty_body() {
        match interpret_response(ENDPOINT, 500, "Internal Server Error").unwrap_err() {
            CalcError::Upstream { upstream_body, .. } => {
                assert_eq!(upstream_body, Value::String("Internal Server Error".into()))
            }
            other => panic!("unexpected {:?}", other),
        }
        match interpret_response(ENDPOINT, 503, "").unwrap_err() {
            CalcError::Upstream { upstream_body, .. } => assert_eq!(upstream_body, Value::Null),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unreachable_endpoint_is_unavailable() {
        let config = CalcEndpointConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            path: "/beam2d/system".to_string(),
        };
        let request = CalculationRequest {
            pillars: Vec::new(),
            beams: Vec::new(),
            point_loads: Vec::new(),
            distributed_loads: Vec::new(),
        };
        let err = post_calculation(&config, &request).unwrap_err();
        assert_eq!(err.error_code(), "UPSTREAM_UNAVAILABLE");
        assert_eq!(err.status_code(), Some(502));
    }
}
