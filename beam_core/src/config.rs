//! Calculation endpoint configuration.
//!
//! The endpoint is `base_url + path`, both read from the environment with
//! local defaults. Command-line flags override either part.

use std::env;

use serde::{Deserialize, Serialize};

pub const API_URL_VAR: &str = "ESTRUTURA_API_URL";
pub const API_PATH_VAR: &str = "ESTRUTURA_API_PATH";
pub const DEFAULT_API_URL: &str = "http://localhost:3001";
pub const DEFAULT_API_PATH: &str = "/beam2d/system";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalcEndpointConfig {
    pub base_url: String,
    pub path: String,
}

impl Default for CalcEndpointConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            path: DEFAULT_API_PATH.to_string(),
        }
    }
}

impl CalcEndpointConfig {
    /// Read `ESTRUTURA_API_URL` / `ESTRUTURA_API_PATH`, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            base_url: non_empty(API_URL_VAR).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            path: non_empty(API_PATH_VAR).unwrap_or_else(|| DEFAULT_API_PATH.to_string()),
        }
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        self
    }

    pub fn with_path(mut self, path: Option<String>) -> Self {
        if let Some(path) = path {
            self.path = path;
        }
        self
    }

    /// Full URL the calculation request is posted to
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.path.starts_with('/') {
            format!("{}{}", base, self.path)
        } else {
            format!("{}/{}", base, self.path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CalcEndpointConfig::from_lookup(|_| None);
        assert_eq!(config.endpoint(), "http://localhost:3001/beam2d/system");
    }

    #[test]
    fn test_environment_values() {
        let config = CalcEndpointConfig::from_lookup(|key| match key {
            API_URL_VAR => Some("https://calc.example.com/".to_string()),
            API_PATH_VAR => Some("v2/frame".to_string()),
            _ => None,
        });
        assert_eq!(config.endpoint(), "https://calc.example.com/v2/frame");
    }

    #[test]
    fn test_blank_variable_uses_default() {
        let config = CalcEndpointConfig::from_lookup(|key| (key == API_URL_VAR).then(|| "  ".to_string()));
        assert_eq!(config.base_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_flags_override() {
        let config = CalcEndpointConfig::default()
            .with_base_url(Some("http://10.0.0.2:9000".to_string()))
            .with_path(None);
        assert_eq!(config.endpoint(), "http://10.0.0.2:9000/beam2d/system");
    }
}
