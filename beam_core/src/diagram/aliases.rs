//! Key aliases for locating shear/moment series in result payloads.
//!
//! Payload keys are compared after [`normalize_key`], so `"Momento Fletor"`,
//! `"momento_fletor"` and `"momentoFletor"` all match the alias
//! `"momentofletor"`. The built-in lists can be extended from a JSON file:
//!
//! ```json
//! { "shear": ["vz"], "moment": ["my"] }
//! ```

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::CalcResult;

use super::DiagramKind;

/// Built-in aliases
pub static DEFAULT_ALIASES: Lazy<AliasConfig> = Lazy::new(AliasConfig::builtin);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasConfig {
    /// Per-element discretization arrays
    pub discretization: Vec<String>,
    /// Element label inside a discretization entry
    pub element_label: Vec<String>,
    /// Abscissa arrays / fields
    pub x: Vec<String>,
    pub shear: Vec<String>,
    pub moment: Vec<String>,
}

impl Default for AliasConfig {
    fn default() -> Self {
        DEFAULT_ALIASES.clone()
    }
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| normalize_key(s)).collect()
}

impl AliasConfig {
    fn builtin() -> Self {
        Self {
            discretization: owned(&[
                "discretization",
                "discretizacao",
                "discretizacaoPorElemento",
                "discretizationPerElement",
                "elementDiscretization",
                "elements",
                "elementos",
            ]),
            element_label: owned(&["element", "elemento", "label", "beam", "viga", "name", "id"]),
            x: owned(&["x", "xs", "position", "positions", "posicao", "posicoes", "abscissa", "coord"]),
            shear: owned(&[
                "shear",
                "shearForce",
                "v",
                "vy",
                "cortante",
                "esforcoCortante",
                "forcaCortante",
            ]),
            moment: owned(&[
                "moment",
                "bendingMoment",
                "m",
                "mz",
                "momento",
                "momentoFletor",
                "fletor",
            ]),
        }
    }

    /// Parse a JSON alias file and merge it into the built-in lists
    pub fn from_json(json: &str) -> CalcResult<Self> {
        let extra: AliasConfig = serde_json::from_str(json)?;
        let mut config = Self::builtin();
        config.extend(&extra);
        Ok(config)
    }

    /// Append aliases not already present (normalized)
    pub fn extend(&mut self, other: &AliasConfig) {
        merge(&mut self.discretization, &other.discretization);
        merge(&mut self.element_label, &other.element_label);
        merge(&mut self.x, &other.x);
        merge(&mut self.shear, &other.shear);
        merge(&mut self.moment, &other.moment);
    }

    pub fn for_kind(&self, kind: DiagramKind) -> &[String] {
        match kind {
            DiagramKind::Shear => &self.shear,
            DiagramKind::Moment => &self.moment,
        }
    }
}

fn merge(into: &mut Vec<String>, from: &[String]) {
    for alias in from.iter().map(|a| normalize_key(a)) {
        if !into.contains(&alias) {
            into.push(alias);
        }
    }
}

/// True when `key` normalizes to one of `aliases`
pub fn matches(aliases: &[String], key: &str) -> bool {
    let key = normalize_key(key);
    aliases.iter().any(|a| *a == key)
}

/// Lowercase, fold Latin diacritics, drop everything but ASCII letters and digits
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .flat_map(char::to_lowercase)
        .map(fold_diacritic)
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Momento Fletor"), "momentofletor");
        assert_eq!(normalize_key("esforço_cortante"), "esforcocortante");
        assert_eq!(normalize_key("Posição"), "posicao");
    }

    #[test]
    fn test_defaults_match_variants() {
        let aliases = AliasConfig::default();
        assert!(matches(&aliases.moment, "momentoFletor"));
        assert!(matches(&aliases.shear, "Cortante"));
        assert!(matches(aliases.for_kind(DiagramKind::Shear), "V"));
        assert!(!matches(&aliases.shear, "moment"));
    }

    #[test]
    fn test_json_extends_builtin() {
        let config = AliasConfig::from_json(r#"{ "shear": ["Vz"], "moment": ["momento"] }"#).unwrap();
        assert!(matches(&config.shear, "vz"));
        assert!(matches(&config.shear, "cortante"));
        assert_eq!(
            config.moment.iter().filter(|a| a.as_str() == "momento").count(),
            1
        );
    }

    #[test]
    fn test_bad_json_is_serialization_error() {
        let err = AliasConfig::from_json("{ nope").unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }
}
