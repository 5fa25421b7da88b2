//! Detector thresholds
//!
//! Every threshold has a default, so an empty configuration is always
//! valid. Values that would make a detector meaningless (zero counts) are
//! rejected by [`Thresholds::validate`] instead of being clamped.

use crate::errors::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// Numbers that are never magic: the 0-indexed / parity idiom
pub const DEFAULT_ALLOWLIST: &[f64] = &[0.0, 1.0, -1.0];

/// Callees treated as wall-clock / blocking primitives
pub const DEFAULT_TIMING_PRIMITIVES: &[&str] = &["sleep", "wait", "wait_for"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub max_parameters: usize,
    pub max_methods: usize,
    pub magic_literal_allowlist: Vec<f64>,
    pub min_duplicate_complexity: usize,
    pub timing_primitives: Vec<String>,
    pub max_global_declarations: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_parameters: 4,
            max_methods: 20,
            magic_literal_allowlist: DEFAULT_ALLOWLIST.to_vec(),
            min_duplicate_complexity: 3,
            timing_primitives: DEFAULT_TIMING_PRIMITIVES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_global_declarations: 5,
        }
    }
}

impl Thresholds {
    /// Fail on any non-positive count
    pub fn validate(&self) -> ConfigResult<()> {
        let counts = [
            ("max_parameters", self.max_parameters),
            ("max_methods", self.max_methods),
            ("min_duplicate_complexity", self.min_duplicate_complexity),
            ("max_global_declarations", self.max_global_declarations),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(ConfigError::NonPositiveThreshold { name, value: 0 });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let t = Thresholds::default();
        assert!(t.validate().is_ok());
        assert_eq!(t.max_parameters, 4);
        assert_eq!(t.max_methods, 20);
        assert_eq!(t.min_duplicate_complexity, 3);
        assert_eq!(t.magic_literal_allowlist, vec![0.0, 1.0, -1.0]);
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let t = Thresholds {
            max_methods: 0,
            ..Default::default()
        };
        let err = t.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NonPositiveThreshold {
                name: "max_methods",
                ..
            }
        ));
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let t: Thresholds = toml::from_str("max_parameters = 6").unwrap();
        assert_eq!(t.max_parameters, 6);
        assert_eq!(t.max_methods, 20);
    }
}
