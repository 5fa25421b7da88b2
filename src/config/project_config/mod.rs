//! Project-level configuration support
//!
//! Loads per-project configuration from `connascence.toml` or
//! `.connascencerc.json` in the project root.
//!
//! # Configuration Format
//!
//! ```toml
//! # connascence.toml
//!
//! [detectors.parameter-coupling]
//! enabled = true
//! thresholds = { max_parameters = 6 }
//!
//! [detectors.magic-literal]
//! thresholds = { allowlist = [0, 1, -1, 2] }
//!
//! [detectors.timing-coupling]
//! thresholds = { primitives = ["sleep", "wait_for", "join"] }
//!
//! [exclude]
//! paths = ["build/", "**/migrations/**"]
//!
//! [analysis]
//! workers = 8
//! file_timeout_ms = 2000
//! parallel_detectors = false
//! cache_capacity = 256
//! ```

use super::thresholds::Thresholds;
use crate::errors::{ConfigError, ConfigResult};
use crate::models::ViolationKind;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Config file names, in lookup order
pub const CONFIG_FILE_NAMES: &[&str] = &["connascence.toml", ".connascencerc.json"];

/// Built-in exclusion patterns for caches, virtualenvs and build output.
/// Applied unless `skip_defaults = true`.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "**/__pycache__/**",
    "**/.venv/**",
    "**/venv/**",
    "**/build/**",
    "**/dist/**",
    "**/*.egg-info/**",
];

/// Project-level configuration loaded from connascence.toml or similar
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectConfig {
    /// Per-detector configuration overrides, keyed by detector name
    #[serde(default)]
    pub detectors: BTreeMap<String, DetectorConfigOverride>,

    /// Path exclusion patterns
    #[serde(default)]
    pub exclude: ExcludeConfig,

    /// Worker pool and per-file limits
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Configuration override for a specific detector
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DetectorConfigOverride {
    /// Whether the detector is enabled (default: true)
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Detector-specific threshold overrides
    #[serde(default)]
    pub thresholds: BTreeMap<String, ThresholdValue>,
}

/// A threshold value: scalar or list
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ThresholdValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    List(Vec<ThresholdValue>),
}

impl ThresholdValue {
    /// Get as i64 (returns None for non-integer types)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ThresholdValue::Integer(v) => Some(*v),
            ThresholdValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    /// Get as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ThresholdValue::Integer(v) => Some(*v as f64),
            ThresholdValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ThresholdValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ThresholdValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ThresholdValue]> {
        match self {
            ThresholdValue::List(v) => Some(v),
            _ => None,
        }
    }
}

/// Path exclusion configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExcludeConfig {
    /// Paths/patterns to exclude from analysis
    #[serde(default)]
    pub paths: Vec<String>,

    /// If true, disable built-in default exclusion patterns
    #[serde(default)]
    pub skip_defaults: bool,
}

impl ExcludeConfig {
    /// Returns effective exclusion patterns (defaults + user patterns).
    /// If `skip_defaults` is true, only user patterns are returned.
    pub fn effective_patterns(&self) -> Vec<String> {
        let mut patterns = Vec::new();

        if !self.skip_defaults {
            patterns.extend(DEFAULT_EXCLUDE_PATTERNS.iter().map(|s| s.to_string()));
        }

        for p in &self.paths {
            if !patterns.contains(p) {
                patterns.push(p.clone());
            }
        }

        patterns
    }
}

/// Batch analysis settings
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AnalysisConfig {
    /// Worker threads (default: available parallelism, capped)
    #[serde(default)]
    pub workers: Option<usize>,

    /// Per-file time budget in milliseconds
    #[serde(default)]
    pub file_timeout_ms: Option<u64>,

    /// Run a file's detectors on the rayon pool
    #[serde(default)]
    pub parallel_detectors: bool,

    /// Capacity of the in-memory content cache (absent: no cache)
    #[serde(default)]
    pub cache_capacity: Option<usize>,
}

/// Load project configuration from the project root.
///
/// Searches for `connascence.toml`, then `.connascencerc.json`. A file that
/// fails to load is logged and skipped; defaults are returned when nothing
/// loads.
pub fn load_project_config(root: &Path) -> ProjectConfig {
    for name in CONFIG_FILE_NAMES {
        let path = root.join(name);
        if !path.exists() {
            continue;
        }
        match ProjectConfig::from_path(&path) {
            Ok(config) => {
                debug!("Loaded project config from {}", path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", path.display(), e);
            }
        }
    }

    debug!("No project config found, using defaults");
    ProjectConfig::default()
}

impl ProjectConfig {
    /// Load one config file; the format follows the extension
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        let config = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        };
        let config = config.map_err(|message| ConfigError::Malformed {
            path: path.to_path_buf(),
            message,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    fn from_json_str(content: &str) -> Result<Self, String> {
        serde_json::from_str(content).map_err(|e| e.to_string())
    }

    /// Reject detector keys that name no known detector
    pub fn validate(&self) -> ConfigResult<()> {
        for name in self.detectors.keys() {
            let normalized = normalize_detector_name(name);
            if !ViolationKind::ALL.iter().any(|k| k.as_str() == normalized) {
                return Err(ConfigError::UnknownDetector(name.clone()));
            }
        }
        Ok(())
    }

    fn detector(&self, name: &str) -> Option<&DetectorConfigOverride> {
        let normalized = normalize_detector_name(name);
        self.detectors
            .get(&normalized)
            .or_else(|| self.detectors.get(name))
            .or_else(|| {
                self.detectors
                    .iter()
                    .find(|(key, _)| normalize_detector_name(key) == normalized)
                    .map(|(_, v)| v)
            })
    }

    /// Check if a detector is enabled (defaults to true if not specified)
    pub fn is_detector_enabled(&self, name: &str) -> bool {
        self.detector(name).and_then(|c| c.enabled).unwrap_or(true)
    }

    /// Threshold value for a detector
    pub fn threshold(&self, detector_name: &str, threshold_name: &str) -> Option<&ThresholdValue> {
        self.detector(detector_name)
            .and_then(|c| c.thresholds.get(threshold_name))
    }

    /// All detector names explicitly disabled, normalized
    pub fn disabled_detectors(&self) -> Vec<String> {
        self.detectors
            .iter()
            .filter(|(_, config)| config.enabled == Some(false))
            .map(|(name, _)| normalize_detector_name(name))
            .collect()
    }

    /// Default thresholds with this project's overrides applied, validated
    pub fn thresholds(&self) -> ConfigResult<Thresholds> {
        let mut t = Thresholds::default();

        if let Some(v) = self.threshold("parameter-coupling", "max_parameters") {
            t.max_parameters = positive_count("parameter-coupling", "max_parameters", v)?;
        }
        if let Some(v) = self.threshold("god-object", "max_methods") {
            t.max_methods = positive_count("god-object", "max_methods", v)?;
        }
        if let Some(v) = self.threshold("algorithm-duplication", "min_duplicate_complexity") {
            t.min_duplicate_complexity =
                positive_count("algorithm-duplication", "min_duplicate_complexity", v)?;
        }
        if let Some(v) = self.threshold("global-coupling", "max_global_declarations") {
            t.max_global_declarations =
                positive_count("global-coupling", "max_global_declarations", v)?;
        }
        if let Some(v) = self.threshold("magic-literal", "allowlist") {
            t.magic_literal_allowlist =
                list_of("magic-literal", "allowlist", v, "a list of numbers", |item| {
                    item.as_f64()
                })?;
        }
        if let Some(v) = self.threshold("timing-coupling", "primitives") {
            t.timing_primitives =
                list_of("timing-coupling", "primitives", v, "a list of strings", |item| {
                    item.as_str().map(str::to_string)
                })?;
        }

        t.validate()?;
        Ok(t)
    }
}

fn positive_count(
    detector: &str,
    name: &'static str,
    value: &ThresholdValue,
) -> ConfigResult<usize> {
    let v = value.as_i64().ok_or_else(|| ConfigError::WrongThresholdType {
        detector: detector.to_string(),
        name: name.to_string(),
        expected: "a positive integer",
    })?;
    if v <= 0 {
        return Err(ConfigError::NonPositiveThreshold { name, value: v });
    }
    Ok(v as usize)
}

fn list_of<T>(
    detector: &str,
    name: &str,
    value: &ThresholdValue,
    expected: &'static str,
    convert: impl Fn(&ThresholdValue) -> Option<T>,
) -> ConfigResult<Vec<T>> {
    let wrong_type = || ConfigError::WrongThresholdType {
        detector: detector.to_string(),
        name: name.to_string(),
        expected,
    };
    value
        .as_list()
        .ok_or_else(wrong_type)?
        .iter()
        .map(|item| convert(item).ok_or_else(wrong_type))
        .collect()
}

/// Normalize detector name for config lookup
/// Converts various formats to kebab-case for matching
pub fn normalize_detector_name(name: &str) -> String {
    // ParameterCouplingDetector -> parameter-coupling
    // god_object -> god-object
    // magic-literal -> magic-literal

    let mut result = String::new();
    let chars: Vec<char> = name.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_is_lower = i > 0 && chars[i - 1].is_lowercase();
            let is_acronym_end = i > 0
                && chars[i - 1].is_uppercase()
                && i + 1 < chars.len()
                && chars[i + 1].is_lowercase();

            if prev_is_lower || is_acronym_end {
                result.push('-');
            }
            result.extend(c.to_lowercase());
        } else if *c == '_' {
            result.push('-');
        } else {
            result.push(*c);
        }
    }

    result.trim_end_matches("-detector").to_string()
}
