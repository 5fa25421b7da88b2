//! Configuration for connascence analysis
//!
//! This module handles:
//! - Detector thresholds and their validation
//! - Project-level configuration (connascence.toml / .connascencerc.json)
//! - Path exclusion and analysis (worker pool) settings

mod project_config;
mod thresholds;

pub use project_config::{
    load_project_config,
    normalize_detector_name,
    AnalysisConfig,
    DetectorConfigOverride,
    ExcludeConfig,
    ProjectConfig,
    ThresholdValue,
    DEFAULT_EXCLUDE_PATTERNS,
};
pub use thresholds::{Thresholds, DEFAULT_ALLOWLIST, DEFAULT_TIMING_PRIMITIVES};
