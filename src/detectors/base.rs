//! Base detector trait and types
//!
//! This module defines the core abstractions for connascence detection:
//! - `Detector` trait that all detectors must implement
//! - `DetectorResult` for capturing execution results
//! - `DetectionSummary` for per-run statistics

use crate::facts::CollectedFacts;
use crate::models::{Severity, Violation, ViolationKind};
use std::collections::BTreeMap;

/// Result from running a single detector
#[derive(Debug, Clone)]
pub struct DetectorResult {
    /// Name of the detector that produced these results
    pub detector_name: String,
    /// Violations produced by the detector
    pub violations: Vec<Violation>,
    /// Execution time in milliseconds
    pub duration_ms: u64,
    /// Whether the detector completed successfully
    pub success: bool,
    /// Error message if the detector failed
    pub error: Option<String>,
}

impl DetectorResult {
    /// Create a successful result
    pub fn success(detector_name: String, violations: Vec<Violation>, duration_ms: u64) -> Self {
        Self {
            detector_name,
            violations,
            duration_ms,
            success: true,
            error: None,
        }
    }

    /// Create a failed result
    pub fn failure(detector_name: String, error: String, duration_ms: u64) -> Self {
        Self {
            detector_name,
            violations: Vec::new(),
            duration_ms,
            success: false,
            error: Some(error),
        }
    }
}

/// Trait for all connascence detectors
///
/// A detector is a pure function over one file's [`CollectedFacts`]: it
/// never re-walks the syntax tree and never mutates the facts, so any
/// number of detectors can share one snapshot in any order.
///
/// # Example Implementation
///
/// ```ignore
/// pub struct MyDetector;
///
/// impl Detector for MyDetector {
///     fn name(&self) -> &'static str {
///         "MyDetector"
///     }
///
///     fn description(&self) -> &'static str {
///         "Detects my specific coupling"
///     }
///
///     fn kind(&self) -> ViolationKind {
///         ViolationKind::MagicLiteral
///     }
///
///     fn detect(&self, facts: &CollectedFacts) -> Vec<Violation> {
///         vec![]
///     }
/// }
/// ```
pub trait Detector: Send + Sync {
    /// Unique identifier for this detector (e.g., "GodObjectDetector")
    fn name(&self) -> &'static str;

    /// Human-readable description of what this detector finds
    fn description(&self) -> &'static str;

    /// The violation kind this detector emits
    fn kind(&self) -> ViolationKind;

    /// Run detection over one file's facts
    fn detect(&self, facts: &CollectedFacts) -> Vec<Violation>;

    /// Whether results depend on complete structure.
    ///
    /// Violations from structure-sensitive detectors are marked
    /// `low_confidence` when the file only parsed partially.
    fn structure_sensitive(&self) -> bool {
        false
    }
}

/// Summary statistics from running all detectors on one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionSummary {
    /// Total number of detectors run
    pub detectors_run: usize,
    /// Number of detectors that succeeded
    pub detectors_succeeded: usize,
    /// Number of detectors that failed
    pub detectors_failed: usize,
    /// Total violations across all detectors
    pub total_violations: usize,
    /// Violations by severity
    pub by_severity: BTreeMap<Severity, usize>,
    /// Total execution time in milliseconds
    pub total_duration_ms: u64,
}

impl DetectionSummary {
    /// Update summary with a detector result
    pub fn add_result(&mut self, result: &DetectorResult) {
        self.detectors_run += 1;
        self.total_duration_ms += result.duration_ms;

        if result.success {
            self.detectors_succeeded += 1;
            self.total_violations += result.violations.len();

            for violation in &result.violations {
                *self.by_severity.entry(violation.severity).or_insert(0) += 1;
            }
        } else {
            self.detectors_failed += 1;
        }
    }

    /// Fold another file's summary into this one
    pub fn merge(&mut self, other: &DetectionSummary) {
        self.detectors_run += other.detectors_run;
        self.detectors_succeeded += other.detectors_succeeded;
        self.detectors_failed += other.detectors_failed;
        self.total_violations += other.total_violations;
        self.total_duration_ms += other.total_duration_ms;
        for (severity, count) in &other.by_severity {
            *self.by_severity.entry(*severity).or_insert(0) += count;
        }
    }
}
