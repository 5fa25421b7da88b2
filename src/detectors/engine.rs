//! Detector execution engine
//!
//! The DetectorEngine runs every registered detector over one file's facts:
//! - Sequentially, or in parallel on the rayon pool
//! - Each detector isolated with `catch_unwind`
//! - Violations from structure-sensitive detectors marked low-confidence
//!   when the file only parsed partially
//!
//! Results are returned in registration order either way, so parallel and
//! sequential runs produce identical output.

use crate::config::Thresholds;
use crate::detectors::base::{DetectionSummary, Detector, DetectorResult};
use crate::detectors::default_detectors;
use crate::errors::ConfigResult;
use crate::facts::CollectedFacts;
use crate::models::Violation;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Runs detectors over collected facts
#[derive(Clone, Default)]
pub struct DetectorEngine {
    detectors: Vec<Arc<dyn Detector>>,
    parallel: bool,
}

impl DetectorEngine {
    /// An engine with no detectors registered
    pub fn new() -> Self {
        Self::default()
    }

    /// All built-in detectors configured from `thresholds`.
    ///
    /// Fails if any threshold is non-positive.
    pub fn from_thresholds(thresholds: &Thresholds) -> ConfigResult<Self> {
        thresholds.validate()?;
        let mut engine = Self::new();
        engine.register_all(default_detectors(thresholds));
        Ok(engine)
    }

    /// Run detectors on the rayon pool instead of the calling thread
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Register a detector
    pub fn register(&mut self, detector: Arc<dyn Detector>) {
        debug!("Registering detector: {}", detector.name());
        self.detectors.push(detector);
    }

    /// Register multiple detectors
    pub fn register_all(&mut self, detectors: impl IntoIterator<Item = Arc<dyn Detector>>) {
        for detector in detectors {
            self.register(detector);
        }
    }

    /// Drop detectors whose kind name is in `disabled` (normalized names)
    pub fn without(mut self, disabled: &[String]) -> Self {
        self.detectors
            .retain(|d| !disabled.iter().any(|name| name == d.kind().as_str()));
        self
    }

    pub fn detector_count(&self) -> usize {
        self.detectors.len()
    }

    pub fn detector_names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Run every detector, one result per detector in registration order
    pub fn run(&self, facts: &CollectedFacts) -> Vec<DetectorResult> {
        if self.parallel {
            self.detectors
                .par_iter()
                .map(|detector| run_single_detector(detector, facts))
                .collect()
        } else {
            self.detectors
                .iter()
                .map(|detector| run_single_detector(detector, facts))
                .collect()
        }
    }

    /// Run every detector and flatten the violations
    pub fn detect(&self, facts: &CollectedFacts) -> (Vec<Violation>, DetectionSummary) {
        let mut violations = Vec::new();
        let mut summary = DetectionSummary::default();

        for result in self.run(facts) {
            summary.add_result(&result);
            if result.success {
                violations.extend(result.violations);
            } else if let Some(err) = &result.error {
                warn!(
                    "Detector {} failed on {}: {}",
                    result.detector_name, facts.file, err
                );
            }
        }

        debug!(
            "Detection complete for {}: {} violations from {}/{} detectors in {}ms",
            facts.file,
            violations.len(),
            summary.detectors_succeeded,
            summary.detectors_run,
            summary.total_duration_ms
        );
        (violations, summary)
    }
}

/// Run a single detector with panic isolation and timing
fn run_single_detector(detector: &Arc<dyn Detector>, facts: &CollectedFacts) -> DetectorResult {
    let name = detector.name().to_string();
    let start = Instant::now();

    let detect_result =
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| detector.detect(facts)));
    let duration = start.elapsed().as_millis() as u64;

    match detect_result {
        Ok(mut violations) => {
            if facts.partial && detector.structure_sensitive() {
                for v in &mut violations {
                    v.low_confidence = true;
                }
            }
            debug!(
                "Detector {} found {} violations in {}ms",
                name,
                violations.len(),
                duration
            );
            DetectorResult::success(name, violations, duration)
        }
        Err(panic_info) => {
            let panic_msg = panic_message(panic_info.as_ref());
            error!("Detector {} panicked: {}", name, panic_msg);
            DetectorResult::failure(name, format!("Panic: {}", panic_msg), duration)
        }
    }
}

/// Extract the message from a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::collect_facts;
    use crate::models::{ViolationKind, Severity};
    use crate::parsers::parse_source;

    struct PanickingDetector;

    impl Detector for PanickingDetector {
        fn name(&self) -> &'static str {
            "PanickingDetector"
        }
        fn description(&self) -> &'static str {
            "always panics"
        }
        fn kind(&self) -> ViolationKind {
            ViolationKind::MagicLiteral
        }
        fn detect(&self, _facts: &CollectedFacts) -> Vec<Violation> {
            panic!("boom")
        }
    }

    fn facts(source: &str) -> CollectedFacts {
        let parsed = parse_source(source).unwrap();
        collect_facts("test.py", source, &parsed)
    }

    const SOURCE: &str = r#"
import time

def f(a, b, c, d, e, g, h):
    if a > 999:
        time.sleep(5)
    return b
"#;

    #[test]
    fn test_registers_all_builtin_detectors() {
        let engine = DetectorEngine::from_thresholds(&Thresholds::default()).unwrap();
        assert_eq!(engine.detector_count(), 6);
        assert!(engine.detector_names().contains(&"GodObjectDetector"));
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let thresholds = Thresholds {
            max_parameters: 0,
            ..Default::default()
        };
        assert!(DetectorEngine::from_thresholds(&thresholds).is_err());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let facts = facts(SOURCE);
        let engine = DetectorEngine::from_thresholds(&Thresholds::default()).unwrap();
        let (sequential, _) = engine.detect(&facts);
        let (parallel, _) = engine.clone().with_parallel(true).detect(&facts);
        assert_eq!(sequential, parallel);
        // parameters, 999, 5, sleep
        assert_eq!(sequential.len(), 4);
    }

    #[test]
    fn test_disabled_detectors_skipped() {
        let engine = DetectorEngine::from_thresholds(&Thresholds::default())
            .unwrap()
            .without(&["magic-literal".to_string(), "timing-coupling".to_string()]);
        assert_eq!(engine.detector_count(), 4);
        let (violations, _) = engine.detect(&facts(SOURCE));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::High);
    }

    #[test]
    fn test_panicking_detector_isolated() {
        let mut engine = DetectorEngine::from_thresholds(&Thresholds::default()).unwrap();
        engine.register(Arc::new(PanickingDetector));
        let (violations, summary) = engine.detect(&facts(SOURCE));
        assert_eq!(summary.detectors_failed, 1);
        assert_eq!(summary.detectors_succeeded, 6);
        assert_eq!(violations.len(), 4);
    }

    #[test]
    fn test_partial_marks_structure_sensitive_low_confidence() {
        let mut source = String::from("broken = call(1, 2))\n\nclass Big:\n");
        for i in 0..22 {
            source.push_str(&format!("    def m{}(self):\n        pass\n", i));
        }
        source.push_str("\ndef wide(a, b, c, d, e):\n    pass\n");

        let facts = facts(&source);
        assert!(facts.partial);
        let engine = DetectorEngine::from_thresholds(&Thresholds::default()).unwrap();
        let (violations, _) = engine.detect(&facts);

        let god = violations
            .iter()
            .find(|v| v.kind() == ViolationKind::GodObject)
            .unwrap();
        assert!(god.low_confidence);
        let params = violations
            .iter()
            .find(|v| v.kind() == ViolationKind::ParameterCoupling)
            .unwrap();
        assert!(!params.low_confidence);
    }
}
