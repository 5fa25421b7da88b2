//! Parameter coupling detector (connascence of position)
//!
//! Detects functions with too many parameters. Every extra positional
//! parameter is another ordering that call sites and the definition must
//! agree on, and they drift out of sync as the signature evolves.

use crate::detectors::base::Detector;
use crate::facts::{CollectedFacts, FunctionFact};
use crate::models::{Severity, Violation, ViolationDetail, ViolationKind};
use tracing::debug;

/// Thresholds for parameter coupling detection
#[derive(Debug, Clone)]
pub struct ParameterCouplingThresholds {
    /// Parameters above this count are flagged
    pub max_parameters: usize,
}

impl Default for ParameterCouplingThresholds {
    fn default() -> Self {
        Self { max_parameters: 4 }
    }
}

/// Detects functions whose parameter count exceeds the threshold
pub struct ParameterCouplingDetector {
    thresholds: ParameterCouplingThresholds,
}

impl ParameterCouplingDetector {
    /// Create a new detector with default thresholds
    pub fn new() -> Self {
        Self::with_thresholds(ParameterCouplingThresholds::default())
    }

    /// Create with custom thresholds
    pub fn with_thresholds(thresholds: ParameterCouplingThresholds) -> Self {
        Self { thresholds }
    }

    /// Severity scales with how far the count is over the threshold:
    /// 1-2 over is Medium, 3-4 High, anything beyond Critical.
    fn calculate_severity(&self, parameter_count: usize) -> Severity {
        match parameter_count.saturating_sub(self.thresholds.max_parameters) {
            0 => Severity::Low,
            1..=2 => Severity::Medium,
            3..=4 => Severity::High,
            _ => Severity::Critical,
        }
    }

    fn create_violation(&self, func: &FunctionFact) -> Violation {
        let count = func.parameter_count;
        let message = format!(
            "Function '{}' has {} parameters (threshold: {})",
            func.qualified_name, count, self.thresholds.max_parameters
        );
        let recommendation = if count > self.thresholds.max_parameters + 4 {
            "Split the function by responsibility, then group the remaining related \
             parameters into a dataclass"
        } else {
            "Group related parameters into a dataclass or make them keyword-only \
             so call sites no longer depend on their order"
        };

        Violation::new(
            self.calculate_severity(count),
            func.location.clone(),
            ViolationDetail::ParameterCoupling {
                function: func.qualified_name.clone(),
                parameter_count: count,
                threshold: self.thresholds.max_parameters,
            },
            message,
            recommendation,
        )
    }
}

impl Default for ParameterCouplingDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for ParameterCouplingDetector {
    fn name(&self) -> &'static str {
        "ParameterCouplingDetector"
    }

    fn description(&self) -> &'static str {
        "Detects functions with too many positional parameters"
    }

    fn kind(&self) -> ViolationKind {
        ViolationKind::ParameterCoupling
    }

    fn detect(&self, facts: &CollectedFacts) -> Vec<Violation> {
        let violations: Vec<Violation> = facts
            .functions
            .iter()
            .filter(|f| f.parameter_count > self.thresholds.max_parameters)
            .map(|f| self.create_violation(f))
            .collect();

        debug!(
            "ParameterCouplingDetector found {} violations in {}",
            violations.len(),
            facts.file
        );
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::collect_facts;
    use crate::parsers::parse_source;

    fn run(detector: &ParameterCouplingDetector, source: &str) -> Vec<Violation> {
        let parsed = parse_source(source).unwrap();
        detector.detect(&collect_facts("test.py", source, &parsed))
    }

    #[test]
    fn test_severity_calculation() {
        let detector = ParameterCouplingDetector::new();
        assert_eq!(detector.calculate_severity(5), Severity::Medium);
        assert_eq!(detector.calculate_severity(6), Severity::Medium);
        assert_eq!(detector.calculate_severity(7), Severity::High);
        assert_eq!(detector.calculate_severity(8), Severity::High);
        assert_eq!(detector.calculate_severity(9), Severity::Critical);
        assert_eq!(detector.calculate_severity(15), Severity::Critical);
    }

    #[test]
    fn test_threshold_boundary() {
        let detector = ParameterCouplingDetector::new();
        assert!(run(&detector, "def ok(a, b, c, d):\n    pass\n").is_empty());

        let violations = run(&detector, "def over(a, b, c, d, e):\n    pass\n");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Medium);
        assert_eq!(violations[0].kind(), ViolationKind::ParameterCoupling);
        assert_eq!(violations[0].location.line, 1);
    }

    #[test]
    fn test_method_receiver_not_counted() {
        let detector = ParameterCouplingDetector::new();
        let source = "class A:\n    def m(self, a, b, c, d):\n        pass\n";
        assert!(run(&detector, source).is_empty());
    }

    #[test]
    fn test_custom_threshold() {
        let detector =
            ParameterCouplingDetector::with_thresholds(ParameterCouplingThresholds {
                max_parameters: 2,
            });
        let violations = run(&detector, "def f(a, b, c):\n    pass\n");
        assert_eq!(violations.len(), 1);
        match &violations[0].detail {
            ViolationDetail::ParameterCoupling {
                function,
                parameter_count,
                threshold,
            } => {
                assert_eq!(function, "f");
                assert_eq!(*parameter_count, 3);
                assert_eq!(*threshold, 2);
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }
}
