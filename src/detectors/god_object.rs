//! God object detector - finds classes that do too much
//!
//! A "god object" is approximated by method count: a class with more
//! methods than the threshold has taken on more responsibilities than one
//! abstraction should carry. Attribute count is reported alongside as
//! context but does not affect severity.

use crate::detectors::base::Detector;
use crate::facts::{ClassFact, CollectedFacts};
use crate::models::{Severity, Violation, ViolationDetail, ViolationKind};
use tracing::debug;

/// Thresholds for god object detection
#[derive(Debug, Clone)]
pub struct GodObjectThresholds {
    /// Method count above which a class is flagged
    pub max_methods: usize,
}

impl Default for GodObjectThresholds {
    fn default() -> Self {
        Self { max_methods: 20 }
    }
}

/// Detects god objects (classes with too many methods)
pub struct GodObjectDetector {
    thresholds: GodObjectThresholds,
}

impl GodObjectDetector {
    /// Create a new detector with default thresholds
    pub fn new() -> Self {
        Self::with_thresholds(GodObjectThresholds::default())
    }

    /// Create with custom thresholds
    pub fn with_thresholds(thresholds: GodObjectThresholds) -> Self {
        Self { thresholds }
    }

    /// 1-4 methods over the threshold is Medium, 5-10 High, more Critical.
    /// With the default of 20: 21-24 Medium, 25-30 High, 31+ Critical.
    fn calculate_severity(&self, method_count: usize) -> Severity {
        match method_count.saturating_sub(self.thresholds.max_methods) {
            0 => Severity::Low,
            1..=4 => Severity::Medium,
            5..=10 => Severity::High,
            _ => Severity::Critical,
        }
    }

    fn create_violation(&self, class: &ClassFact) -> Violation {
        let message = format!(
            "Class '{}' has {} methods (threshold: {}) and {} instance attributes",
            class.name,
            class.method_count,
            self.thresholds.max_methods,
            class.attribute_names.len()
        );

        Violation::new(
            self.calculate_severity(class.method_count),
            class.location.clone(),
            ViolationDetail::GodObject {
                class: class.name.clone(),
                method_count: class.method_count,
                attribute_count: class.attribute_names.len(),
                threshold: self.thresholds.max_methods,
            },
            message,
            "Split the class along its responsibilities; methods that share \
             attributes are candidates for their own class",
        )
    }
}

impl Default for GodObjectDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for GodObjectDetector {
    fn name(&self) -> &'static str {
        "GodObjectDetector"
    }

    fn description(&self) -> &'static str {
        "Detects classes with too many methods"
    }

    fn kind(&self) -> ViolationKind {
        ViolationKind::GodObject
    }

    fn structure_sensitive(&self) -> bool {
        true
    }

    fn detect(&self, facts: &CollectedFacts) -> Vec<Violation> {
        let violations: Vec<Violation> = facts
            .classes
            .iter()
            .filter(|c| c.method_count > self.thresholds.max_methods)
            .map(|c| self.create_violation(c))
            .collect();

        debug!(
            "GodObjectDetector found {} violations in {}",
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

    fn class_with_methods(n: usize) -> String {
        let mut source = String::from("class Big:\n");
        for i in 0..n {
            source.push_str(&format!("    def m{}(self):\n        pass\n", i));
        }
        source
    }

    fn facts(source: &str) -> CollectedFacts {
        let parsed = parse_source(source).unwrap();
        collect_facts("test.py", source, &parsed)
    }

    #[test]
    fn test_severity_calculation() {
        let detector = GodObjectDetector::new();
        assert_eq!(detector.calculate_severity(21), Severity::Medium);
        assert_eq!(detector.calculate_severity(24), Severity::Medium);
        assert_eq!(detector.calculate_severity(25), Severity::High);
        assert_eq!(detector.calculate_severity(30), Severity::High);
        assert_eq!(detector.calculate_severity(31), Severity::Critical);
    }

    #[test]
    fn test_at_threshold_not_flagged() {
        let detector = GodObjectDetector::new();
        assert!(detector.detect(&facts(&class_with_methods(20))).is_empty());
    }

    #[test]
    fn test_twenty_five_methods_is_high() {
        let detector = GodObjectDetector::new();
        let violations = detector.detect(&facts(&class_with_methods(25)));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::High);
        assert!(violations[0].message.contains("'Big'"));
    }

    #[test]
    fn test_idempotent_over_same_facts() {
        let detector = GodObjectDetector::new();
        let facts = facts(&class_with_methods(32));
        let first = detector.detect(&facts);
        let second = detector.detect(&facts);
        assert_eq!(first, second);
        assert_eq!(first[0].severity, Severity::Critical);
    }

    #[test]
    fn test_nested_functions_are_not_methods() {
        let mut source = class_with_methods(20);
        source.push_str("    def outer(self):\n        def inner():\n            pass\n");
        let facts = facts(&source);
        assert_eq!(facts.classes[0].method_count, 21);
        let violations = GodObjectDetector::new().detect(&facts);
        assert_eq!(violations[0].severity, Severity::Medium);
    }
}
