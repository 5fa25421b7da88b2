//! Magic literal detector (connascence of meaning)
//!
//! Flags numeric and string literals whose meaning lives only in the
//! author's head. Literals that drive control flow are the riskiest and
//! are reported at High severity.
//!
//! Not flagged:
//! - numbers in the allow-list (default `0`, `1`, `-1`)
//! - strings shorter than two characters
//! - the right-hand side of a module-level `NAME = <literal>` binding
//! - docstrings and f-strings (never collected)

use crate::config::DEFAULT_ALLOWLIST;
use crate::detectors::base::Detector;
use crate::facts::{CollectedFacts, LiteralFact};
use crate::models::{LiteralValue, Severity, Violation, ViolationDetail, ViolationKind};
use tracing::debug;

/// Thresholds for magic literal detection
#[derive(Debug, Clone)]
pub struct MagicLiteralThresholds {
    /// Numbers that are never magic
    pub allowlist: Vec<f64>,
    /// Strings shorter than this are ignored
    pub min_string_length: usize,
}

impl Default for MagicLiteralThresholds {
    fn default() -> Self {
        Self {
            allowlist: DEFAULT_ALLOWLIST.to_vec(),
            min_string_length: 2,
        }
    }
}

pub struct MagicLiteralDetector {
    thresholds: MagicLiteralThresholds,
}

impl MagicLiteralDetector {
    pub fn new() -> Self {
        Self::with_thresholds(MagicLiteralThresholds::default())
    }

    pub fn with_thresholds(thresholds: MagicLiteralThresholds) -> Self {
        Self { thresholds }
    }

    fn is_candidate(&self, literal: &LiteralFact) -> bool {
        if literal.is_named_constant {
            return false;
        }
        match &literal.value {
            LiteralValue::Str(s) => s.chars().count() >= self.thresholds.min_string_length,
            value => value
                .as_f64()
                .is_some_and(|v| !self.thresholds.allowlist.contains(&v)),
        }
    }

    fn create_violation(&self, literal: &LiteralFact) -> Violation {
        let what = if literal.value.is_numeric() {
            "number"
        } else {
            "string"
        };
        let place = match &literal.enclosing_function {
            Some(func) => format!(" in '{}'", func),
            None => " at module level".to_string(),
        };
        let (severity, message) = if literal.in_conditional {
            (
                Severity::High,
                format!("Magic {} {} drives a condition{}", what, literal.value, place),
            )
        } else {
            (
                Severity::Medium,
                format!("Magic {} {}{}", what, literal.value, place),
            )
        };

        Violation::new(
            severity,
            literal.location.clone(),
            ViolationDetail::MagicLiteral {
                value: literal.value.clone(),
                enclosing_function: literal.enclosing_function.clone(),
                in_conditional: literal.in_conditional,
            },
            message,
            "Replace the literal with a named module-level constant or an enum member",
        )
    }
}

impl Default for MagicLiteralDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for MagicLiteralDetector {
    fn name(&self) -> &'static str {
        "MagicLiteralDetector"
    }

    fn description(&self) -> &'static str {
        "Detects unexplained numeric and string literals"
    }

    fn kind(&self) -> ViolationKind {
        ViolationKind::MagicLiteral
    }

    fn detect(&self, facts: &CollectedFacts) -> Vec<Violation> {
        let violations: Vec<Violation> = facts
            .literals
            .iter()
            .filter(|l| self.is_candidate(l))
            .map(|l| self.create_violation(l))
            .collect();

        debug!(
            "MagicLiteralDetector found {} violations in {}",
            violations.len(),
            facts.file
        );
        violations
    }
}
