//! Timing coupling detector (connascence of timing)
//!
//! Calls to sleep- and wait-style primitives usually mean correctness
//! depends on wall-clock ordering between components. This is a name-based
//! heuristic over call sites, not a data-flow analysis: a callee matches
//! when either its full dotted name or its last segment is a configured
//! primitive (`time.sleep` matches `sleep`).

use crate::config::DEFAULT_TIMING_PRIMITIVES;
use crate::detectors::base::Detector;
use crate::facts::{CallSiteFact, CollectedFacts};
use crate::models::{Severity, Violation, ViolationDetail, ViolationKind};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TimingCouplingThresholds {
    /// Callee names treated as timing primitives
    pub primitives: Vec<String>,
}

impl Default for TimingCouplingThresholds {
    fn default() -> Self {
        Self {
            primitives: DEFAULT_TIMING_PRIMITIVES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

pub struct TimingCouplingDetector {
    thresholds: TimingCouplingThresholds,
}

impl TimingCouplingDetector {
    pub fn new() -> Self {
        Self::with_thresholds(TimingCouplingThresholds::default())
    }

    pub fn with_thresholds(thresholds: TimingCouplingThresholds) -> Self {
        Self { thresholds }
    }

    fn matches(&self, call: &CallSiteFact) -> bool {
        let short = call.short_name();
        self.thresholds
            .primitives
            .iter()
            .any(|p| p == &call.callee_name || p == short)
    }

    fn create_violation(&self, call: &CallSiteFact) -> Violation {
        let place = match &call.enclosing_function {
            Some(func) => format!(" in '{}'", func),
            None => String::new(),
        };
        Violation::new(
            Severity::Medium,
            call.location.clone(),
            ViolationDetail::TimingCoupling {
                callee: call.callee_name.clone(),
                argument_count: call.argument_count,
                enclosing_function: call.enclosing_function.clone(),
            },
            format!(
                "Call to '{}'{} makes correctness depend on timing",
                call.callee_name, place
            ),
            "Wait on an explicit event, condition or future instead of elapsed time",
        )
    }
}

impl Default for TimingCouplingDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for TimingCouplingDetector {
    fn name(&self) -> &'static str {
        "TimingCouplingDetector"
    }

    fn description(&self) -> &'static str {
        "Detects sleep/wait calls that couple components through timing"
    }

    fn kind(&self) -> ViolationKind {
        ViolationKind::TimingCoupling
    }

    fn detect(&self, facts: &CollectedFacts) -> Vec<Violation> {
        let violations: Vec<Violation> = facts
            .call_sites
            .iter()
            .filter(|c| self.matches(c))
            .map(|c| self.create_violation(c))
            .collect();

        debug!(
            "TimingCouplingDetector found {} violations in {}",
            violations.len(),
            facts.file
        );
        violations
    }
}
