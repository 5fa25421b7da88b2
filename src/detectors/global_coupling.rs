//! Global coupling detector (connascence of identity)
//!
//! Every name a function declares `global` is shared mutable state that
//! other functions in the module must agree on. When a file declares more
//! distinct globals than the threshold, one violation is emitted at the
//! first `global` statement.

use crate::detectors::base::Detector;
use crate::facts::CollectedFacts;
use crate::models::{Severity, Violation, ViolationDetail, ViolationKind};
use rustc_hash::FxHashSet;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct GlobalCouplingThresholds {
    /// Distinct `global` names above this count are flagged
    pub max_global_declarations: usize,
}

impl Default for GlobalCouplingThresholds {
    fn default() -> Self {
        Self {
            max_global_declarations: 5,
        }
    }
}

pub struct GlobalCouplingDetector {
    thresholds: GlobalCouplingThresholds,
}

impl GlobalCouplingDetector {
    pub fn new() -> Self {
        Self::with_thresholds(GlobalCouplingThresholds::default())
    }

    pub fn with_thresholds(thresholds: GlobalCouplingThresholds) -> Self {
        Self { thresholds }
    }
}

impl Default for GlobalCouplingDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for GlobalCouplingDetector {
    fn name(&self) -> &'static str {
        "GlobalCouplingDetector"
    }

    fn description(&self) -> &'static str {
        "Detects modules that share state through many global declarations"
    }

    fn kind(&self) -> ViolationKind {
        ViolationKind::GlobalCoupling
    }

    fn detect(&self, facts: &CollectedFacts) -> Vec<Violation> {
        let Some(first) = facts.global_declarations.first() else {
            return Vec::new();
        };

        let mut seen = FxHashSet::default();
        let names: Vec<String> = facts
            .global_declarations
            .iter()
            .filter(|d| seen.insert(d.name.as_str()))
            .map(|d| d.name.clone())
            .collect();

        if names.len() <= self.thresholds.max_global_declarations {
            return Vec::new();
        }

        debug!(
            "GlobalCouplingDetector: {} global names in {}",
            names.len(),
            facts.file
        );

        let message = format!(
            "{} names are shared through `global` statements (threshold: {}): {}",
            names.len(),
            self.thresholds.max_global_declarations,
            names.join(", ")
        );
        vec![Violation::new(
            Severity::High,
            first.location.clone(),
            ViolationDetail::GlobalCoupling {
                names,
                threshold: self.thresholds.max_global_declarations,
            },
            message,
            "Move the shared state into an object passed explicitly to the functions that need it",
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::collect_facts;
    use crate::parsers::parse_source;

    fn run(source: &str) -> Vec<Violation> {
        let parsed = parse_source(source).unwrap();
        GlobalCouplingDetector::new().detect(&collect_facts("test.py", source, &parsed))
    }

    #[test]
    fn test_few_globals_ok() {
        let source = "def f():\n    global a, b\n\ndef g():\n    global a, c\n";
        assert!(run(source).is_empty());
    }

    #[test]
    fn test_many_distinct_globals_flagged_once() {
        let source = r#"
def load():
    global cfg, db, cache
    cfg = db = cache = None

def reset():
    global cfg, session, token, retries
    cfg = None
"#;
        let violations = run(source);
        assert_eq!(violations.len(), 1);
        let v = &violations[0];
        assert_eq!(v.severity, Severity::High);
        assert_eq!((v.location.line, v.location.column), (3, 4));
        match &v.detail {
            ViolationDetail::GlobalCoupling { names, threshold } => {
                assert_eq!(names.len(), 6);
                assert_eq!(names[0], "cfg");
                assert_eq!(*threshold, 5);
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }
}
