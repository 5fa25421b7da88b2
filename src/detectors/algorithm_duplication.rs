//! Algorithm duplication detector (connascence of algorithm)
//!
//! Functions whose bodies share a control-flow shape implement the same
//! algorithm under different names. The shape ignores identifiers and
//! literal values, so renaming variables does not hide a duplicate.
//!
//! One violation is emitted per group, located at the second occurrence.
//! The first occurrence is the "original"; every later occurrence is listed
//! in the violation detail.

use crate::detectors::base::Detector;
use crate::facts::{CollectedFacts, SignatureGroup, SignatureMember};
use crate::models::{FunctionRef, Severity, Violation, ViolationDetail, ViolationKind};
use tracing::debug;

/// Thresholds for algorithm duplication detection
#[derive(Debug, Clone)]
pub struct AlgorithmDuplicationThresholds {
    /// Shapes with fewer control-flow statements are too trivial to report
    pub min_control_flow_nodes: usize,
}

impl Default for AlgorithmDuplicationThresholds {
    fn default() -> Self {
        Self {
            min_control_flow_nodes: 3,
        }
    }
}

pub struct AlgorithmDuplicationDetector {
    thresholds: AlgorithmDuplicationThresholds,
}

impl AlgorithmDuplicationDetector {
    pub fn new() -> Self {
        Self::with_thresholds(AlgorithmDuplicationThresholds::default())
    }

    pub fn with_thresholds(thresholds: AlgorithmDuplicationThresholds) -> Self {
        Self { thresholds }
    }

    fn function_ref(member: &SignatureMember) -> FunctionRef {
        FunctionRef {
            name: member.function_name.clone(),
            location: member.location.clone(),
        }
    }

    fn create_violation(&self, hash: u64, group: &SignatureGroup) -> Option<Violation> {
        let original = group.members.first()?;
        let second = group.members.get(1)?;
        let duplicates: Vec<FunctionRef> =
            group.members[1..].iter().map(Self::function_ref).collect();

        let message = format!(
            "Function '{}' repeats the control flow of '{}' ({} implementations, {} control-flow statements)",
            second.function_name,
            original.function_name,
            group.members.len(),
            group.control_flow_nodes
        );

        Some(Violation::new(
            Severity::Medium,
            second.location.clone(),
            ViolationDetail::AlgorithmDuplication {
                function: second.function_name.clone(),
                original: Self::function_ref(original),
                duplicates,
                control_flow_nodes: group.control_flow_nodes,
                signature: format!("{:016x}", hash),
            },
            message,
            "Extract the shared algorithm into one function and parameterize the differences",
        ))
    }
}

impl Default for AlgorithmDuplicationDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for AlgorithmDuplicationDetector {
    fn name(&self) -> &'static str {
        "AlgorithmDuplicationDetector"
    }

    fn description(&self) -> &'static str {
        "Detects functions that share the same control-flow structure"
    }

    fn kind(&self) -> ViolationKind {
        ViolationKind::AlgorithmDuplication
    }

    fn structure_sensitive(&self) -> bool {
        true
    }

    fn detect(&self, facts: &CollectedFacts) -> Vec<Violation> {
        let mut groups: Vec<(&u64, &SignatureGroup)> = facts
            .algorithm_signatures
            .iter()
            .filter(|(_, g)| {
                g.members.len() > 1
                    && g.control_flow_nodes >= self.thresholds.min_control_flow_nodes
            })
            .collect();
        // source order of the reported (second) occurrence
        groups.sort_by_key(|(_, g)| g.members[1].function_index);

        let violations: Vec<Violation> = groups
            .into_iter()
            .filter_map(|(hash, group)| self.create_violation(*hash, group))
            .collect();

        debug!(
            "AlgorithmDuplicationDetector found {} violations in {}",
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

    fn run(source: &str) -> Vec<Violation> {
        let parsed = parse_source(source).unwrap();
        AlgorithmDuplicationDetector::new().detect(&collect_facts("test.py", source, &parsed))
    }

    const ORIGINAL: &str = r#"
def total_valid(orders):
    total = 0
    for order in orders:
        if order.valid:
            while order.pending:
                order.settle()
    return total
"#;

    #[test]
    fn test_same_shape_different_names() {
        let source = format!(
            "{}{}",
            ORIGINAL,
            r#"
def count_ready(jobs):
    n = 7
    for job in jobs:
        if job.ready and n > 3:
            while job.queued:
                job.pop("head")
    return n
"#
        );
        let violations = run(&source);
        assert_eq!(violations.len(), 1);
        let v = &violations[0];
        assert_eq!(v.severity, Severity::Medium);
        assert_eq!(v.location.line, 10);
        match &v.detail {
            ViolationDetail::AlgorithmDuplication {
                function,
                original,
                duplicates,
                control_flow_nodes,
                ..
            } => {
                assert_eq!(function, "count_ready");
                assert_eq!(original.name, "total_valid");
                assert_eq!(duplicates.len(), 1);
                assert_eq!(*control_flow_nodes, 3);
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_extra_nested_if_breaks_match() {
        let source = format!(
            "{}{}",
            ORIGINAL,
            r#"
def count_ready(jobs):
    for job in jobs:
        if job.ready:
            while job.queued:
                if job.blocked:
                    job.pop()
    return jobs
"#
        );
        assert!(run(&source).is_empty());
    }

    #[test]
    fn test_nested_context_managers_are_not_an_algorithm() {
        let source = r#"
def copy_config(src, dst):
    with open(src) as a:
        with open(dst, "w") as b:
            with lock:
                b.write(a.read())

def copy_schema(left, right):
    with open(left) as x:
        with open(right, "w") as y:
            with guard:
                y.write(x.read())
"#;
        assert!(run(source).is_empty());

        let parsed = parse_source(source).unwrap();
        let facts = collect_facts("test.py", source, &parsed);
        let copy = facts.function("copy_config").unwrap();
        assert_eq!(copy.nesting_depth, 0);
        assert_eq!(copy.control_flow_nodes, 0);
    }

    #[test]
    fn test_trivial_shapes_ignored() {
        let source = r#"
def a(x):
    if x:
        return x

def b(y):
    if y:
        return y
"#;
        assert!(run(source).is_empty());
    }

    #[test]
    fn test_three_copies_one_violation() {
        let third = ORIGINAL.replace("total_valid", "third_copy");
        let second = ORIGINAL.replace("total_valid", "second_copy");
        let source = format!("{}{}{}", ORIGINAL, second, third);
        let violations = run(&source);
        assert_eq!(violations.len(), 1);
        match &violations[0].detail {
            ViolationDetail::AlgorithmDuplication { duplicates, .. } => {
                let names: Vec<_> = duplicates.iter().map(|d| d.name.as_str()).collect();
                assert_eq!(names, vec!["second_copy", "third_copy"]);
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }
}
