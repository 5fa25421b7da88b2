//! Violation aggregation
//!
//! The aggregator is the single merge point of a run. Files may arrive in
//! any order (batch workers finish whenever they finish); each is tagged
//! with its input index, and `finish` orders everything by that index, so
//! the report is byte-identical across runs for the same input.
//!
//! Ordering within the report: input file order, then line, then detector
//! kind (alphabetical), then column, then message. Violations with the same
//! identity `(kind, location, message hash)` are reported once.

use crate::models::{
    AnalysisReport, FileSummary, ReportedViolation, SkippedFile, Summary, Violation,
};
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use tracing::debug;

enum FileEntry {
    Analyzed {
        summary: Option<FileSummary>,
        violations: Vec<Violation>,
    },
    Skipped(SkippedFile),
}

/// Collects per-file results and builds the final report
#[derive(Default)]
pub struct ViolationAggregator {
    entries: BTreeMap<usize, Vec<FileEntry>>,
}

impl ViolationAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the violations of the file at input position `index`
    pub fn add_violations(&mut self, index: usize, violations: Vec<Violation>) {
        self.entries
            .entry(index)
            .or_default()
            .push(FileEntry::Analyzed {
                summary: None,
                violations,
            });
    }

    /// Add an analyzed file with its statistics
    pub fn add_file(&mut self, index: usize, summary: FileSummary, violations: Vec<Violation>) {
        self.entries
            .entry(index)
            .or_default()
            .push(FileEntry::Analyzed {
                summary: Some(summary),
                violations,
            });
    }

    /// Record a file that contributed nothing
    pub fn add_skipped(&mut self, index: usize, skipped: SkippedFile) {
        self.entries
            .entry(index)
            .or_default()
            .push(FileEntry::Skipped(skipped));
    }

    /// Deduplicate, order, number and summarize
    pub fn finish(self) -> AnalysisReport {
        let mut keyed: Vec<(usize, Violation)> = Vec::new();
        let mut files = Vec::new();
        let mut skipped = Vec::new();

        for (index, entries) in self.entries {
            for entry in entries {
                match entry {
                    FileEntry::Analyzed {
                        summary,
                        violations,
                    } => {
                        files.extend(summary);
                        keyed.extend(violations.into_iter().map(|v| (index, v)));
                    }
                    FileEntry::Skipped(s) => skipped.push(s),
                }
            }
        }

        // stable: equal keys keep input order, so the first occurrence survives dedup
        keyed.sort_by(|(ia, a), (ib, b)| {
            ia.cmp(ib)
                .then(a.location.line.cmp(&b.location.line))
                .then(a.kind().as_str().cmp(b.kind().as_str()))
                .then(a.location.column.cmp(&b.location.column))
                .then(a.message.cmp(&b.message))
        });

        let before = keyed.len();
        let mut seen = FxHashSet::default();
        let mut violations = Vec::with_capacity(before);
        for (_, violation) in keyed {
            let (kind, location, message_hash) = violation.identity();
            if !seen.insert((kind, location.clone(), message_hash)) {
                continue;
            }
            violations.push(ReportedViolation {
                id: violations.len() + 1,
                fingerprint: violation.fingerprint(),
                violation,
            });
        }

        if violations.len() < before {
            debug!("Dropped {} duplicate violations", before - violations.len());
        }

        let summary = Summary::from_violations(violations.iter().map(|r| &r.violation));
        AnalysisReport {
            violations,
            summary,
            files,
            skipped,
        }
    }
}

/// Merge per-file violation lists (in file order) into one report
pub fn aggregate(per_file_results: Vec<Vec<Violation>>) -> AnalysisReport {
    let mut aggregator = ViolationAggregator::new();
    for (index, violations) in per_file_results.into_iter().enumerate() {
        aggregator.add_violations(index, violations);
    }
    aggregator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LiteralValue, Severity, SkipReason, SourceLocation, ViolationDetail};

    fn magic(file: &str, line: u32, column: u32, severity: Severity) -> Violation {
        Violation::new(
            severity,
            SourceLocation::new(file, line, column),
            ViolationDetail::MagicLiteral {
                value: LiteralValue::Int(7),
                enclosing_function: None,
                in_conditional: severity == Severity::High,
            },
            format!("Magic number 7 at {}", line),
            "name it",
        )
    }

    fn params(file: &str, line: u32) -> Violation {
        Violation::new(
            Severity::Medium,
            SourceLocation::new(file, line, 0),
            ViolationDetail::ParameterCoupling {
                function: "f".into(),
                parameter_count: 5,
                threshold: 4,
            },
            "Function 'f' has 5 parameters (threshold: 4)",
            "group them",
        )
    }

    #[test]
    fn test_orders_by_file_line_kind() {
        let report = aggregate(vec![
            vec![params("b.py", 3), magic("b.py", 3, 8, Severity::High)],
            vec![magic("a.py", 9, 0, Severity::Medium), magic("a.py", 1, 0, Severity::Medium)],
        ]);

        let order: Vec<(&str, u32, &str)> = report
            .violations
            .iter()
            .map(|r| {
                (
                    r.violation.location.file.as_str(),
                    r.violation.location.line,
                    r.violation.kind().as_str(),
                )
            })
            .collect();
        // file order is input order, not path order
        assert_eq!(
            order,
            vec![
                ("b.py", 3, "magic-literal"),
                ("b.py", 3, "parameter-coupling"),
                ("a.py", 1, "magic-literal"),
                ("a.py", 9, "magic-literal"),
            ]
        );
        let ids: Vec<usize> = report.violations.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_deduplicates_by_identity() {
        let report = aggregate(vec![vec![
            magic("a.py", 2, 4, Severity::Medium),
            magic("a.py", 2, 4, Severity::Medium),
            magic("a.py", 2, 5, Severity::Medium),
        ]]);
        assert_eq!(report.summary.total, 2);
        assert_eq!(report.violations.len(), 2);
    }

    #[test]
    fn test_summary_counts_by_severity() {
        let report = aggregate(vec![vec![
            magic("a.py", 1, 0, Severity::High),
            magic("a.py", 2, 0, Severity::High),
            params("a.py", 3),
        ]]);
        assert_eq!(report.summary.total, 3);
        assert_eq!(report.summary.count(Severity::High), 2);
        assert_eq!(report.summary.count(Severity::Medium), 1);
        assert_eq!(report.summary.count(Severity::Low), 0);
    }

    #[test]
    fn test_arrival_order_does_not_matter() {
        let build = |order: &[usize]| {
            let inputs = [
                vec![magic("a.py", 1, 0, Severity::Medium)],
                vec![params("b.py", 2)],
                vec![magic("c.py", 5, 1, Severity::High)],
            ];
            let mut aggregator = ViolationAggregator::new();
            for &i in order {
                aggregator.add_violations(i, inputs[i].clone());
            }
            serde_json::to_string(&aggregator.finish()).unwrap()
        };
        assert_eq!(build(&[0, 1, 2]), build(&[2, 0, 1]));
    }

    #[test]
    fn test_skipped_and_file_summaries() {
        let mut aggregator = ViolationAggregator::new();
        aggregator.add_skipped(
            1,
            SkippedFile {
                path: "bad.py".into(),
                reason: SkipReason::Parse,
                message: "unrecoverable".into(),
            },
        );
        aggregator.add_file(
            0,
            FileSummary {
                path: "good.py".into(),
                functions: 1,
                classes: 0,
                violations: 1,
                partial: false,
            },
            vec![params("good.py", 1)],
        );
        let report = aggregator.finish();
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::Parse);
        assert_eq!(report.summary.total, 1);
    }
}
