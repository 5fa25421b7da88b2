//! Core data models for connascence analysis
//!
//! These models describe where a violation sits, how bad it is, and what
//! kind of coupling it represents. They are produced by detectors, merged
//! by the aggregator, and handed to whatever renders the final report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A position inside one source file.
///
/// `line` is 1-based, `column` is a 0-based byte offset into that line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Severity levels for violations
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// The coupling family a violation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    ParameterCoupling,
    MagicLiteral,
    GodObject,
    AlgorithmDuplication,
    TimingCoupling,
    GlobalCoupling,
}

impl ViolationKind {
    pub const ALL: [ViolationKind; 6] = [
        ViolationKind::ParameterCoupling,
        ViolationKind::MagicLiteral,
        ViolationKind::GodObject,
        ViolationKind::AlgorithmDuplication,
        ViolationKind::TimingCoupling,
        ViolationKind::GlobalCoupling,
    ];

    /// Stable kebab-case name, also used as the detector-kind sort key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::ParameterCoupling => "parameter-coupling",
            ViolationKind::MagicLiteral => "magic-literal",
            ViolationKind::GodObject => "god-object",
            ViolationKind::AlgorithmDuplication => "algorithm-duplication",
            ViolationKind::TimingCoupling => "timing-coupling",
            ViolationKind::GlobalCoupling => "global-coupling",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a literal constant found in source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl LiteralValue {
    /// Numeric value, if this literal is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            LiteralValue::Int(v) => Some(*v as f64),
            LiteralValue::Float(v) => Some(*v),
            LiteralValue::Str(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, LiteralValue::Str(_))
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Int(v) => write!(f, "{}", v),
            LiteralValue::Float(v) => write!(f, "{}", v),
            LiteralValue::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// A function referenced from a violation (name plus where it is defined)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRef {
    pub name: String,
    pub location: SourceLocation,
}

/// Kind-specific payload of a violation.
///
/// Each variant carries only what its detector knows, so a magic literal
/// never has a parameter count and a god object never has a callee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ViolationDetail {
    ParameterCoupling {
        function: String,
        parameter_count: usize,
        threshold: usize,
    },
    MagicLiteral {
        value: LiteralValue,
        enclosing_function: Option<String>,
        in_conditional: bool,
    },
    GodObject {
        class: String,
        method_count: usize,
        attribute_count: usize,
        threshold: usize,
    },
    AlgorithmDuplication {
        function: String,
        original: FunctionRef,
        /// Every occurrence after the original, including `function` itself
        duplicates: Vec<FunctionRef>,
        control_flow_nodes: usize,
        signature: String,
    },
    TimingCoupling {
        callee: String,
        argument_count: usize,
        enclosing_function: Option<String>,
    },
    GlobalCoupling {
        names: Vec<String>,
        threshold: usize,
    },
}

impl ViolationDetail {
    pub fn kind(&self) -> ViolationKind {
        match self {
            ViolationDetail::ParameterCoupling { .. } => ViolationKind::ParameterCoupling,
            ViolationDetail::MagicLiteral { .. } => ViolationKind::MagicLiteral,
            ViolationDetail::GodObject { .. } => ViolationKind::GodObject,
            ViolationDetail::AlgorithmDuplication { .. } => ViolationKind::AlgorithmDuplication,
            ViolationDetail::TimingCoupling { .. } => ViolationKind::TimingCoupling,
            ViolationDetail::GlobalCoupling { .. } => ViolationKind::GlobalCoupling,
        }
    }
}

/// A single coupling violation produced by a detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub severity: Severity,
    pub location: SourceLocation,
    pub message: String,
    pub recommendation: String,
    pub detail: ViolationDetail,
    /// Set when the file only parsed partially and the detector depends on
    /// complete structure
    #[serde(default)]
    pub low_confidence: bool,
    /// Source lines around `location`, attached by the file pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl Violation {
    pub fn new(
        severity: Severity,
        location: SourceLocation,
        detail: ViolationDetail,
        message: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            location,
            message: message.into(),
            recommendation: recommendation.into(),
            detail,
            low_confidence: false,
            snippet: None,
        }
    }

    pub fn kind(&self) -> ViolationKind {
        self.detail.kind()
    }

    /// Identity used for deduplication: kind, location and a hash of the message.
    pub fn identity(&self) -> (ViolationKind, &SourceLocation, u64) {
        (
            self.kind(),
            &self.location,
            xxhash_rust::xxh3::xxh3_64(self.message.as_bytes()),
        )
    }

    /// Stable 16-character hex id derived from the identity key.
    ///
    /// xxh3 is used rather than `DefaultHasher`, whose output is not stable
    /// across Rust versions.
    pub fn fingerprint(&self) -> String {
        let input = format!(
            "{}\n{}\n{}\n{}\n{}",
            self.kind(),
            self.location.file,
            self.location.line,
            self.location.column,
            self.message
        );
        format!("{:016x}", xxhash_rust::xxh3::xxh3_64(input.as_bytes()))
    }
}

/// A violation as it appears in the final report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedViolation {
    /// 1-based ordinal, deterministic for a given input
    pub id: usize,
    pub fingerprint: String,
    #[serde(flatten)]
    pub violation: Violation,
}

/// Violation counts by severity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub by_severity: BTreeMap<Severity, usize>,
}

impl Default for Summary {
    fn default() -> Self {
        Self {
            total: 0,
            by_severity: Severity::ALL.iter().map(|s| (*s, 0)).collect(),
        }
    }
}

impl Summary {
    pub fn from_violations<'a>(violations: impl IntoIterator<Item = &'a Violation>) -> Self {
        let mut summary = Self::default();
        for v in violations {
            summary.total += 1;
            *summary.by_severity.entry(v.severity).or_insert(0) += 1;
        }
        summary
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }
}

/// Per-file statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub path: String,
    pub functions: usize,
    pub classes: usize,
    pub violations: usize,
    pub partial: bool,
}

/// Why a file contributed nothing to the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    Io,
    Parse,
    Timeout,
    Cancelled,
    Panicked,
}

/// A file that was enumerated but not analyzed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: SkipReason,
    pub message: String,
}

/// Final output of an analysis run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub violations: Vec<ReportedViolation>,
    pub summary: Summary,
    #[serde(default)]
    pub files: Vec<FileSummary>,
    #[serde(default)]
    pub skipped: Vec<SkippedFile>,
}

impl AnalysisReport {
    /// Violations of one kind, in report order
    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &ReportedViolation> {
        self.violations
            .iter()
            .filter(move |v| v.violation.kind() == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn magic(line: u32, message: &str) -> Violation {
        Violation::new(
            Severity::Medium,
            SourceLocation::new("a.py", line, 4),
            ViolationDetail::MagicLiteral {
                value: LiteralValue::Int(42),
                enclosing_function: None,
                in_conditional: false,
            },
            message,
            "Extract a named constant",
        )
    }

    #[test]
    fn test_fingerprint_is_stable_and_hex() {
        let v = magic(3, "Magic literal 42");
        let fp = v.fingerprint();
        assert_eq!(fp.len(), 16);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fp, magic(3, "Magic literal 42").fingerprint());
        assert_ne!(fp, magic(4, "Magic literal 42").fingerprint());
    }

    #[test]
    fn test_identity_ignores_recommendation() {
        let a = magic(3, "Magic literal 42");
        let mut b = magic(3, "Magic literal 42");
        b.recommendation = "something else".to_string();
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_summary_has_every_severity() {
        let summary = Summary::from_violations(&[magic(1, "x")]);
        assert_eq!(summary.total, 1);
        assert_eq!(summary.by_severity.len(), 4);
        assert_eq!(summary.count(Severity::Medium), 1);
        assert_eq!(summary.count(Severity::Critical), 0);
    }

    #[test]
    fn test_kind_serializes_kebab_case() {
        let json = serde_json::to_value(magic(1, "x")).expect("serialize");
        assert_eq!(json["detail"]["kind"], "magic-literal");
        assert_eq!(json["severity"], "medium");
    }

    #[test]
    fn test_literal_display() {
        assert_eq!(LiteralValue::Int(-1).to_string(), "-1");
        assert_eq!(LiteralValue::Str("abc".into()).to_string(), "\"abc\"");
        assert_eq!(LiteralValue::Float(2.5).as_f64(), Some(2.5));
    }
}
