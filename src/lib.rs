//! Connascence - single-pass coupling analysis for Python
//!
//! Each Python file is parsed once with tree-sitter, walked once to build
//! [`CollectedFacts`], and handed to a set of pure detectors that turn the
//! facts into [`Violation`]s. The [`ViolationAggregator`] merges per-file
//! results into a deterministic [`AnalysisReport`].
//!
//! ```no_run
//! use connascence::{analyze_source, Thresholds};
//!
//! let report = analyze_source("app.py", "def f(a, b, c, d, e):\n    pass\n", &Thresholds::default())?;
//! assert_eq!(report.summary.total, 1);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cache;
pub mod config;
pub mod detectors;
pub mod errors;
pub mod facts;
pub mod logging;
pub mod models;
pub mod parsers;
pub mod pipeline;

pub use config::{load_project_config, ProjectConfig, Thresholds};
pub use detectors::{Detector, DetectorEngine};
pub use errors::{ConfigError, FileError, ParseError};
pub use facts::{collect_facts, CollectedFacts, StructuralFactCollector};
pub use models::{
    AnalysisReport, Severity, SourceLocation, Summary, Violation, ViolationDetail, ViolationKind,
};
pub use parsers::{parse_source, ParsedSource};
pub use pipeline::{
    aggregate, analyze_project, analyze_source, BatchAnalyzer, BatchOutcome, CancellationToken,
    FileAnalyzer, ViolationAggregator,
};
