//! Analysis pipeline
//!
//! Orchestrates the full analysis:
//! 1. Discover Python files (`files`)
//! 2. Per file: parse, collect facts, run detectors, attach snippets (`file`)
//! 3. Fan files out over a worker pool (`batch`)
//! 4. Merge, deduplicate and number the violations (`aggregator`)

mod aggregator;
mod batch;
mod file;
mod files;
mod snippet;

pub use aggregator::{aggregate, ViolationAggregator};
pub use batch::{
    default_workers, BatchAnalyzer, BatchOutcome, BatchStats, CancellationToken,
    MAX_DEFAULT_WORKERS,
};
pub use file::{FileAnalysis, FileAnalyzer};
pub use files::{discover_python_files, IGNORE_FILE_NAME};
pub use snippet::{extract_snippet, SNIPPET_CONTEXT_LINES};

use crate::config::{load_project_config, Thresholds};
use crate::models::AnalysisReport;
use anyhow::Result;
use std::path::Path;

/// Analyze a single source string into a report.
///
/// A parse failure is returned as an error rather than a skipped entry.
pub fn analyze_source(path: &str, source: &str, thresholds: &Thresholds) -> Result<AnalysisReport> {
    let analysis = FileAnalyzer::new(thresholds)?.analyze_source(path, source)?;
    let mut aggregator = ViolationAggregator::new();
    aggregator.add_file(0, analysis.summary, analysis.violations);
    Ok(aggregator.finish())
}

/// Analyze a project directory using its `connascence.toml` /
/// `.connascencerc.json` (defaults when absent)
pub fn analyze_project(root: &Path) -> Result<BatchOutcome> {
    let config = load_project_config(root);
    BatchAnalyzer::from_config(&config)?.analyze_directory(root, &config.exclude)
}
