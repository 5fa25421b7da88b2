//! Per-file analysis
//!
//! One file goes Parse → Collect → Detect → snippets. Every phase is
//! synchronous and owns its data; the only shared state is the read-only
//! `DetectorEngine`, so a `FileAnalyzer` can be borrowed by any number of
//! worker threads at once.

use crate::config::{ProjectConfig, Thresholds};
use crate::detectors::{DetectionSummary, DetectorEngine};
use crate::errors::{ConfigResult, FileError, ParseError};
use crate::facts::{collect_facts, CollectedFacts};
use crate::models::{FileSummary, Violation};
use crate::parsers::{parse_bytes, parse_source, ParsedSource};
use crate::pipeline::snippet::{extract_snippet, SNIPPET_CONTEXT_LINES};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Result of analyzing one file
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub summary: FileSummary,
    pub violations: Vec<Violation>,
    pub detection: DetectionSummary,
}

/// Runs the full per-file pipeline with one set of detectors
#[derive(Clone)]
pub struct FileAnalyzer {
    engine: DetectorEngine,
    snippets: bool,
    budget: Option<Duration>,
}

impl FileAnalyzer {
    /// All built-in detectors with `thresholds`, snippets on, no time budget.
    ///
    /// Fails if any threshold is non-positive.
    pub fn new(thresholds: &Thresholds) -> ConfigResult<Self> {
        Ok(Self::with_engine(DetectorEngine::from_thresholds(thresholds)?))
    }

    pub fn with_engine(engine: DetectorEngine) -> Self {
        Self {
            engine,
            snippets: true,
            budget: None,
        }
    }

    /// Thresholds, disabled detectors, detector parallelism and time budget
    /// from a project configuration
    pub fn from_config(config: &ProjectConfig) -> ConfigResult<Self> {
        let thresholds = config.thresholds()?;
        let engine = DetectorEngine::from_thresholds(&thresholds)?
            .without(&config.disabled_detectors())
            .with_parallel(config.analysis.parallel_detectors);

        let mut analyzer = Self::with_engine(engine);
        if let Some(ms) = config.analysis.file_timeout_ms {
            analyzer = analyzer.with_time_budget(Duration::from_millis(ms));
        }
        Ok(analyzer)
    }

    /// Attach source snippets to violations (default: on)
    pub fn with_snippets(mut self, snippets: bool) -> Self {
        self.snippets = snippets;
        self
    }

    /// Give up on a file once a phase finishes past `budget`
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn engine(&self) -> &DetectorEngine {
        &self.engine
    }

    /// Analyze raw file bytes (binary and non-UTF-8 content is rejected)
    pub fn analyze_bytes(&self, path: &str, bytes: &[u8]) -> Result<FileAnalysis, FileError> {
        let deadline = Deadline::start(self.budget);
        let parsed = parse_bytes(bytes).map_err(|e| parse_failure(path, e))?;
        deadline.check(path, "parse")?;
        // parse_bytes already validated the encoding
        let source = String::from_utf8_lossy(bytes);
        self.analyze_with_deadline(path, &source, &parsed, &deadline)
    }

    /// Analyze source text
    pub fn analyze_source(&self, path: &str, source: &str) -> Result<FileAnalysis, FileError> {
        let deadline = Deadline::start(self.budget);
        let parsed = parse_source(source).map_err(|e| parse_failure(path, e))?;
        deadline.check(path, "parse")?;
        self.analyze_with_deadline(path, source, &parsed, &deadline)
    }

    /// Analyze an already parsed tree; no time budget applies
    pub fn analyze_parsed(&self, path: &str, source: &str, parsed: &ParsedSource) -> FileAnalysis {
        let facts = collect_facts(path, source, parsed);
        self.detect(path, source, facts)
    }

    fn analyze_with_deadline(
        &self,
        path: &str,
        source: &str,
        parsed: &ParsedSource,
        deadline: &Deadline,
    ) -> Result<FileAnalysis, FileError> {
        let facts = collect_facts(path, source, parsed);
        deadline.check(path, "collect")?;
        let analysis = self.detect(path, source, facts);
        deadline.check(path, "detect")?;
        Ok(analysis)
    }

    fn detect(&self, path: &str, source: &str, facts: CollectedFacts) -> FileAnalysis {
        if facts.partial {
            warn!(
                "Partial parse of {}: structural findings marked low-confidence",
                path
            );
        }

        let (mut violations, detection) = self.engine.detect(&facts);
        if self.snippets {
            for violation in &mut violations {
                violation.snippet =
                    extract_snippet(source, violation.location.line, SNIPPET_CONTEXT_LINES);
            }
        }

        debug!(
            "{}: {} functions, {} classes, {} violations ({} nodes)",
            path,
            facts.functions.len(),
            facts.classes.len(),
            violations.len(),
            facts.nodes_visited
        );

        FileAnalysis {
            summary: FileSummary {
                path: path.to_string(),
                functions: facts.functions.len(),
                classes: facts.classes.len(),
                violations: violations.len(),
                partial: facts.partial,
            },
            violations,
            detection,
        }
    }
}

fn parse_failure(path: &str, source: ParseError) -> FileError {
    FileError::Parse {
        path: path.to_string(),
        source,
    }
}

/// Per-file time budget, checked between phases
struct Deadline {
    start: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    fn start(budget: Option<Duration>) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    fn check(&self, path: &str, phase: &'static str) -> Result<(), FileError> {
        match self.budget {
            Some(budget) if self.start.elapsed() >= budget => Err(FileError::Timeout {
                path: path.to_string(),
                phase,
                budget_ms: budget.as_millis() as u64,
            }),
            _ => Ok(()),
        }
    }
}
