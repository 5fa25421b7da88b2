//! Parallel batch analysis using crossbeam channels
//!
//! Files are independent, so each one is a task on a fixed-size worker
//! pool. The caller's thread is the single consumer that merges results
//! into the aggregator.
//!
//! # Architecture
//!
//! ```text
//!                     ┌─────────────┐
//!                     │   Producer  │  Feeds (index, task) pairs
//!                     └──────┬──────┘
//!                            │ bounded channel (task_tx → task_rx)
//!            ┌───────────────┼───────────────┐
//!            ▼               ▼               ▼
//!     ┌──────────┐    ┌──────────┐    ┌──────────┐
//!     │ Worker 1 │    │ Worker 2 │    │ Worker N │  read → parse → collect → detect
//!     └────┬─────┘    └────┬─────┘    └────┬─────┘
//!          │               │               │
//!          └───────────────┼───────────────┘
//!                          │ bounded channel (result_tx → result_rx)
//!                          ▼
//!                   ┌──────────────┐
//!                   │   Consumer   │  ViolationAggregator, keyed by index
//!                   └──────────────┘
//! ```
//!
//! A failure in one file (I/O, parse, timeout, panic, cancellation) becomes
//! a skipped-file entry; it never aborts the batch.

use crate::cache::{content_cache, ContentCache, NoCache};
use crate::config::{ExcludeConfig, ProjectConfig};
use crate::detectors::{panic_message, DetectionSummary};
use crate::errors::{ConfigResult, FileError};
use crate::models::AnalysisReport;
use crate::pipeline::aggregator::ViolationAggregator;
use crate::pipeline::file::{FileAnalysis, FileAnalyzer};
use crate::pipeline::files::discover_python_files;
use crossbeam_channel::bounded;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Upper bound on the default worker count
pub const MAX_DEFAULT_WORKERS: usize = 16;

/// In-flight tasks per worker on each channel
const CHANNEL_SLOTS_PER_WORKER: usize = 4;

/// Shared cancellation flag for an in-flight batch
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files not yet started will be skipped as cancelled
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counters for one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub files_total: usize,
    pub files_analyzed: usize,
    pub files_skipped: usize,
    pub files_partial: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub detectors_failed: usize,
    pub workers: usize,
    pub duration_ms: u64,
}

/// Report plus run statistics
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub report: AnalysisReport,
    pub stats: BatchStats,
    /// Detector runs summed over every analyzed file
    pub detection: DetectionSummary,
}

/// Stats from a single worker
#[derive(Debug, Default)]
struct WorkerStats {
    cache_hits: usize,
    cache_misses: usize,
}

enum TaskSource {
    Disk(PathBuf),
    Inline(String),
}

struct FileTask {
    /// Path as it appears in the report
    label: String,
    source: TaskSource,
}

/// Analyzes many files on a worker pool
pub struct BatchAnalyzer {
    analyzer: FileAnalyzer,
    workers: usize,
    cache: Arc<dyn ContentCache>,
    cancel: CancellationToken,
}

impl BatchAnalyzer {
    pub fn new(analyzer: FileAnalyzer) -> Self {
        Self {
            analyzer,
            workers: default_workers(),
            cache: Arc::new(NoCache),
            cancel: CancellationToken::new(),
        }
    }

    /// Analyzer, worker count and cache from a project configuration
    pub fn from_config(config: &ProjectConfig) -> ConfigResult<Self> {
        let mut batch = Self::new(FileAnalyzer::from_config(config)?)
            .with_cache(content_cache(config.analysis.cache_capacity.unwrap_or(0)));
        if let Some(workers) = config.analysis.workers {
            batch = batch.with_workers(workers);
        }
        Ok(batch)
    }

    /// Fixed worker count (minimum 1)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn ContentCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels runs of this analyzer
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Discover Python files under `root` and analyze them.
    ///
    /// Report paths are relative to `root`.
    pub fn analyze_directory(
        &self,
        root: &Path,
        exclude: &ExcludeConfig,
    ) -> anyhow::Result<BatchOutcome> {
        let files = discover_python_files(root, exclude)?;
        let tasks = files
            .into_iter()
            .map(|path| FileTask {
                label: relative_label(root, &path),
                source: TaskSource::Disk(path),
            })
            .collect();
        Ok(self.run(tasks))
    }

    /// Analyze files read from disk, reported in the given order
    pub fn analyze_files(&self, paths: &[PathBuf]) -> BatchOutcome {
        let tasks = paths
            .iter()
            .map(|path| FileTask {
                label: path.display().to_string(),
                source: TaskSource::Disk(path.clone()),
            })
            .collect();
        self.run(tasks)
    }

    /// Analyze in-memory `(path, source)` pairs, reported in the given order
    pub fn analyze_sources(&self, sources: Vec<(String, String)>) -> BatchOutcome {
        let tasks = sources
            .into_iter()
            .map(|(label, text)| FileTask {
                label,
                source: TaskSource::Inline(text),
            })
            .collect();
        self.run(tasks)
    }

    fn run(&self, tasks: Vec<FileTask>) -> BatchOutcome {
        let start = Instant::now();
        let total = tasks.len();
        let workers = self.workers.min(total.max(1));
        let buffer_size = workers * CHANNEL_SLOTS_PER_WORKER;

        info!("Analyzing {} files with {} workers", total, workers);

        let mut stats = BatchStats {
            files_total: total,
            workers,
            ..Default::default()
        };
        let mut aggregator = ViolationAggregator::new();
        let mut detection = DetectionSummary::default();

        thread::scope(|s| {
            let (task_tx, task_rx) = bounded::<(usize, FileTask)>(buffer_size);
            let (result_tx, result_rx) =
                bounded::<(usize, Result<FileAnalysis, FileError>)>(buffer_size);

            s.spawn(move || {
                for item in tasks.into_iter().enumerate() {
                    // blocks while workers are busy
                    if task_tx.send(item).is_err() {
                        break;
                    }
                }
            });

            let mut handles = Vec::with_capacity(workers);
            for _ in 0..workers {
                let rx = task_rx.clone();
                let tx = result_tx.clone();
                handles.push(s.spawn(move || {
                    let mut worker = WorkerStats::default();
                    for (index, task) in rx {
                        let outcome = self.analyze_task(task, &mut worker);
                        if tx.send((index, outcome)).is_err() {
                            break;
                        }
                    }
                    worker
                }));
            }

            // workers hold the remaining ends; the consumer loop ends when they finish
            drop(task_rx);
            drop(result_tx);

            for (index, outcome) in result_rx {
                match outcome {
                    Ok(analysis) => {
                        stats.files_analyzed += 1;
                        stats.files_partial += usize::from(analysis.summary.partial);
                        detection.merge(&analysis.detection);
                        aggregator.add_file(index, analysis.summary, analysis.violations);
                    }
                    Err(e) => {
                        if !matches!(e, FileError::Cancelled { .. }) {
                            warn!("Skipping {}", e);
                        }
                        stats.files_skipped += 1;
                        aggregator.add_skipped(index, e.into_skipped());
                    }
                }
            }

            for handle in handles {
                match handle.join() {
                    Ok(worker) => {
                        stats.cache_hits += worker.cache_hits;
                        stats.cache_misses += worker.cache_misses;
                    }
                    Err(_) => warn!("Batch worker exited abnormally"),
                }
            }
        });

        let report = aggregator.finish();
        stats.detectors_failed = detection.detectors_failed;
        stats.duration_ms = start.elapsed().as_millis() as u64;

        if self.cancel.is_cancelled() {
            info!(
                "Batch cancelled: {} of {} files analyzed",
                stats.files_analyzed, total
            );
        }
        info!(
            "Analyzed {} files ({} skipped, {} partial): {} violations in {}ms",
            stats.files_analyzed,
            stats.files_skipped,
            stats.files_partial,
            report.summary.total,
            stats.duration_ms
        );

        BatchOutcome {
            report,
            stats,
            detection,
        }
    }

    /// One file, isolated: panics become a skipped file
    fn analyze_task(
        &self,
        task: FileTask,
        worker: &mut WorkerStats,
    ) -> Result<FileAnalysis, FileError> {
        if self.cancel.is_cancelled() {
            return Err(FileError::Cancelled { path: task.label });
        }

        let label = task.label.clone();
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.analyze_unguarded(task, worker)
        }))
        .unwrap_or_else(|payload| {
            Err(FileError::Panicked {
                path: label,
                message: panic_message(payload.as_ref()),
            })
        })
    }

    fn analyze_unguarded(
        &self,
        task: FileTask,
        worker: &mut WorkerStats,
    ) -> Result<FileAnalysis, FileError> {
        match task.source {
            TaskSource::Inline(text) => self.analyzer.analyze_source(&task.label, &text),
            TaskSource::Disk(path) => {
                let key = path.display().to_string();
                if let Some(content) = self.cache.get(&key) {
                    worker.cache_hits += 1;
                    return self.analyzer.analyze_source(&task.label, &content);
                }
                worker.cache_misses += 1;

                let bytes = std::fs::read(&path).map_err(|source| FileError::Io {
                    path: task.label.clone(),
                    source,
                })?;
                let analysis = self.analyzer.analyze_bytes(&task.label, &bytes)?;
                // only text that parsed is worth keeping
                if let Ok(text) = std::str::from_utf8(&bytes) {
                    self.cache.put(&key, Arc::from(text));
                    debug!("Cached {} in {}", key, self.cache.name());
                }
                Ok(analysis)
            }
        }
    }
}

/// Available parallelism, capped
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(MAX_DEFAULT_WORKERS)
}

fn relative_label(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
