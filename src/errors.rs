//! Typed errors for parsing, configuration and per-file analysis

use std::path::PathBuf;
use thiserror::Error;

/// The parser could not produce a usable syntax tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("binary content: NUL byte at offset {offset}")]
    BinaryContent { offset: usize },

    #[error("source is not valid UTF-8: {0}")]
    InvalidUtf8(String),

    #[error("failed to load Python grammar: {0}")]
    Grammar(String),

    #[error("parser produced no syntax tree")]
    NoTree,

    #[error("unrecoverable syntax error near line {line}")]
    Unrecoverable { line: u32 },
}

/// Invalid thresholds or project configuration.
///
/// Raised when an engine or analyzer is built, never silently clamped.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("threshold '{name}' must be positive, got {value}")]
    NonPositiveThreshold { name: &'static str, value: i64 },

    #[error("threshold '{name}' for detector '{detector}' has the wrong type: expected {expected}")]
    WrongThresholdType {
        detector: String,
        name: String,
        expected: &'static str,
    },

    #[error("unknown detector '{0}' in configuration")]
    UnknownDetector(String),

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    Malformed { path: PathBuf, message: String },
}

/// Why one file in a batch produced no facts
#[derive(Error, Debug)]
pub enum FileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error("analysis of {path} exceeded {budget_ms}ms during {phase}")]
    Timeout {
        path: String,
        phase: &'static str,
        budget_ms: u64,
    },

    #[error("analysis of {path} was cancelled")]
    Cancelled { path: String },

    #[error("analysis of {path} panicked: {message}")]
    Panicked { path: String, message: String },
}

impl FileError {
    pub fn skip_reason(&self) -> crate::models::SkipReason {
        use crate::models::SkipReason;
        match self {
            FileError::Io { .. } => SkipReason::Io,
            FileError::Parse { .. } => SkipReason::Parse,
            FileError::Timeout { .. } => SkipReason::Timeout,
            FileError::Cancelled { .. } => SkipReason::Cancelled,
            FileError::Panicked { .. } => SkipReason::Panicked,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            FileError::Io { path, .. }
            | FileError::Parse { path, .. }
            | FileError::Timeout { path, .. }
            | FileError::Cancelled { path }
            | FileError::Panicked { path, .. } => path,
        }
    }

    /// Convert into a skipped-file entry for the report
    pub fn into_skipped(self) -> crate::models::SkippedFile {
        crate::models::SkippedFile {
            path: self.path().to_string(),
            reason: self.skip_reason(),
            message: self.to_string(),
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
