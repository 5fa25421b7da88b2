//! Source parsers using tree-sitter
//!
//! The parser is the only stage allowed to fail. It hands the collector a
//! syntax tree plus a flag saying whether tree-sitter had to recover from
//! syntax errors along the way.

pub mod python;

pub use python::{parse_bytes, parse_source, ParsedSource, SourceSegment};

use std::path::Path;

/// File extensions handled by the Python parser
pub const PYTHON_EXTENSIONS: &[&str] = &["py", "pyi"];

/// Whether a path looks like a Python source file
pub fn is_python_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| PYTHON_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_python_file() {
        assert!(is_python_file(Path::new("pkg/mod.py")));
        assert!(is_python_file(Path::new("stubs/mod.pyi")));
        assert!(!is_python_file(Path::new("setup.cfg")));
        assert!(!is_python_file(Path::new("Makefile")));
    }
}
