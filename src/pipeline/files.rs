//! Python source file discovery
//!
//! Walks a project root respecting `.gitignore`, keeps `.py`/`.pyi` files
//! and drops anything matching the configured exclusion globs. The result
//! is sorted so batch output order does not depend on directory iteration.

use crate::config::ExcludeConfig;
use crate::parsers::is_python_file;
use anyhow::{Context, Result};
use ignore::overrides::{Override, OverrideBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Custom ignore file honoured alongside `.gitignore`
pub const IGNORE_FILE_NAME: &str = ".connascenceignore";

/// Collect all Python files under `root`, sorted
pub fn discover_python_files(root: &Path, exclude: &ExcludeConfig) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }

    let overrides = build_overrides(root, &exclude.effective_patterns())?;

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .require_git(false)
        .add_custom_ignore_filename(IGNORE_FILE_NAME)
        .overrides(overrides);

    let mut files: Vec<PathBuf> = builder
        .build()
        .flatten()
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && is_python_file(path))
        .collect();
    files.sort();

    debug!("Discovered {} Python files under {}", files.len(), root.display());
    Ok(files)
}

/// Exclusion globs become negated overrides
fn build_overrides(root: &Path, patterns: &[String]) -> Result<Override> {
    let mut builder = OverrideBuilder::new(root);
    for pattern in patterns {
        builder
            .add(&format!("!{}", pattern))
            .with_context(|| format!("Invalid exclude pattern: {}", pattern))?;
    }
    builder.build().context("Failed to build exclude patterns")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "x = 1\n").unwrap();
    }

    #[test]
    fn test_discovers_sorted_python_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "pkg/b.py");
        touch(dir.path(), "pkg/a.py");
        touch(dir.path(), "stubs/c.pyi");
        touch(dir.path(), "README.md");

        let files = discover_python_files(dir.path(), &ExcludeConfig::default()).unwrap();
        let rel: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(rel, vec!["pkg/a.py", "pkg/b.py", "stubs/c.pyi"]);
    }

    #[test]
    fn test_default_and_custom_excludes() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "app/main.py");
        touch(dir.path(), "app/__pycache__/main.py");
        touch(dir.path(), "build/lib/gen.py");
        touch(dir.path(), "migrations/0001.py");

        let exclude = ExcludeConfig {
            paths: vec!["migrations/".to_string()],
            skip_defaults: false,
        };
        let files = discover_python_files(dir.path(), &exclude).unwrap();
        assert_eq!(files, vec![dir.path().join("app/main.py")]);
    }

    #[test]
    fn test_missing_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(discover_python_files(&missing, &ExcludeConfig::default()).is_err());
    }
}
