//! Content cache interface
//!
//! The batch runner asks the cache for a file's text before reading it
//! from disk. Any implementation is valid as long as a miss is always
//! safe: `NoCache` never hits and the pipeline behaves identically.

use std::sync::Arc;

/// Common interface for source-content caches
///
/// Keys are file paths as given to the batch runner. The cache never
/// checks whether a file changed on disk; hosts call `invalidate` or
/// `clear` when they know it did.
pub trait ContentCache: Send + Sync {
    /// Name of this cache (for logging)
    fn name(&self) -> &str;

    /// Cached content for `key`, if present
    fn get(&self, key: &str) -> Option<Arc<str>>;

    /// Store content for `key`
    fn put(&self, key: &str, value: Arc<str>);

    /// Drop the entry for `key`
    fn invalidate(&self, key: &str);

    /// Drop every entry
    fn clear(&self);

    /// Number of cached entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Always misses
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl ContentCache for NoCache {
    fn name(&self) -> &str {
        "none"
    }

    fn get(&self, _key: &str) -> Option<Arc<str>> {
        None
    }

    fn put(&self, _key: &str, _value: Arc<str>) {}

    fn invalidate(&self, _key: &str) {}

    fn clear(&self) {}

    fn len(&self) -> usize {
        0
    }
}
