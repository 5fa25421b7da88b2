//! Source content caching
//!
//! An optional collaborator of the batch runner. The pipeline works with
//! the cache absent (`NoCache`); `LruContentCache` keeps a bounded number
//! of recently read files in memory across runs.

mod lru;
mod traits;

pub use lru::LruContentCache;
pub use traits::{ContentCache, NoCache};

use std::sync::Arc;

/// Build the cache for a configured capacity: zero means no cache
pub fn content_cache(capacity: usize) -> Arc<dyn ContentCache> {
    if capacity == 0 {
        Arc::new(NoCache)
    } else {
        Arc::new(LruContentCache::new(capacity))
    }
}
