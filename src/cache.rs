//! Path-keyed in-memory content cache

use crate::types::FileMeta;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Fully buffered file content plus the metadata captured at promotion time
///
/// Entries are immutable once stored. Readers share the underlying buffer
/// through refcounted [`Bytes`] clones and keep their cursor state in their
/// own [`MemFile`](crate::file::MemFile), never in the entry.
#[derive(Debug, Clone)]
pub struct CachedEntry {
    /// Metadata snapshot from the capture that produced this entry
    pub meta: FileMeta,
    /// File content; length always equals `meta.size`
    pub content: Bytes,
}

/// Read-mostly map from request path to cached content
///
/// A reader/writer lock guards the map: lookups take the shared mode, stores
/// the exclusive mode. The lock is never held across I/O.
#[derive(Debug)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Arc<CachedEntry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Look up cached content for a path. A miss is a value, not an error.
    pub fn lookup(&self, path: &str) -> Option<Arc<CachedEntry>> {
        self.entries.read().get(path).cloned()
    }

    /// Insert an entry, unconditionally replacing any previous one for the
    /// same path (last writer wins, no timestamp comparison).
    pub fn store(&self, path: String, entry: CachedEntry) {
        debug!("caching {} ({} bytes)", path, entry.content.len());
        self.entries.write().insert(path, Arc::new(entry));
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn entry(content: &[u8]) -> CachedEntry {
        CachedEntry {
            meta: FileMeta {
                name: "test".to_string(),
                size: content.len() as u64,
                modified: SystemTime::UNIX_EPOCH,
                is_dir: false,
            },
            content: Bytes::copy_from_slice(content),
        }
    }

    #[test]
    fn test_lookup_miss_is_none() {
        let cache = MemoryCache::new();
        assert!(cache.lookup("absent.html").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_store_and_lookup_share_entry() {
        let cache = MemoryCache::new();
        cache.store("a.html".to_string(), entry(b"hello"));

        let first = cache.lookup("a.html").unwrap();
        let second = cache.lookup("a.html").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(&first.content[..], b"hello");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_store_overwrites_last_writer_wins() {
        let cache = MemoryCache::new();
        cache.store("a.html".to_string(), entry(b"old"));
        cache.store("a.html".to_string(), entry(b"new"));

        let got = cache.lookup("a.html").unwrap();
        assert_eq!(&got.content[..], b"new");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_readers() {
        use std::thread;

        let cache = Arc::new(MemoryCache::new());
        cache.store("shared.html".to_string(), entry(&[7u8; 4096]));

        let mut handles = vec![];
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    let e = cache.lookup("shared.html").unwrap();
                    assert_eq!(e.content.len(), 4096);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
