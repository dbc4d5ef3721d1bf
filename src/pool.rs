//! Recycling pools: idle real file handles keyed by path, and reusable
//! in-memory reader objects
//!
//! Both pools are total: acquire signals a miss as a value and release never
//! rejects. Neither lock is held across I/O.

use crate::cache::CachedEntry;
use crate::file::MemFile;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::sync::Arc;
use tracing::trace;

/// Initial capacity for a per-path handle stack.
const STACK_CAPACITY: usize = 128;

/// Per-path stack of idle file handles. Simple LIFO: the most recently
/// released handle is reused first.
#[derive(Debug)]
struct HandleStack {
    files: Vec<File>,
}

impl HandleStack {
    fn new() -> Self {
        Self {
            files: Vec::with_capacity(STACK_CAPACITY),
        }
    }

    fn push(&mut self, file: File) {
        self.files.push(file);
    }

    fn pop(&mut self) -> Option<File> {
        self.files.pop()
    }

    fn len(&self) -> usize {
        self.files.len()
    }
}

/// Path-keyed pool of previously opened, currently idle file handles
///
/// One coarse mutex guards the whole map. It is only taken on open and
/// close, never per byte read, so correctness wins over sharding here.
#[derive(Debug)]
pub struct HandlePool {
    stacks: Mutex<HashMap<String, HandleStack>>,
}

impl HandlePool {
    pub fn new() -> Self {
        Self {
            stacks: Mutex::new(HashMap::new()),
        }
    }

    /// Pop an idle handle for `path`, rewound for its next consumer.
    ///
    /// A handle whose rewind fails is discarded; the caller sees an ordinary
    /// miss and falls through to a real open.
    pub fn acquire(&self, path: &str) -> Option<File> {
        let popped = self.stacks.lock().get_mut(path).and_then(|s| s.pop());
        let mut file = popped?;
        match file.seek(SeekFrom::Start(0)) {
            Ok(_) => {
                trace!("reusing idle handle for {}", path);
                Some(file)
            }
            Err(err) => {
                trace!("discarding unseekable idle handle for {}: {}", path, err);
                None
            }
        }
    }

    /// Park an idle handle for later reuse. The per-path stack is created
    /// lazily on first release and grows without bound; parked handles stay
    /// open until process teardown.
    pub fn release(&self, path: &str, file: File) {
        let mut stacks = self.stacks.lock();
        stacks
            .entry(path.to_string())
            .or_insert_with(HandleStack::new)
            .push(file);
    }

    /// Number of idle handles parked for `path`.
    pub fn idle_count(&self, path: &str) -> usize {
        self.stacks.lock().get(path).map_or(0, HandleStack::len)
    }
}

impl Default for HandlePool {
    fn default() -> Self {
        Self::new()
    }
}

/// Recycling free-list for in-memory readers
///
/// Avoids a fresh allocation per cache hit under request concurrency. Safe
/// because [`acquire`](Self::acquire) overwrites every field of a recycled
/// reader; the pool performs no reset at release time and gives no ordering
/// guarantee on reuse.
#[derive(Debug)]
pub struct ReaderPool {
    free: Mutex<Vec<Box<MemFile>>>,
}

impl ReaderPool {
    pub fn new() -> Self {
        Self {
            free: Mutex::new(Vec::new()),
        }
    }

    /// Hand out a reader positioned at the start of `entry`'s content,
    /// recycled from the free-list when one is available. The reader finds
    /// its way back through the `pool` reference it is given here.
    pub fn acquire(pool: &Arc<Self>, path: &str, entry: &Arc<CachedEntry>) -> Box<MemFile> {
        let recycled = pool.free.lock().pop();
        match recycled {
            Some(mut reader) => {
                reader.reset(path, entry, Arc::downgrade(pool));
                reader
            }
            None => Box::new(MemFile::new(path, entry, Arc::downgrade(pool))),
        }
    }

    /// Return a reader to the free-list as-is; the next acquire overwrites
    /// its state.
    pub fn release(&self, reader: Box<MemFile>) {
        self.free.lock().push(reader);
    }

    /// Number of parked readers.
    pub fn idle_count(&self) -> usize {
        self.free.lock().len()
    }
}

impl Default for ReaderPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileMeta;
    use bytes::Bytes;
    use std::io::{Read, Write};
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn open_fixture(dir: &TempDir, name: &str, content: &[u8]) -> File {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        File::open(&path).unwrap()
    }

    fn cached(content: &[u8]) -> Arc<CachedEntry> {
        Arc::new(CachedEntry {
            meta: FileMeta {
                name: "fixture".to_string(),
                size: content.len() as u64,
                modified: SystemTime::UNIX_EPOCH,
                is_dir: false,
            },
            content: Bytes::copy_from_slice(content),
        })
    }

    #[test]
    fn test_acquire_from_empty_pool_is_miss() {
        let pool = HandlePool::new();
        assert!(pool.acquire("index.html").is_none());
        assert_eq!(pool.idle_count("index.html"), 0);
    }

    #[test]
    fn test_release_then_acquire_returns_rewound_handle() {
        let dir = TempDir::new().unwrap();
        let mut file = open_fixture(&dir, "a.txt", b"abcdef");
        let pool = HandlePool::new();

        // Leave the cursor mid-file before parking the handle.
        let mut skip = [0u8; 3];
        file.read_exact(&mut skip).unwrap();
        pool.release("a.txt", file);
        assert_eq!(pool.idle_count("a.txt"), 1);

        let mut reused = pool.acquire("a.txt").unwrap();
        let mut content = String::new();
        reused.read_to_string(&mut content).unwrap();
        assert_eq!(content, "abcdef");
        assert_eq!(pool.idle_count("a.txt"), 0);
    }

    #[test]
    fn test_stack_is_lifo_per_path() {
        let dir = TempDir::new().unwrap();
        let pool = HandlePool::new();

        let path_a = dir.path().join("first.txt");
        let path_b = dir.path().join("second.txt");
        std::fs::write(&path_a, b"first").unwrap();
        std::fs::write(&path_b, b"second").unwrap();

        // Same pool key, two distinct underlying files, so the reader can
        // observe which handle comes back first.
        pool.release("k", File::open(&path_a).unwrap());
        pool.release("k", File::open(&path_b).unwrap());

        let mut top = pool.acquire("k").unwrap();
        let mut content = String::new();
        top.read_to_string(&mut content).unwrap();
        assert_eq!(content, "second");
    }

    #[test]
    fn test_pools_are_keyed_by_path() {
        let dir = TempDir::new().unwrap();
        let pool = HandlePool::new();
        pool.release("a.txt", open_fixture(&dir, "a.txt", b"a"));

        assert!(pool.acquire("b.txt").is_none());
        assert!(pool.acquire("a.txt").is_some());
    }

    #[test]
    fn test_reader_pool_recycles_allocations() {
        let pool = Arc::new(ReaderPool::new());
        let entry = cached(b"content");

        let reader = ReaderPool::acquire(&pool, "a.html", &entry);
        let first_ptr = std::ptr::from_ref(&*reader) as usize;
        pool.release(reader);
        assert_eq!(pool.idle_count(), 1);

        let reused = ReaderPool::acquire(&pool, "b.html", &entry);
        let second_ptr = std::ptr::from_ref(&*reused) as usize;
        assert_eq!(first_ptr, second_ptr);
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn test_reader_pool_concurrent_acquire_release() {
        use std::thread;

        let pool = Arc::new(ReaderPool::new());
        let entry = cached(&[9u8; 128]);

        let mut handles = vec![];
        for _ in 0..8 {
            let pool = Arc::clone(&pool);
            let entry = Arc::clone(&entry);
            handles.push(thread::spawn(move || {
                for _ in 0..500 {
                    let reader = ReaderPool::acquire(&pool, "hot.html", &entry);
                    pool.release(reader);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_concurrent_handle_release_acquire() {
        use std::thread;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hot.txt");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"hot")
            .unwrap();

        let pool = Arc::new(HandlePool::new());
        let mut handles = vec![];
        for _ in 0..4 {
            let pool = Arc::clone(&pool);
            let path = path.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..200 {
                    let file = match pool.acquire("hot.txt") {
                        Some(file) => file,
                        None => File::open(&path).unwrap(),
                    };
                    pool.release("hot.txt", file);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(pool.idle_count("hot.txt") >= 1);
    }
}
