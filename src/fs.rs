//! Cache-aware open facade

use crate::cache::MemoryCache;
use crate::config::FsConfig;
use crate::error::{Result, ServeFsError};
use crate::file::{PooledFile, ServedFile, TeeFile};
use crate::pool::{HandlePool, ReaderPool};
use crate::stats::{CacheStats, StatsSnapshot};
use parking_lot::Mutex;
use std::fs::File;
use std::sync::Arc;
use tracing::{debug, trace};

/// Caching front-end over a directory of static files
///
/// [`open`](Self::open) consults three tiers in order: the in-memory content
/// cache, the idle-handle pool, and finally the real filesystem. Small files
/// are promoted into memory transparently the first time a session over them
/// closes, gated by a per-file size limit and a process-wide byte quota.
///
/// Shared across request threads behind an `Arc`; every operation takes
/// `&self`.
pub struct FileSystem {
    config: FsConfig,
    cache: Arc<MemoryCache>,
    handles: Arc<HandlePool>,
    readers: Arc<ReaderPool>,
    /// Bytes admitted into the memory cache so far. Monotonic by design:
    /// admission is a one-way reservation taken before the content is read,
    /// with no decrement on overwrite or on a declined capture.
    mem_used: Mutex<u64>,
    stats: CacheStats,
}

impl FileSystem {
    pub fn new(config: FsConfig) -> Self {
        Self {
            config,
            cache: Arc::new(MemoryCache::new()),
            handles: Arc::new(HandlePool::new()),
            readers: Arc::new(ReaderPool::new()),
            mem_used: Mutex::new(0),
            stats: CacheStats::new(),
        }
    }

    /// Open `name` beneath the configured root.
    ///
    /// First success wins: memory cache, then handle pool, then a real open.
    /// Freshly opened files qualifying for promotion come back wrapped in a
    /// capture that feeds the cache on close; everything else comes back as
    /// a pooled handle.
    pub fn open(&self, name: &str) -> Result<Box<dyn ServedFile>> {
        let name = clean_path(name)?;

        if let Some(entry) = self.cache.lookup(&name) {
            trace!("memory cache hit for {}", name);
            self.stats.record_mem_hit(entry.content.len() as u64);
            let reader: Box<dyn ServedFile> = ReaderPool::acquire(&self.readers, &name, &entry);
            return Ok(reader);
        }

        if let Some(file) = self.handles.acquire(&name) {
            self.stats.record_handle_reuse();
            let disk_path = self.config.root.join(&name);
            return Ok(Box::new(PooledFile::new(
                file,
                name,
                disk_path,
                Arc::clone(&self.handles),
            )));
        }

        self.stats.record_miss();
        let disk_path = self.config.root.join(&name);
        let file = File::open(&disk_path).map_err(|err| ServeFsError::from_open(&name, err))?;
        let meta = file.metadata()?;

        let mut used = self.mem_used.lock();
        let eligible = !meta.is_dir()
            && meta.len() <= self.config.cache_limit
            && *used < self.config.mem_quota;
        if !eligible {
            drop(used);
            trace!("{} is not cache eligible ({} bytes)", name, meta.len());
            return Ok(Box::new(PooledFile::new(
                file,
                name,
                disk_path,
                Arc::clone(&self.handles),
            )));
        }

        // Optimistic reservation: the quota is charged before any content is
        // read, and stays charged even if the capture later declines.
        *used += meta.len();
        drop(used);

        debug!("{} admitted for memory caching ({} bytes)", name, meta.len());
        Ok(Box::new(TeeFile::new(
            file,
            name,
            meta.len(),
            Arc::clone(&self.cache),
            self.stats.clone(),
        )))
    }

    /// Bytes admitted into the memory cache so far.
    pub fn mem_used(&self) -> u64 {
        *self.mem_used.lock()
    }

    /// Number of fully cached files.
    pub fn cached_files(&self) -> usize {
        self.cache.len()
    }

    /// Counter snapshot for the open tiers.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

/// Lexically sanitize a request path into the root-relative key used for the
/// cache and the handle pool.
///
/// Leading slashes and `.` components drop out; `..` components and embedded
/// NUL are refused as [`ServeFsError::NotFound`] so a request can never
/// resolve above the root.
fn clean_path(name: &str) -> Result<String> {
    if name.contains('\0') {
        return Err(ServeFsError::NotFound(name.to_string()));
    }

    let mut parts: Vec<&str> = Vec::new();
    for part in name.split('/') {
        match part {
            "" | "." => {}
            ".." => return Err(ServeFsError::NotFound(name.to_string())),
            part => parts.push(part),
        }
    }
    Ok(parts.join("/"))
}
