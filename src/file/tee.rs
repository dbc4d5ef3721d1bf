//! Capture-on-close wrapper that promotes file content into the memory cache

use crate::cache::{CachedEntry, MemoryCache};
use crate::error::{Result, ServeFsError};
use crate::file::ServedFile;
use crate::stats::CacheStats;
use crate::types::{FileMeta, Whence};
use bytes::Bytes;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;
use tracing::trace;

/// Single-use decorator around a freshly opened, cache-eligible handle
///
/// Reads pass straight through to the real handle. The capture happens at
/// close: rewind, copy the full content into the buffer, stat again, and
/// store into the [`MemoryCache`] only when the copy matches the close-time
/// size exactly. A mismatch (or a failed re-stat) declines silently; the
/// close still succeeds and the real handle is released either way. The
/// handle is never pooled — this wrapper exists for exactly one session.
#[derive(Debug)]
pub struct TeeFile {
    file: File,
    name: String,
    buf: Vec<u8>,
    cache: Arc<MemoryCache>,
    stats: CacheStats,
}

impl TeeFile {
    pub(crate) fn new(
        file: File,
        name: String,
        expected_size: u64,
        cache: Arc<MemoryCache>,
        stats: CacheStats,
    ) -> Self {
        Self {
            file,
            name,
            buf: Vec::with_capacity(expected_size as usize),
            cache,
            stats,
        }
    }
}

impl ServedFile for TeeFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.file.read(buf)?)
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        let pos = match whence {
            Whence::Start => {
                if offset < 0 {
                    return Err(ServeFsError::InvalidSeek { offset, whence });
                }
                SeekFrom::Start(offset as u64)
            }
            Whence::Current => SeekFrom::Current(offset),
            Whence::End => SeekFrom::End(offset),
        };
        Ok(self.file.seek(pos)?)
    }

    fn stat(&self) -> Result<FileMeta> {
        let meta = self.file.metadata()?;
        Ok(FileMeta::from_std(&self.name, &meta))
    }

    fn read_dir(&mut self) -> Result<Vec<FileMeta>> {
        // Eligibility already ruled out directories.
        Err(ServeFsError::NotADirectory(self.name.clone()))
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.read_to_end(&mut self.buf)?;

        let Ok(meta) = self.file.metadata() else {
            self.stats.record_declined_capture();
            return Ok(());
        };
        if self.buf.len() as u64 != meta.len() {
            trace!(
                "declining capture of {}: copied {} bytes, stat says {}",
                self.name,
                self.buf.len(),
                meta.len()
            );
            self.stats.record_declined_capture();
            return Ok(());
        }

        let this = *self;
        let entry = CachedEntry {
            meta: FileMeta::from_std(&this.name, &meta),
            content: Bytes::from(this.buf),
        };
        this.stats.record_promotion();
        this.cache.store(this.name, entry);
        Ok(())
    }
}
