//! Read cursor over cached in-memory content

use crate::cache::CachedEntry;
use crate::error::{Result, ServeFsError};
use crate::file::ServedFile;
use crate::pool::ReaderPool;
use crate::types::{FileMeta, Whence};
use bytes::Bytes;
use std::sync::{Arc, Weak};

/// Per-session reader over a cached file
///
/// Obtained from the [`ReaderPool`] on a memory-cache hit and exclusively
/// owned by one caller until close. Content is a refcounted view of the
/// cached entry's buffer, so arbitrarily many concurrent readers share it
/// without copying. Every field is overwritten at acquisition; nothing from
/// a previous session survives recycling.
#[derive(Debug)]
pub struct MemFile {
    path: String,
    meta: FileMeta,
    content: Bytes,
    pos: usize,
    pool: Weak<ReaderPool>,
}

impl MemFile {
    pub(crate) fn new(path: &str, entry: &Arc<CachedEntry>, pool: Weak<ReaderPool>) -> Self {
        Self {
            path: path.to_string(),
            meta: entry.meta.clone(),
            content: entry.content.clone(),
            pos: 0,
            pool,
        }
    }

    /// Reinitialize a recycled reader for a new session.
    pub(crate) fn reset(&mut self, path: &str, entry: &Arc<CachedEntry>, pool: Weak<ReaderPool>) {
        self.path.clear();
        self.path.push_str(path);
        self.meta = entry.meta.clone();
        self.content = entry.content.clone();
        self.pos = 0;
        self.pool = pool;
    }
}

impl ServedFile for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.pos >= self.content.len() || buf.is_empty() {
            return Ok(0);
        }
        let n = buf.len().min(self.content.len() - self.pos);
        buf[..n].copy_from_slice(&self.content[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        let size = self.content.len() as i64;
        let target = match whence {
            Whence::Start => {
                if offset < 0 {
                    return Err(ServeFsError::InvalidSeek { offset, whence });
                }
                offset.min(size)
            }
            Whence::Current => {
                let target = self.pos as i64 + offset;
                if target < 0 {
                    return Err(ServeFsError::InvalidSeek { offset, whence });
                }
                target.min(size)
            }
            Whence::End => {
                if offset >= 0 {
                    // Forward-from-end seeks report the size without moving
                    // the cursor.
                    return Ok(size as u64);
                }
                let target = size + offset;
                if target < 0 {
                    return Err(ServeFsError::InvalidSeek { offset, whence });
                }
                target
            }
        };
        self.pos = target as usize;
        Ok(target as u64)
    }

    fn stat(&self) -> Result<FileMeta> {
        Ok(self.meta.clone())
    }

    fn read_dir(&mut self) -> Result<Vec<FileMeta>> {
        Err(ServeFsError::NotADirectory(self.path.clone()))
    }

    fn close(self: Box<Self>) -> Result<()> {
        if let Some(pool) = self.pool.upgrade() {
            pool.release(self);
        }
        Ok(())
    }
}
