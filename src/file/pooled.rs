//! Real file handle that is parked for reuse instead of closed

use crate::error::{Result, ServeFsError};
use crate::file::ServedFile;
use crate::pool::HandlePool;
use crate::types::{FileMeta, Whence};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::Arc;

/// A real handle whose close pushes it back onto the [`HandlePool`], so a
/// later open of the same path skips the open syscall entirely
///
/// Wraps both fresh opens that did not qualify for memory caching and
/// handles reused from the pool (those arrive already rewound).
#[derive(Debug)]
pub struct PooledFile {
    file: File,
    /// Request path, which is also the pool key
    name: String,
    /// Resolved on-disk path, needed for directory listings
    disk_path: PathBuf,
    pool: Arc<HandlePool>,
}

impl PooledFile {
    pub(crate) fn new(file: File, name: String, disk_path: PathBuf, pool: Arc<HandlePool>) -> Self {
        Self {
            file,
            name,
            disk_path,
            pool,
        }
    }
}

impl ServedFile for PooledFile {
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
        if !self.file.metadata()?.is_dir() {
            return Err(ServeFsError::NotADirectory(self.name.clone()));
        }

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.disk_path)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push(FileMeta::from_std(&name, &meta));
        }
        Ok(entries)
    }

    fn close(self: Box<Self>) -> Result<()> {
        let this = *self;
        this.pool.release(&this.name, this.file);
        Ok(())
    }
}
