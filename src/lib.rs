//! Caching file-open layer for a static-file-serving path
//!
//! `servefs` sits in front of a directory of static assets and reuses work
//! across requests. Idle file handles are parked in a per-path pool instead
//! of being closed, and small files are promoted into an in-memory cache the
//! first time a session over them is read to completion, so repeat requests
//! for hot files skip the open/read syscall path entirely.
//!
//! The sole entry point is [`FileSystem::open`]. It returns a handle-like
//! [`ServedFile`] whose close feeds the pools and the cache:
//!
//! ```no_run
//! use servefs::{FileSystem, FsConfig};
//!
//! # fn main() -> servefs::Result<()> {
//! let fs = FileSystem::new(FsConfig::new("/srv/static"));
//!
//! let mut file = fs.open("/index.html")?;
//! let meta = file.stat()?;
//! let mut content = vec![0u8; meta.size as usize];
//! let mut filled = 0;
//! loop {
//!     let n = file.read(&mut content[filled..])?;
//!     if n == 0 {
//!         break;
//!     }
//!     filled += n;
//! }
//! file.close()?; // first close promotes small files into the memory cache
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod file;
pub mod pool;
pub mod stats;
pub mod types;

mod fs;

pub use cache::{CachedEntry, MemoryCache};
pub use config::FsConfig;
pub use error::{Result, ServeFsError};
pub use file::{MemFile, PooledFile, ServedFile, TeeFile};
pub use fs::FileSystem;
pub use pool::{HandlePool, ReaderPool};
pub use stats::{CacheStats, StatsSnapshot};
pub use types::{FileMeta, GB, KB, MB, Whence};
