//! Construction-time configuration for the caching filesystem

use crate::types::MB;
use std::path::PathBuf;

/// Configuration for a [`FileSystem`](crate::FileSystem)
#[derive(Debug, Clone)]
pub struct FsConfig {
    /// Root directory all request paths are resolved beneath
    pub root: PathBuf,
    /// Total bytes the memory cache may admit before new files stop
    /// qualifying for promotion
    pub mem_quota: u64,
    /// Per-file size ceiling for cache eligibility; larger files are served
    /// through pooled real handles instead
    pub cache_limit: u64,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            mem_quota: 128 * MB,
            cache_limit: MB,
        }
    }
}

impl FsConfig {
    /// Configuration rooted at `root` with the default quota and limit.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}
