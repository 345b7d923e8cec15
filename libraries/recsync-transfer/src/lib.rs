//! Record Sync File Transfer
//!
//! Copies recording payloads from a mounted remote recording root into the
//! local one. A recording is stored as several sibling files sharing a stem
//! (`.wav`, `.mp3`, `.low.mp4`, `.json`), so copies are driven by a prefix
//! pattern rather than a single path.

mod error;

pub mod copy;

pub use copy::{copy_matching, CopyPattern, CopyReport};
pub use error::TransferError;

use async_trait::async_trait;
use recsync_core::FileMover;
use std::path::Path;

pub type Result<T> = std::result::Result<T, TransferError>;

/// [`FileMover`] over the local file system (remote roots are mounts)
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileMover;

impl LocalFileMover {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileMover for LocalFileMover {
    async fn copy_files_matching(
        &self,
        pattern: &str,
        dest_dir: &str,
        overwrite: bool,
        verbose: bool,
    ) -> recsync_core::Result<usize> {
        let report = copy_matching(pattern, Path::new(dest_dir), overwrite, verbose).await?;
        Ok(report.copied)
    }
}
