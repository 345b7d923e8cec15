//! Copying recording payloads by prefix pattern

use crate::{Result, TransferError};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// A parsed copy pattern: a directory plus a file name prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyPattern {
    pub dir: PathBuf,
    pub prefix: String,
    /// Without a trailing `*` only the exact file name matches
    pub wildcard: bool,
}

impl CopyPattern {
    /// Parse `"/dir/name*"` or `"/dir/name.ext"`
    pub fn parse(pattern: &str) -> Result<Self> {
        let path = Path::new(pattern);
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| TransferError::InvalidPattern(pattern.to_string()))?;

        let (prefix, wildcard) = match name.strip_suffix('*') {
            Some(prefix) => (prefix, true),
            None => (name, false),
        };
        if prefix.contains('*') {
            return Err(TransferError::InvalidPattern(pattern.to_string()));
        }

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        Ok(Self {
            dir,
            prefix: prefix.to_string(),
            wildcard,
        })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        if self.wildcard {
            file_name.starts_with(&self.prefix)
        } else {
            file_name == self.prefix
        }
    }
}

/// Outcome of copying one pattern
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyReport {
    /// Source files matching the pattern
    pub matched: usize,
    pub copied: usize,
    /// Matches left alone because the destination already existed
    pub skipped: usize,
}

/// Copy every regular file matching `pattern` into `dest_dir`.
///
/// `dest_dir` is created if missing. Existing destination files are kept
/// unless `overwrite` is set. Fails when nothing matches.
pub async fn copy_matching(
    pattern: &str,
    dest_dir: &Path,
    overwrite: bool,
    verbose: bool,
) -> Result<CopyReport> {
    let pattern_parsed = CopyPattern::parse(pattern)?;
    let mut report = CopyReport::default();

    let mut entries = match fs::read_dir(&pattern_parsed.dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(TransferError::NoMatch(pattern.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let mut sources = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if pattern_parsed.matches(&name) && entry.file_type().await?.is_file() {
            sources.push((entry.path(), name));
        }
    }

    if sources.is_empty() {
        return Err(TransferError::NoMatch(pattern.to_string()));
    }
    sources.sort();

    fs::create_dir_all(dest_dir).await?;

    for (source, name) in sources {
        report.matched += 1;
        let dest = dest_dir.join(&name);

        if !overwrite && fs::try_exists(&dest).await? {
            debug!(dest = %dest.display(), "Destination exists, skipping");
            report.skipped += 1;
            continue;
        }

        let bytes = fs::copy(&source, &dest).await?;
        report.copied += 1;
        if verbose {
            info!(source = %source.display(), dest = %dest.display(), bytes, "Copied");
        } else {
            debug!(source = %source.display(), dest = %dest.display(), bytes, "Copied");
        }
    }

    Ok(report)
}
