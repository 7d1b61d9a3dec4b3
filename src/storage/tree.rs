//! Recursive directory copy with marker-file semantics
//!
//! Copies never abort: a file that cannot be copied is logged and recorded in
//! the returned [`CopyReport`], and the walk continues with its siblings.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{InterchangeError, InterchangeResult};
use crate::naming::unique_path;

/// Empty sentinel that opts a directory out of media indexing
pub const NO_MEDIA_MARKER: &str = ".nomedia";

/// Outcome of a best-effort copy
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CopyReport {
    /// Number of regular files written
    pub files_copied: usize,
    /// One message per file or directory that could not be copied
    pub failures: Vec<String>,
}

impl CopyReport {
    /// Fold another report into this one
    pub fn merge(&mut self, other: CopyReport) {
        self.files_copied += other.files_copied;
        self.failures.extend(other.failures);
    }

    /// Whether every item was copied
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, path: &Path, err: impl std::fmt::Display) {
        warn!(path = %path.display(), error = %err, "copy failed");
        self.failures.push(format!("{}: {}", path.display(), err));
    }
}

/// Copy `src` to `dst`, recursing into directories
///
/// Marker files are never propagated. A missing `src` is a no-op.
pub fn copy(src: &Path, dst: &Path) -> CopyReport {
    let mut report = CopyReport::default();
    copy_into(src, dst, &mut report);
    report
}

/// Like [`copy`], but a missing `src` still yields `dst` as an empty,
/// marked directory
pub fn copy_safe(src: &Path, dst: &Path) -> CopyReport {
    if src.exists() {
        return copy(src, dst);
    }

    let mut report = CopyReport::default();
    if let Err(e) = fs::create_dir_all(dst) {
        report.record(dst, e);
        return report;
    }
    if let Err(e) = create_marker(dst) {
        report.record(dst, e);
    }
    report
}

/// Write an empty marker file into `dir`
pub fn create_marker(dir: &Path) -> InterchangeResult<()> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join(NO_MEDIA_MARKER), b"")?;
    Ok(())
}

/// Scratch directory owned by one engine run, removed when dropped
#[derive(Debug)]
pub struct TempWorkspace {
    path: PathBuf,
}

impl TempWorkspace {
    /// Create a new directory `parent/<stem>[_d…]`
    ///
    /// Existing directories are never reused or cleared; a taken name gets
    /// one more suffix, up to `max_attempts` candidates.
    pub fn unique(parent: &Path, stem: &str, max_attempts: u32) -> InterchangeResult<Self> {
        fs::create_dir_all(parent).map_err(|e| {
            InterchangeError::Io(format!("Failed to create {}: {}", parent.display(), e))
        })?;

        let path = unique_path(parent, stem, None, max_attempts)?;
        // create_dir fails on a directory that appeared since the check
        fs::create_dir(&path).map_err(|e| {
            InterchangeError::Io(format!("Failed to create {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "workspace created");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.path.join(relative)
    }
}

impl Drop for TempWorkspace {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "workspace removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove workspace"),
        }
    }
}

fn copy_into(src: &Path, dst: &Path, report: &mut CopyReport) {
    if src.is_dir() {
        if let Err(e) = fs::create_dir_all(dst) {
            report.record(dst, e);
            return;
        }

        let entries = match fs::read_dir(src) {
            Ok(entries) => entries,
            Err(e) => {
                report.record(src, e);
                return;
            }
        };
        for entry in entries {
            match entry {
                Ok(entry) => copy_into(&entry.path(), &dst.join(entry.file_name()), report),
                Err(e) => report.record(src, e),
            }
        }
        return;
    }

    if !src.exists() || src.file_name().is_some_and(|name| name == NO_MEDIA_MARKER) {
        return;
    }

    match copy_file(src, dst) {
        Ok(()) => report.files_copied += 1,
        Err(e) => report.record(src, e),
    }
}

fn copy_file(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut input = File::open(src)?;
    let mut output = File::create(dst)?;
    io::copy(&mut input, &mut output)?;
    Ok(())
}
