//! Backup engine
//!
//! Stages a copy of one live project in a fresh folder under the cache
//! directory, packs it into `<backup dir>/<project name>/<file name>.swb` and
//! removes the staging folder again.
//!
//! Archive layout:
//!
//! ```text
//! data/                 project data (plus data/custom_blocks when enabled)
//! resources/<bucket>/   one folder per resource bucket
//! project               encrypted descriptor
//! local_libs/<lib>/     enabled local libraries (optional)
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::archive;
use crate::config::{ResourceBucket, Settings, StorePaths};
use crate::crypto::read_descriptor;
use crate::error::{InterchangeError, InterchangeResult};
use crate::naming::{backup_file_name, unique_path, NameFields, ARCHIVE_EXTENSION};
use crate::registry::CancellationToken;
use crate::storage::{
    copy, copy_safe, create_marker, read_json, write_json_atomic, CopyReport, LocalLibraryList,
    TempWorkspace,
};

/// Supplies the block definitions a project uses
pub trait CustomBlockSource {
    fn used_blocks(&self, project_id: &str) -> InterchangeResult<Vec<Value>>;
}

/// Block definitions read from a JSON array file
#[derive(Debug, Clone)]
pub struct JsonFileBlockSource {
    path: PathBuf,
}

impl JsonFileBlockSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CustomBlockSource for JsonFileBlockSource {
    fn used_blocks(&self, _project_id: &str) -> InterchangeResult<Vec<Value>> {
        read_json(&self.path)
    }
}

/// Drop repeated definitions of the same opcode, keeping the first
///
/// Blocks are keyed by `opCode`, else by `name`. Unkeyed blocks are kept.
pub fn dedupe_blocks(blocks: Vec<Value>) -> Vec<Value> {
    let mut seen = HashSet::new();
    blocks
        .into_iter()
        .filter(|block| {
            let key = block
                .get("opCode")
                .or_else(|| block.get("name"))
                .and_then(Value::as_str);
            match key {
                Some(key) => seen.insert(key.to_string()),
                None => true,
            }
        })
        .collect()
}

/// Result of a backup run
#[derive(Debug, Clone, Default)]
pub struct BackupOutcome {
    pub success: bool,
    /// Why the backup failed
    pub error: Option<String>,
    /// The archive written
    pub archive: Option<PathBuf>,
    /// Files that could not be staged; the archive was still written
    pub copy_failures: Vec<String>,
}

/// Metadata about a backup archive on disk
#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub filename: String,
    pub path: PathBuf,
    /// Folder the archive sits in, normally the project name
    pub project: String,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Local>>,
}

/// Creates backup archives of live projects
pub struct BackupEngine<'a> {
    paths: StorePaths,
    settings: Settings,
    custom_blocks: Option<&'a dyn CustomBlockSource>,
    cancel: CancellationToken,
}

impl<'a> BackupEngine<'a> {
    /// Create a new BackupEngine
    ///
    /// The backup directory is taken from `settings`.
    pub fn new(paths: StorePaths, settings: Settings) -> Self {
        Self {
            paths: settings.apply_to(paths),
            settings,
            custom_blocks: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Source of custom block definitions, used when custom blocks are included
    pub fn with_custom_blocks(mut self, source: &'a dyn CustomBlockSource) -> Self {
        self.custom_blocks = Some(source);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Back up project `project_id` under the display name `project_name`
    pub fn backup(&self, project_id: &str, project_name: &str) -> BackupOutcome {
        let mut copies = CopyReport::default();
        match self.run(project_id, project_name, &mut copies) {
            Ok(archive) => {
                info!(
                    archive = %archive.display(),
                    failures = copies.failures.len(),
                    "backup created"
                );
                BackupOutcome {
                    success: true,
                    error: None,
                    archive: Some(archive),
                    copy_failures: copies.failures,
                }
            }
            Err(e) => {
                error!(project_id, error = %e, "backup failed");
                BackupOutcome {
                    success: false,
                    error: Some(e.to_string()),
                    archive: None,
                    copy_failures: copies.failures,
                }
            }
        }
    }

    fn run(
        &self,
        project_id: &str,
        project_name: &str,
        copies: &mut CopyReport,
    ) -> InterchangeResult<PathBuf> {
        let project_file = self.paths.project_file(project_id);
        if !project_file.exists() {
            return Err(InterchangeError::missing(format!(
                "Project {} not found",
                project_id
            )));
        }
        let descriptor = read_descriptor(&project_file)?;

        let fields = NameFields {
            project_name: project_name.to_string(),
            version_name: descriptor.version_name(),
            version_code: descriptor.version_code(),
            package_name: descriptor.package_name(),
        };
        let file_name = backup_file_name(&self.settings.backup_file_name, &fields, &Local::now());
        let folder_name = project_name.replace(['/', '\\'], "");

        let backup_dir = self.paths.backup_dir();
        let archive_path = unique_path(
            &backup_dir.join(&folder_name),
            &file_name,
            Some(ARCHIVE_EXTENSION),
            self.settings.max_name_attempts,
        )?;

        let staging = TempWorkspace::unique(
            &self.paths.cache_dir(),
            &format!("{}_temp", folder_name),
            self.settings.max_name_attempts,
        )?;
        debug!(staging = %staging.path().display(), "staging backup");

        self.cancel.check()?;
        let data = staging.join("data");
        copies.merge(copy_safe(&self.paths.data_dir(project_id), &data));

        self.cancel.check()?;
        for bucket in ResourceBucket::ALL {
            let dst = staging.join("resources").join(bucket.dir_name());
            copies.merge(copy_safe(&self.paths.resource_dir(bucket, project_id), &dst));
            if bucket.is_marked() {
                if let Err(e) = create_marker(&dst) {
                    warn!(bucket = bucket.dir_name(), error = %e, "failed to mark bucket");
                    copies.failures.push(format!("{}: {}", dst.display(), e));
                }
            }
        }

        self.cancel.check()?;
        copies.merge(copy(&project_file, &staging.join("project")));

        if self.settings.include_local_libs {
            self.cancel.check()?;
            self.stage_local_libs(project_id, &staging.join("local_libs"), copies);
        }

        if self.settings.include_custom_blocks {
            self.cancel.check()?;
            self.stage_custom_blocks(project_id, &data.join("custom_blocks"), copies);
        }

        self.cancel.check()?;
        if let Err(e) = archive::pack_to_file(staging.path(), &archive_path) {
            let _ = fs::remove_file(&archive_path);
            return Err(e);
        }

        Ok(archive_path)
    }

    fn stage_local_libs(&self, project_id: &str, dst: &Path, copies: &mut CopyReport) {
        let list = LocalLibraryList::new(self.paths.local_library_file(project_id));
        if !list.exists() {
            return;
        }

        let libraries = match list.load() {
            Ok(libraries) => libraries,
            Err(e) => {
                warn!(error = %e, "unreadable local library list, skipping local libs");
                return;
            }
        };

        for library in libraries {
            let Some(dir) = library.library_dir() else {
                debug!(library = %library.name, "library has no dex path");
                continue;
            };
            if let Some(name) = dir.file_name() {
                copies.merge(copy(&dir, &dst.join(name)));
            }
        }
    }

    fn stage_custom_blocks(&self, project_id: &str, dst: &Path, copies: &mut CopyReport) {
        let Some(source) = self.custom_blocks else {
            debug!("no custom block source configured");
            return;
        };

        let result = source
            .used_blocks(project_id)
            .and_then(|blocks| write_json_atomic(dst, &dedupe_blocks(blocks)));
        if let Err(e) = result {
            warn!(error = %e, "failed to stage custom blocks");
            copies.failures.push(format!("{}: {}", dst.display(), e));
        }
    }

    /// List all backup archives, newest first
    pub fn list_backups(&self) -> InterchangeResult<Vec<BackupInfo>> {
        list_backups(&self.paths.backup_dir())
    }
}

/// List every `.swb` archive up to one folder below `backup_dir`, newest first
pub fn list_backups(backup_dir: &Path) -> InterchangeResult<Vec<BackupInfo>> {
    if !backup_dir.exists() {
        return Ok(Vec::new());
    }

    let mut backups = Vec::new();
    for entry in WalkDir::new(backup_dir).min_depth(1).max_depth(2) {
        let entry = entry.map_err(|e| {
            InterchangeError::Io(format!("Failed to read backup directory: {}", e))
        })?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().map_or(true, |ext| ext != ARCHIVE_EXTENSION)
        {
            continue;
        }

        let metadata = entry.metadata().map_err(|e| {
            InterchangeError::Io(format!("Failed to read backup metadata: {}", e))
        })?;
        let project = if entry.depth() == 2 {
            path.parent()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            String::new()
        };

        backups.push(BackupInfo {
            filename: entry.file_name().to_string_lossy().into_owned(),
            path: path.to_path_buf(),
            project,
            size_bytes: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Local>::from),
        });
    }

    backups.sort_by(|a, b| b.modified.cmp(&a.modified));
    Ok(backups)
}
