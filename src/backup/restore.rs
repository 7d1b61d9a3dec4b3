//! Backup restoration
//!
//! Unpacks a backup archive into a scratch folder under the backup directory,
//! rebinds its descriptor to the destination project id and merges the
//! content into the live project store.

use std::fs;
use std::path::Path;

use tracing::{debug, error, info};

use crate::archive;
use crate::config::{ResourceBucket, Settings, StorePaths};
use crate::crypto::{read_descriptor, write_descriptor};
use crate::error::{InterchangeError, InterchangeResult};
use crate::registry::CancellationToken;
use crate::storage::{copy, copy_safe, create_marker, CopyReport, TempWorkspace};

/// Result of a restore run
#[derive(Debug, Clone, Default)]
pub struct RestoreOutcome {
    pub success: bool,
    /// Why the restore failed
    pub error: Option<String>,
    /// Id the project was restored as
    pub project_id: String,
    /// Files that could not be merged into the store
    pub copy_failures: Vec<String>,
}

/// Restores backup archives into the project store
pub struct RestoreEngine {
    paths: StorePaths,
    settings: Settings,
    cancel: CancellationToken,
}

impl RestoreEngine {
    /// Create a new RestoreEngine
    pub fn new(paths: StorePaths, settings: Settings) -> Self {
        Self {
            paths: settings.apply_to(paths),
            settings,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Restore `archive_path` as project `project_id`
    ///
    /// Whatever project id the archive carries is replaced.
    pub fn restore(&self, archive_path: &Path, project_id: &str) -> RestoreOutcome {
        let mut copies = CopyReport::default();
        let result = self.run(archive_path, project_id, &mut copies);

        let error = match result {
            Ok(()) => {
                info!(project_id, archive = %archive_path.display(), "project restored");
                None
            }
            Err(e) => {
                error!(project_id, error = %e, "restore failed");
                Some(e.to_string())
            }
        };

        RestoreOutcome {
            success: error.is_none(),
            error,
            project_id: project_id.to_string(),
            copy_failures: copies.failures,
        }
    }

    fn run(
        &self,
        archive_path: &Path,
        project_id: &str,
        copies: &mut CopyReport,
    ) -> InterchangeResult<()> {
        let stem = archive_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "restore".to_string());
        let scratch = TempWorkspace::unique(
            &self.paths.backup_dir(),
            &stem,
            self.settings.max_name_attempts,
        )?;

        archive::unpack_file(archive_path, scratch.path()).map_err(|e| {
            InterchangeError::ArchiveRead(format!("Couldn't unzip the backup: {}", e))
        })?;
        debug!(scratch = %scratch.path().display(), "archive unpacked");

        self.cancel.check()?;
        let project = scratch.join("project");
        if !project.is_file() {
            return Err(InterchangeError::missing("Backup contains no project file"));
        }
        let mut descriptor = read_descriptor(&project).map_err(|e| {
            InterchangeError::Descriptor(format!("Couldn't read the project file: {}", e))
        })?;

        descriptor.set_project_id(project_id);
        write_descriptor(&project, &descriptor).map_err(|e| {
            InterchangeError::Descriptor(format!("Couldn't write to the project file: {}", e))
        })?;

        self.cancel.check()?;
        copies.merge(copy(&scratch.join("data"), &self.paths.data_dir(project_id)));

        self.cancel.check()?;
        for bucket in ResourceBucket::ALL {
            let dst = self.paths.resource_dir(bucket, project_id);
            copies.merge(copy_safe(
                &scratch.join("resources").join(bucket.dir_name()),
                &dst,
            ));
            if bucket.is_marked() {
                create_marker(&dst)?;
            }
        }

        self.cancel.check()?;
        let project_file = self.paths.project_file(project_id);
        copies.merge(copy(&project, &project_file));
        if !project_file.is_file() {
            return Err(InterchangeError::Io(format!(
                "Failed to write {}",
                project_file.display()
            )));
        }

        if self.settings.include_local_libs {
            self.cancel.check()?;
            self.merge_local_libs(&scratch.join("local_libs"), copies)?;
        }

        Ok(())
    }

    /// Copy archived libraries into the shared local-libs directory,
    /// leaving libraries that already exist untouched
    fn merge_local_libs(&self, archived: &Path, copies: &mut CopyReport) -> InterchangeResult<()> {
        if !archived.is_dir() {
            return Ok(());
        }

        let local_libs = self.paths.local_libs_dir();
        for entry in fs::read_dir(archived)? {
            let entry = entry?;
            let target = local_libs.join(entry.file_name());
            if target.exists() {
                debug!(library = %target.display(), "library already present");
                continue;
            }
            fs::create_dir_all(&target)?;
            copies.merge(copy(&entry.path(), &target));
        }
        Ok(())
    }
}
