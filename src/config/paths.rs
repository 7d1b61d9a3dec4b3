//! Path management for the project store
//!
//! Every location the interchange engines read or write lives here, so the
//! on-disk layout of the project store is described in one place.
//!
//! ## Path Resolution Order
//!
//! 1. `PXI_HOME` environment variable (if set)
//! 2. `~/.sketchware` under the user's home directory

use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;

use crate::error::{InterchangeError, InterchangeResult};

/// One of the fixed resource categories of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceBucket {
    Fonts,
    Icons,
    Images,
    Sounds,
}

impl ResourceBucket {
    /// All buckets, in archive order
    pub const ALL: [ResourceBucket; 4] = [
        ResourceBucket::Fonts,
        ResourceBucket::Icons,
        ResourceBucket::Images,
        ResourceBucket::Sounds,
    ];

    /// Directory name used both in the store and under `resources/` in archives
    pub fn dir_name(self) -> &'static str {
        match self {
            ResourceBucket::Fonts => "fonts",
            ResourceBucket::Icons => "icons",
            ResourceBucket::Images => "images",
            ResourceBucket::Sounds => "sounds",
        }
    }

    /// Whether the bucket directory carries a media opt-out marker
    pub fn is_marked(self) -> bool {
        self != ResourceBucket::Icons
    }
}

/// Manages all paths of the project store
#[derive(Debug, Clone)]
pub struct StorePaths {
    /// Root of the project store
    base_dir: PathBuf,
    /// Backup directory, relative to the root
    backup_path: PathBuf,
}

impl StorePaths {
    /// Create a new StorePaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> InterchangeResult<Self> {
        let base_dir = if let Ok(custom) = std::env::var("PXI_HOME") {
            PathBuf::from(custom)
        } else {
            BaseDirs::new()
                .map(|dirs| dirs.home_dir().join(".sketchware"))
                .ok_or_else(|| {
                    InterchangeError::Config("Could not determine home directory".into())
                })?
        };

        Ok(Self::with_base_dir(base_dir))
    }

    /// Create StorePaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            backup_path: PathBuf::from("backups"),
        }
    }

    /// Use a different backup directory, relative to the store root
    pub fn with_backup_path(mut self, backup_path: impl Into<PathBuf>) -> Self {
        self.backup_path = backup_path.into();
        self
    }

    /// Get the store root
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Directory where backup archives are written
    pub fn backup_dir(&self) -> PathBuf {
        self.base_dir.join(&self.backup_path)
    }

    /// Scratch directory for import unpacking
    pub fn cache_dir(&self) -> PathBuf {
        self.base_dir.join("cache")
    }

    /// Directory holding one sub-directory per project id
    pub fn project_list_dir(&self) -> PathBuf {
        self.base_dir.join("mysc").join("list")
    }

    /// Encrypted descriptor file of a project
    pub fn project_file(&self, project_id: &str) -> PathBuf {
        self.project_list_dir().join(project_id).join("project")
    }

    /// Per-project data directory
    pub fn data_dir(&self, project_id: &str) -> PathBuf {
        self.base_dir.join("data").join(project_id)
    }

    /// Resource bucket directory of a project
    pub fn resource_dir(&self, bucket: ResourceBucket, project_id: &str) -> PathBuf {
        self.base_dir
            .join("resources")
            .join(bucket.dir_name())
            .join(project_id)
    }

    /// Enabled-library list of a project
    pub fn local_library_file(&self, project_id: &str) -> PathBuf {
        self.data_dir(project_id).join("local_library")
    }

    /// Library toggles of a project
    pub fn library_settings_file(&self, project_id: &str) -> PathBuf {
        self.data_dir(project_id).join("library_settings.json")
    }

    /// Permission list of a project
    pub fn permission_file(&self, project_id: &str) -> PathBuf {
        self.data_dir(project_id).join("permission")
    }

    /// Service declarations of a project
    pub fn service_file(&self, project_id: &str) -> PathBuf {
        self.files_dir(project_id).join("service")
    }

    /// Broadcast receiver declarations of a project
    pub fn broadcast_file(&self, project_id: &str) -> PathBuf {
        self.files_dir(project_id).join("broadcast")
    }

    /// Java sources of a project
    pub fn java_dir(&self, project_id: &str) -> PathBuf {
        self.files_dir(project_id).join("java")
    }

    /// Android resources of a project
    pub fn android_res_dir(&self, project_id: &str) -> PathBuf {
        self.files_dir(project_id).join("resource")
    }

    /// Assets of a project
    pub fn assets_dir(&self, project_id: &str) -> PathBuf {
        self.files_dir(project_id).join("assets")
    }

    /// Native libraries of a project
    pub fn native_libs_dir(&self, project_id: &str) -> PathBuf {
        self.files_dir(project_id).join("native_libs")
    }

    /// Injected manifest application components of a project
    pub fn app_components_file(&self, project_id: &str) -> PathBuf {
        self.data_dir(project_id)
            .join("Injection")
            .join("androidmanifest")
            .join("app_components.txt")
    }

    /// Shared directory of all downloaded local libraries
    pub fn local_libs_dir(&self) -> PathBuf {
        self.base_dir.join("libs").join("local_libs")
    }

    /// Maven-layout repository the CLI resolves dependencies from
    pub fn repository_dir(&self) -> PathBuf {
        self.base_dir.join("libs").join("repository")
    }

    fn files_dir(&self, project_id: &str) -> PathBuf {
        self.data_dir(project_id).join("files")
    }

    /// Ensure the top-level directories exist
    pub fn ensure_directories(&self) -> InterchangeResult<()> {
        for dir in [
            self.base_dir.clone(),
            self.backup_dir(),
            self.project_list_dir(),
            self.local_libs_dir(),
        ] {
            fs::create_dir_all(&dir).map_err(|e| {
                InterchangeError::Io(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }

    /// Allocate the next free project id
    ///
    /// Ids are numeric directory names under the project list; the first
    /// project gets `601`.
    pub fn next_project_id(&self) -> InterchangeResult<String> {
        let list_dir = self.project_list_dir();
        if !list_dir.exists() {
            return Ok("601".to_string());
        }

        let mut highest = 600u64;
        for entry in fs::read_dir(&list_dir)? {
            let entry = entry?;
            if let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u64>().ok())
            {
                highest = highest.max(id);
            }
        }

        Ok((highest + 1).to_string())
    }
}
