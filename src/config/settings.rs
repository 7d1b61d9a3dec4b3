//! User settings for project interchange
//!
//! Controls where backups go, how backup archives are named, and which
//! optional content a backup or restore carries along.

use serde::{Deserialize, Serialize};

use super::paths::StorePaths;
use crate::error::InterchangeError;

/// Default backup file name template
pub const DEFAULT_BACKUP_TEMPLATE: &str =
    "$projectName v$versionName ($pkgName, $versionCode) $time(%Y-%m-%dT%H%M%S)";

/// User settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Backup directory, relative to the store root
    #[serde(default = "default_backup_path")]
    pub backup_path: String,

    /// Backup archive name template
    #[serde(default = "default_backup_file_name")]
    pub backup_file_name: String,

    /// Carry the project's local libraries in backups and restore them
    #[serde(default)]
    pub include_local_libs: bool,

    /// Carry the project's used custom blocks in backups
    #[serde(default)]
    pub include_custom_blocks: bool,

    /// How many disambiguated names are tried before giving up
    #[serde(default = "default_max_name_attempts")]
    pub max_name_attempts: u32,
}

fn default_schema_version() -> u32 {
    1
}

fn default_backup_path() -> String {
    "backups".to_string()
}

fn default_backup_file_name() -> String {
    DEFAULT_BACKUP_TEMPLATE.to_string()
}

fn default_max_name_attempts() -> u32 {
    32
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            backup_path: default_backup_path(),
            backup_file_name: default_backup_file_name(),
            include_local_libs: false,
            include_custom_blocks: false,
            max_name_attempts: default_max_name_attempts(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_create(paths: &StorePaths) -> Result<Self, InterchangeError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                InterchangeError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                InterchangeError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &StorePaths) -> Result<(), InterchangeError> {
        std::fs::create_dir_all(paths.base_dir()).map_err(|e| {
            InterchangeError::Io(format!("Failed to create store directory: {}", e))
        })?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            InterchangeError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents).map_err(|e| {
            InterchangeError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }

    /// Store paths with this configuration's backup directory applied
    pub fn apply_to(&self, paths: StorePaths) -> StorePaths {
        paths.with_backup_path(&self.backup_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.backup_path, "backups");
        assert_eq!(settings.backup_file_name, DEFAULT_BACKUP_TEMPLATE);
        assert!(!settings.include_local_libs);
        assert!(!settings.include_custom_blocks);
        assert_eq!(settings.max_name_attempts, 32);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = StorePaths::with_base_dir(temp_dir.path().to_path_buf());

        let settings = Settings {
            include_local_libs: true,
            backup_file_name: "$projectName-$timeInMs".into(),
            ..Settings::default()
        };
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert!(loaded.include_local_libs);
        assert_eq!(loaded.backup_file_name, "$projectName-$timeInMs");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = StorePaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{"backup_path": "swb"}"#).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.backup_path, "swb");
        assert_eq!(loaded.max_name_attempts, 32);

        let applied = loaded.apply_to(paths);
        assert_eq!(applied.backup_dir(), temp_dir.path().join("swb"));
    }
}
