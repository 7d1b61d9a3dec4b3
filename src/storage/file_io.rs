//! File I/O helpers for project store files
//!
//! JSON lists and maps in the project store are replaced atomically so a
//! reader never observes a half-written list.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::InterchangeError;

/// Read JSON from a file, returning a default value if the file doesn't exist
///
/// An empty file also yields the default; the project store creates some
/// list files before they have content.
pub fn read_json<T, P>(path: P) -> Result<T, InterchangeError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() || fs::metadata(path).map(|m| m.len() == 0).unwrap_or(false) {
        return Ok(T::default());
    }

    let file = File::open(path).map_err(|e| {
        InterchangeError::Storage(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| {
        InterchangeError::Storage(format!("Failed to parse {}: {}", path.display(), e))
    })
}

/// Write JSON to a file atomically (write to temp, then rename)
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), InterchangeError>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    ensure_parent(path)?;

    let temp_path = temp_sibling(path);
    let file = File::create(&temp_path)
        .map_err(|e| InterchangeError::Storage(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, data)
        .map_err(|e| InterchangeError::Storage(format!("Failed to serialize data: {}", e)))?;

    writer
        .flush()
        .map_err(|e| InterchangeError::Storage(format!("Failed to flush data: {}", e)))?;

    writer
        .get_ref()
        .sync_all()
        .map_err(|e| InterchangeError::Storage(format!("Failed to sync data: {}", e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        InterchangeError::Storage(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}

/// Write a plain text file, creating parent directories
pub fn write_text<P: AsRef<Path>>(path: P, contents: &str) -> Result<(), InterchangeError> {
    let path = path.as_ref();
    ensure_parent(path)?;
    fs::write(path, contents).map_err(|e| {
        InterchangeError::Storage(format!("Failed to write {}: {}", path.display(), e))
    })
}

fn ensure_parent(path: &Path) -> Result<(), InterchangeError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            InterchangeError::Storage(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> std::path::PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct TestData {
        name: String,
        value: i32,
    }

    #[test]
    fn test_read_nonexistent_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let data: TestData = read_json(temp_dir.path().join("nonexistent")).unwrap();
        assert_eq!(data, TestData::default());
    }

    #[test]
    fn test_read_empty_file_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("local_library");
        fs::write(&path, "").unwrap();

        let data: Vec<String> = read_json(&path).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("permission");

        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        write_json_atomic(&path, &data).unwrap();
        let loaded: TestData = read_json(&path).unwrap();
        assert_eq!(data, loaded);
        assert!(!temp_dir.path().join("nested/permission.tmp").exists());
    }

    #[test]
    fn test_invalid_json_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken");
        fs::write(&path, "not json at all").unwrap();

        let err = read_json::<TestData, _>(&path).unwrap_err();
        assert!(matches!(err, InterchangeError::Storage(_)));
    }

    #[test]
    fn test_write_text_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("files").join("service");
        write_text(&path, "a.B\nc.D").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "a.B\nc.D");
    }
}
