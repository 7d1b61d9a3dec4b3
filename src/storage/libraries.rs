//! Enabled local-library list of a project
//!
//! Stored as a JSON array under `data/<id>/local_library`. Each append is a
//! read-modify-write of the whole file; concurrent writers against the same
//! project must be serialized by the caller.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::file_io::{read_json, write_json_atomic};
use crate::error::InterchangeResult;

/// One enabled library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalLibrary {
    /// Library directory name under the shared local-libs directory
    #[serde(default)]
    pub name: String,
    /// Coordinate the library was resolved from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jar_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dex_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub res_path: Option<String>,
    /// Fields written by other tools, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LocalLibrary {
    /// Entry for an artifact stored in the shared local-libs directory
    pub fn for_artifact(local_libs_dir: &Path, name: &str, dependency: &str) -> Self {
        let dir = local_libs_dir.join(name);
        let path = |file: &str| Some(dir.join(file).to_string_lossy().into_owned());
        Self {
            name: name.to_string(),
            dependency: Some(dependency.to_string()),
            jar_path: path("classes.jar"),
            dex_path: path("classes.dex"),
            manifest_path: path("AndroidManifest.xml"),
            res_path: path("res"),
            extra: Map::new(),
        }
    }

    /// Directory holding the library's files, derived from its dex path
    pub fn library_dir(&self) -> Option<PathBuf> {
        let dex = self.dex_path.as_deref()?;
        Path::new(dex).parent().map(Path::to_path_buf)
    }
}

/// Handle on a project's `local_library` file
#[derive(Debug, Clone)]
pub struct LocalLibraryList {
    path: PathBuf,
}

impl LocalLibraryList {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Whether the list file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load all entries; a missing file is an empty list
    pub fn load(&self) -> InterchangeResult<Vec<LocalLibrary>> {
        read_json(&self.path)
    }

    /// Replace the list with an empty one
    pub fn clear(&self) -> InterchangeResult<()> {
        write_json_atomic(&self.path, &Vec::<LocalLibrary>::new())
    }

    /// Append entries to the stored list
    pub fn append(&self, entries: impl IntoIterator<Item = LocalLibrary>) -> InterchangeResult<()> {
        let mut libraries = self.load()?;
        libraries.extend(entries);
        write_json_atomic(&self.path, &libraries)
    }
}
