//! Collaborator handles passed into the engines
//!
//! The engines never reach for process-wide state. Progress reporting, the
//! project library toggles, and cancellation are all explicit handles.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::StorePaths;
use crate::error::{InterchangeError, InterchangeResult};
use crate::storage::{read_json, write_json_atomic};

/// Receives human-readable progress messages
pub trait ProgressSink {
    fn report(&self, message: &str);
}

impl<F: Fn(&str)> ProgressSink for F {
    fn report(&self, message: &str) {
        self(message)
    }
}

/// Cooperative cancellation flag shared between a caller and an engine
#[derive(Debug, Default, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; engines stop at their next stage boundary
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Return [`InterchangeError::Cancelled`] if cancellation was requested
    pub fn check(&self) -> InterchangeResult<()> {
        if self.is_cancelled() {
            Err(InterchangeError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Per-project library toggles
pub trait LibraryRegistry {
    /// Mark a library enabled, merging the given configuration flags
    fn enable_library(
        &self,
        project_id: &str,
        library: &str,
        configuration: Map<String, Value>,
    ) -> InterchangeResult<()>;
}

/// Stored state of one library toggle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySetting {
    /// `"Y"` when enabled
    pub use_yn: String,
    #[serde(default)]
    pub configurations: Map<String, Value>,
}

impl LibrarySetting {
    pub fn is_enabled(&self) -> bool {
        self.use_yn == "Y"
    }
}

/// Library registry backed by `data/<id>/library_settings.json`
#[derive(Debug, Clone)]
pub struct FileLibraryRegistry {
    paths: StorePaths,
}

impl FileLibraryRegistry {
    pub fn new(paths: StorePaths) -> Self {
        Self { paths }
    }

    /// Load all library toggles of a project
    pub fn load(&self, project_id: &str) -> InterchangeResult<BTreeMap<String, LibrarySetting>> {
        read_json(self.paths.library_settings_file(project_id))
    }
}

impl LibraryRegistry for FileLibraryRegistry {
    fn enable_library(
        &self,
        project_id: &str,
        library: &str,
        configuration: Map<String, Value>,
    ) -> InterchangeResult<()> {
        let mut settings = self.load(project_id)?;
        let setting = settings.entry(library.to_string()).or_default();
        setting.use_yn = "Y".to_string();
        setting.configurations.extend(configuration);

        write_json_atomic(self.paths.library_settings_file(project_id), &settings)
    }
}
