//! Project descriptor model
//!
//! The descriptor is the small key/value record that identifies a project:
//! its id, package, version and display names. Keys are kept sorted so the
//! serialized form is canonical.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Project id key
pub const KEY_PROJECT_ID: &str = "sc_id";
/// Package name key
pub const KEY_PACKAGE_NAME: &str = "my_sc_pkg_name";
/// Version name key
pub const KEY_VERSION_NAME: &str = "sc_ver_name";
/// Version code key
pub const KEY_VERSION_CODE: &str = "sc_ver_code";
/// Workspace (project list) name key
pub const KEY_WORKSPACE_NAME: &str = "my_ws_name";
/// Application label key
pub const KEY_APP_NAME: &str = "my_app_name";
/// Internal schema version key
pub const KEY_SCHEMA_VERSION: &str = "sketchware_ver";

/// Schema version written by the importer
pub const SCHEMA_VERSION: i64 = 6;

/// Ordered mapping of descriptor keys to scalar values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectDescriptor {
    entries: BTreeMap<String, Value>,
}

impl ProjectDescriptor {
    /// Create an empty descriptor bound to a project id
    pub fn new(project_id: impl Into<String>) -> Self {
        let mut descriptor = Self::default();
        descriptor.set_project_id(project_id);
        descriptor
    }

    /// Get a raw value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Get a value rendered as text
    ///
    /// Numbers are rendered without quotes, so a version code stored either as
    /// `"7"` or `7` reads back as `7`.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.entries.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// The project id, if present
    pub fn project_id(&self) -> Option<String> {
        self.get_str(KEY_PROJECT_ID)
    }

    /// Rebind the descriptor to another project id
    pub fn set_project_id(&mut self, project_id: impl Into<String>) {
        self.set(KEY_PROJECT_ID, project_id.into());
    }

    /// Package name, or an empty string
    pub fn package_name(&self) -> String {
        self.get_str(KEY_PACKAGE_NAME).unwrap_or_default()
    }

    /// Version name, or an empty string
    pub fn version_name(&self) -> String {
        self.get_str(KEY_VERSION_NAME).unwrap_or_default()
    }

    /// Version code, or an empty string
    pub fn version_code(&self) -> String {
        self.get_str(KEY_VERSION_CODE).unwrap_or_default()
    }

    /// Workspace name, or an empty string
    pub fn workspace_name(&self) -> String {
        self.get_str(KEY_WORKSPACE_NAME).unwrap_or_default()
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the descriptor has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_sets_project_id() {
        let descriptor = ProjectDescriptor::new("601");
        assert_eq!(descriptor.project_id().as_deref(), Some("601"));
        assert_eq!(descriptor.len(), 1);
    }

    #[test]
    fn test_numeric_values_read_as_text() {
        let mut descriptor = ProjectDescriptor::new("601");
        descriptor.set(KEY_VERSION_CODE, 7);
        descriptor.set(KEY_SCHEMA_VERSION, json!(6));

        assert_eq!(descriptor.version_code(), "7");
        assert_eq!(descriptor.get_str(KEY_SCHEMA_VERSION).as_deref(), Some("6"));
        assert_eq!(descriptor.package_name(), "");
    }

    #[test]
    fn test_serializes_sorted() {
        let mut descriptor = ProjectDescriptor::new("601");
        descriptor.set(KEY_APP_NAME, "Demo");
        descriptor.set(KEY_PACKAGE_NAME, "com.example");

        let json = serde_json::to_string(&descriptor).unwrap();
        assert_eq!(
            json,
            r#"{"my_app_name":"Demo","my_sc_pkg_name":"com.example","sc_id":"601"}"#
        );
    }
}
