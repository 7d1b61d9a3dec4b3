//! Android manifest and string resource extraction

use std::fs;
use std::path::Path;

use roxmltree::{Document, Node};
use tracing::{debug, warn};

use crate::error::{InterchangeError, InterchangeResult};

/// Label used when the manifest names no resolvable application label
pub const DEFAULT_APP_LABEL: &str = "Imported Project";

const STRING_REF_PREFIX: &str = "@string/";

/// The application label as written in the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelRef {
    /// `@string/<key>`
    Resource(String),
    /// Any other non-empty value
    Literal(String),
}

/// Everything the importer needs from `AndroidManifest.xml`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestInfo {
    pub permissions: Vec<String>,
    pub services: Vec<String>,
    pub receivers: Vec<String>,
    pub label: Option<LabelRef>,
    /// Source text of every element directly under `<application>`, concatenated
    pub application_components: String,
}

/// Parse manifest text
pub fn parse_manifest(xml: &str) -> InterchangeResult<ManifestInfo> {
    let doc = Document::parse(xml)
        .map_err(|e| InterchangeError::Metadata(format!("Invalid manifest: {}", e)))?;

    let mut info = ManifestInfo::default();
    for node in doc.descendants().filter(Node::is_element) {
        let target = match node.tag_name().name() {
            "uses-permission" => &mut info.permissions,
            "service" => &mut info.services,
            "receiver" => &mut info.receivers,
            _ => continue,
        };
        if let Some(name) = name_attribute(&node) {
            target.push(name.to_string());
        }
    }

    if let Some(application) = doc
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "application")
    {
        info.label = attribute_by_local_name(&application, "label").and_then(|value| {
            if let Some(key) = value.strip_prefix(STRING_REF_PREFIX) {
                Some(LabelRef::Resource(key.to_string()))
            } else if value.is_empty() {
                None
            } else {
                Some(LabelRef::Literal(value.to_string()))
            }
        });

        info.application_components = application
            .children()
            .filter(Node::is_element)
            .map(|child| &xml[child.range()])
            .collect();
    }

    Ok(info)
}

/// Find `<string name="key">` in a `strings.xml` document
pub fn find_string_resource(strings_xml: &str, key: &str) -> Option<String> {
    let doc = match Document::parse(strings_xml) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(error = %e, "unreadable strings.xml");
            return None;
        }
    };

    doc.descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "string")
        .find(|n| n.attribute("name") == Some(key))
        .and_then(|n| n.text())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Resolve the application label of a parsed manifest
///
/// A `@string/` reference is looked up in `res/values/strings.xml` next to
/// the manifest. A literal label is returned as is. Anything else falls back
/// to [`DEFAULT_APP_LABEL`].
pub fn resolve_app_label(info: &ManifestInfo, manifest_path: &Path) -> String {
    let resolved = match &info.label {
        Some(LabelRef::Literal(label)) => Some(label.clone()),
        Some(LabelRef::Resource(key)) => {
            let strings = manifest_path
                .parent()
                .map(|dir| dir.join("res").join("values").join("strings.xml"));
            strings
                .and_then(|path| fs::read_to_string(path).ok())
                .and_then(|content| find_string_resource(&content, key))
        }
        None => None,
    };

    let label = resolved.unwrap_or_else(|| DEFAULT_APP_LABEL.to_string());
    debug!(label = %label, "application label resolved");
    label
}

fn name_attribute<'a>(node: &Node<'a, '_>) -> Option<&'a str> {
    attribute_by_local_name(node, "name")
}

fn attribute_by_local_name<'a>(node: &Node<'a, '_>, local: &str) -> Option<&'a str> {
    node.attributes()
        .find(|attr| attr.name() == local)
        .map(|attr| attr.value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="com.example.app">

    <uses-permission android:name="android.permission.INTERNET" />
    <uses-permission android:name="android.permission.CAMERA" />

    <application
        android:label="@string/app_name"
        android:theme="@style/AppTheme">
        <activity android:name=".MainActivity" android:exported="true" />
        <service android:name=".SyncService" />
        <receiver android:name=".BootReceiver" />
    </application>
</manifest>
"#;

    fn write_app(manifest: &str, strings: Option<&str>) -> (TempDir, std::path::PathBuf) {
        let temp = TempDir::new().unwrap();
        let main = temp.path().join("src/main");
        fs::create_dir_all(main.join("res/values")).unwrap();
        let manifest_path = main.join("AndroidManifest.xml");
        fs::write(&manifest_path, manifest).unwrap();
        if let Some(strings) = strings {
            fs::write(main.join("res/values/strings.xml"), strings).unwrap();
        }
        (temp, manifest_path)
    }

    #[test]
    fn test_components_and_permissions() {
        let info = parse_manifest(MANIFEST).unwrap();
        assert_eq!(
            info.permissions,
            vec!["android.permission.INTERNET", "android.permission.CAMERA"]
        );
        assert_eq!(info.services, vec![".SyncService"]);
        assert_eq!(info.receivers, vec![".BootReceiver"]);
        assert_eq!(info.label, Some(LabelRef::Resource("app_name".into())));
    }

    #[test]
    fn test_application_components_are_verbatim() {
        let info = parse_manifest(MANIFEST).unwrap();
        assert_eq!(
            info.application_components,
            concat!(
                r#"<activity android:name=".MainActivity" android:exported="true" />"#,
                r#"<service android:name=".SyncService" />"#,
                r#"<receiver android:name=".BootReceiver" />"#,
            )
        );
    }

    #[test]
    fn test_label_from_string_resource() {
        let (_temp, path) = write_app(
            MANIFEST,
            Some(r#"<resources><string name="app_name">Sketch Demo</string></resources>"#),
        );
        let info = parse_manifest(MANIFEST).unwrap();
        assert_eq!(resolve_app_label(&info, &path), "Sketch Demo");
    }

    #[test]
    fn test_label_literal() {
        let manifest = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
            <application android:label="Literal App" />
        </manifest>"#;
        let (_temp, path) = write_app(manifest, None);
        let info = parse_manifest(manifest).unwrap();
        assert_eq!(resolve_app_label(&info, &path), "Literal App");
    }

    #[test]
    fn test_label_fallback() {
        let manifest = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android">
            <application />
        </manifest>"#;
        let (_temp, path) = write_app(manifest, None);
        let info = parse_manifest(manifest).unwrap();
        assert_eq!(resolve_app_label(&info, &path), DEFAULT_APP_LABEL);
    }

    #[test]
    fn test_unresolved_string_reference_falls_back() {
        let (_temp, path) = write_app(
            MANIFEST,
            Some(r#"<resources><string name="other">Nope</string></resources>"#),
        );
        let info = parse_manifest(MANIFEST).unwrap();
        assert_eq!(resolve_app_label(&info, &path), DEFAULT_APP_LABEL);
    }

    #[test]
    fn test_invalid_manifest() {
        let err = parse_manifest("<manifest><application></manifest>").unwrap_err();
        assert!(matches!(err, InterchangeError::Metadata(_)));
    }
}
