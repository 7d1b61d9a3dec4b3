//! Foreign Android project import
//!
//! Turns a zipped, conventionally structured Android project into a native
//! project:
//!
//! 1. unpack into a new `cache/<archive stem>_unzipped[_d…]` folder
//! 2. locate the application module folder
//! 3. read `build.gradle(.kts)` and `src/main/AndroidManifest.xml`
//! 4. write the encrypted descriptor
//! 5. copy `java`, `res`, `assets` and `jniLibs`
//! 6. resolve declared dependencies into the enabled-library list
//! 7. write permissions, services, receivers and application components
//! 8. enable the `appcompat` library
//!
//! Missing inputs in steps 1-3 fail the import. Dependency and copy failures
//! are collected in the [`ImportOutcome`] and never fail it.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};
use tracing::{debug, error, info};

use crate::archive;
use crate::config::{Settings, StorePaths};
use crate::crypto::write_descriptor;
use crate::deps::{DependencyOrchestrator, DependencyResolver};
use crate::error::{InterchangeError, InterchangeResult};
use crate::metadata::{
    dependency_declarations, parse_build_descriptor, parse_manifest, resolve_app_label,
    ManifestInfo, DEFAULT_APP_LABEL,
};
use crate::models::{
    DependencyFailure, ProjectDescriptor, KEY_APP_NAME, KEY_PACKAGE_NAME, KEY_SCHEMA_VERSION,
    KEY_VERSION_CODE, KEY_VERSION_NAME, KEY_WORKSPACE_NAME, SCHEMA_VERSION,
};
use crate::registry::{CancellationToken, LibraryRegistry, ProgressSink};
use crate::storage::{
    copy, write_json_atomic, write_text, CopyReport, LocalLibraryList, TempWorkspace,
};

/// Conventional name of the application module folder
pub const APP_FOLDER: &str = "app";

/// File that marks the root of a Gradle build
pub const BUILD_ROOT_MARKER: &str = "gradlew";

/// Library enabled on every imported project
pub const APPCOMPAT_LIBRARY: &str = "appcompat";

/// Result of an import run
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    pub success: bool,
    /// Why the import failed
    pub error: Option<String>,
    /// Id the project was imported as
    pub project_id: String,
    /// Dependencies that could not be resolved; the import still succeeds
    pub dependency_errors: Vec<DependencyFailure>,
    /// Source files that could not be copied
    pub copy_failures: Vec<String>,
}

impl ImportOutcome {
    /// Human-readable dependency failure messages
    pub fn dependency_messages(&self) -> Vec<String> {
        self.dependency_errors.iter().map(ToString::to_string).collect()
    }
}

/// Find the application module folder inside an unpacked project
///
/// Looks for `app/` at the top level first, then for a child folder holding
/// a `gradlew` script and uses its `app/`.
pub fn locate_app_folder(root: &Path) -> Option<PathBuf> {
    let direct = root.join(APP_FOLDER);
    if direct.is_dir() {
        return Some(direct);
    }

    let mut children: Vec<PathBuf> = fs::read_dir(root)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    children.sort();

    children
        .into_iter()
        .find(|dir| dir.join(BUILD_ROOT_MARKER).exists())
        .map(|dir| dir.join(APP_FOLDER))
        .filter(|app| app.is_dir())
}

/// Find the build descriptor of an application module
pub fn find_build_descriptor(app_folder: &Path) -> Option<PathBuf> {
    ["build.gradle", "build.gradle.kts"]
        .into_iter()
        .map(|name| app_folder.join(name))
        .find(|path| path.is_file())
}

/// Workspace name derived from an application label: ASCII alphanumerics only
pub fn workspace_name(label: &str) -> String {
    let name: String = label.chars().filter(char::is_ascii_alphanumeric).collect();
    if name.is_empty() {
        DEFAULT_APP_LABEL
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect()
    } else {
        name
    }
}

/// Imports foreign project archives into the project store
pub struct ForeignProjectImporter<'a> {
    paths: StorePaths,
    resolver: &'a dyn DependencyResolver,
    registry: &'a dyn LibraryRegistry,
    progress: &'a dyn ProgressSink,
    cancel: CancellationToken,
    max_name_attempts: u32,
}

impl<'a> ForeignProjectImporter<'a> {
    pub fn new(
        paths: StorePaths,
        resolver: &'a dyn DependencyResolver,
        registry: &'a dyn LibraryRegistry,
        progress: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            paths,
            resolver,
            registry,
            progress,
            cancel: CancellationToken::new(),
            max_name_attempts: Settings::default().max_name_attempts,
        }
    }

    /// Bound on the suffixes tried for the scratch folder name
    pub fn with_max_name_attempts(mut self, attempts: u32) -> Self {
        self.max_name_attempts = attempts;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Import the project in `archive_path` as project `project_id`
    pub fn import(&self, archive_path: &Path, project_id: &str) -> ImportOutcome {
        let mut outcome = ImportOutcome {
            project_id: project_id.to_string(),
            ..ImportOutcome::default()
        };

        match self.run(archive_path, project_id, &mut outcome) {
            Ok(()) => {
                info!(
                    project_id,
                    dependency_errors = outcome.dependency_errors.len(),
                    "project imported"
                );
                outcome.success = true;
            }
            Err(e) => {
                error!(project_id, error = %e, "import failed");
                outcome.error = Some(e.to_string());
            }
        }
        outcome
    }

    fn run(
        &self,
        archive_path: &Path,
        project_id: &str,
        outcome: &mut ImportOutcome,
    ) -> InterchangeResult<()> {
        self.progress.report("Unpacking project");
        let stem = archive_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "import".to_string());
        let scratch = TempWorkspace::unique(
            &self.paths.cache_dir(),
            &format!("{}_unzipped", stem),
            self.max_name_attempts,
        )?;
        archive::unpack_file(archive_path, scratch.path()).map_err(|e| {
            InterchangeError::ArchiveRead(format!("Couldn't unzip the project: {}", e))
        })?;

        self.cancel.check()?;
        self.progress.report("Reading project metadata");
        let app = locate_app_folder(scratch.path()).ok_or_else(|| {
            InterchangeError::missing("Unable to find 'app' folder in the unzipped project.")
        })?;
        debug!(app = %app.display(), "application module located");

        let build_file = find_build_descriptor(&app).ok_or_else(|| {
            InterchangeError::missing("build.gradle or build.gradle.kts not found in app folder")
        })?;
        let gradle = fs::read_to_string(&build_file).map_err(|e| {
            InterchangeError::Io(format!("Failed to read {}: {}", build_file.display(), e))
        })?;
        let build = parse_build_descriptor(&gradle);

        let main = app.join("src").join("main");
        let manifest_path = main.join("AndroidManifest.xml");
        if !manifest_path.is_file() {
            return Err(InterchangeError::missing("AndroidManifest.xml not found"));
        }
        let manifest_xml = fs::read_to_string(&manifest_path).map_err(|e| {
            InterchangeError::Io(format!("Failed to read {}: {}", manifest_path.display(), e))
        })?;
        let manifest = parse_manifest(&manifest_xml)?;
        let label = resolve_app_label(&manifest, &manifest_path);

        self.cancel.check()?;
        let mut descriptor = ProjectDescriptor::new(project_id);
        descriptor.set(KEY_PACKAGE_NAME, build.application_id.unwrap_or_default());
        descriptor.set(KEY_VERSION_NAME, build.version_name.unwrap_or_default());
        descriptor.set(KEY_VERSION_CODE, build.version_code.unwrap_or_default());
        descriptor.set(KEY_WORKSPACE_NAME, workspace_name(&label));
        descriptor.set(KEY_APP_NAME, label);
        descriptor.set(KEY_SCHEMA_VERSION, SCHEMA_VERSION);
        write_descriptor(&self.paths.project_file(project_id), &descriptor).map_err(|e| {
            InterchangeError::Descriptor(format!("Couldn't write to the project file: {}", e))
        })?;

        self.cancel.check()?;
        self.progress.report("Copying sources");
        let mut copies = CopyReport::default();
        for (src, dst) in [
            ("java", self.paths.java_dir(project_id)),
            ("res", self.paths.android_res_dir(project_id)),
            ("assets", self.paths.assets_dir(project_id)),
            ("jniLibs", self.paths.native_libs_dir(project_id)),
        ] {
            copies.merge(copy(&main.join(src), &dst));
        }
        outcome.copy_failures = copies.failures;

        self.cancel.check()?;
        let libraries = LocalLibraryList::new(self.paths.local_library_file(project_id));
        libraries.clear()?;
        let orchestrator =
            DependencyOrchestrator::new(self.resolver, libraries, self.paths.local_libs_dir());
        let declarations = dependency_declarations(&gradle);
        outcome.dependency_errors =
            orchestrator.resolve_all(declarations.as_slice(), self.progress, &self.cancel);

        self.cancel.check()?;
        self.progress.report("Injecting manifest components");
        self.inject_manifest(project_id, &manifest)?;

        self.cancel.check()?;
        let mut configuration = Map::new();
        configuration.insert("material3".to_string(), Value::Bool(true));
        self.registry
            .enable_library(project_id, APPCOMPAT_LIBRARY, configuration)?;

        self.progress.report("Import finished");
        Ok(())
    }

    fn inject_manifest(&self, project_id: &str, manifest: &ManifestInfo) -> InterchangeResult<()> {
        write_json_atomic(
            self.paths.permission_file(project_id),
            &json!(manifest.permissions),
        )?;
        write_text(
            self.paths.service_file(project_id),
            &manifest.services.join("\n"),
        )?;
        write_text(
            self.paths.broadcast_file(project_id),
            &manifest.receivers.join("\n"),
        )?;
        write_text(
            self.paths.app_components_file(project_id),
            &manifest.application_components,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::read_descriptor;
    use crate::deps::{Resolution, ResolutionCallback};
    use crate::models::DependencyCoordinate;
    use crate::registry::FileLibraryRegistry;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const BUILD_GRADLE_KTS: &str = r#"
plugins { id("com.android.application") }

android {
    defaultConfig {
        applicationId = "com.example.app"
        versionCode = 7
        versionName = "1.2"
    }
}

dependencies {
    implementation("androidx.core:core:1.12.0")
    implementation("com.example:missing:9.9")
    implementation("not-a-coordinate")
}
"#;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android">
    <uses-permission android:name="android.permission.INTERNET" />
    <application android:label="@string/app_name">
        <activity android:name=".MainActivity" />
        <service android:name=".SyncService" />
        <receiver android:name=".BootReceiver" />
        <receiver android:name=".AlarmReceiver" />
    </application>
</manifest>
"#;

    const STRINGS: &str =
        r#"<resources><string name="app_name">My Demo App!</string></resources>"#;

    /// Resolves `androidx.core:core` immediately, reports everything else missing
    struct FakeResolver;

    impl DependencyResolver for FakeResolver {
        fn resolve(&self, coordinate: &DependencyCoordinate, on_complete: ResolutionCallback) {
            if coordinate.artifact == "core" {
                on_complete(Resolution::Resolved(vec!["core-1.12.0".into()]));
            } else {
                on_complete(Resolution::NotFound);
            }
        }
    }

    /// Write a foreign project to `root/<layout>` and zip it
    fn make_archive(temp: &TempDir, nested: bool, with_manifest: bool) -> PathBuf {
        let project = temp.path().join("source");
        let build_root = if nested {
            let root = project.join("MyApplication");
            fs::create_dir_all(&root).unwrap();
            fs::write(root.join(BUILD_ROOT_MARKER), "#!/bin/sh").unwrap();
            root
        } else {
            project.clone()
        };
        let main = build_root.join("app/src/main");
        fs::create_dir_all(main.join("java/com/example/app")).unwrap();
        fs::create_dir_all(main.join("res/values")).unwrap();
        fs::create_dir_all(main.join("assets")).unwrap();
        fs::write(build_root.join("app/build.gradle.kts"), BUILD_GRADLE_KTS).unwrap();
        if with_manifest {
            fs::write(main.join("AndroidManifest.xml"), MANIFEST).unwrap();
        }
        fs::write(main.join("res/values/strings.xml"), STRINGS).unwrap();
        fs::write(
            main.join("java/com/example/app/MainActivity.java"),
            "package com.example.app;",
        )
        .unwrap();
        fs::write(main.join("assets/data.json"), "{}").unwrap();

        let archive = temp.path().join("MyApplication.zip");
        archive::pack_to_file(&project, &archive).unwrap();
        archive
    }

    fn import(temp: &TempDir, archive: &Path, project_id: &str) -> (ImportOutcome, Vec<String>) {
        let paths = StorePaths::with_base_dir(temp.path().join("store"));
        let registry = FileLibraryRegistry::new(paths.clone());
        let messages = Mutex::new(Vec::new());
        let progress = |m: &str| messages.lock().unwrap().push(m.to_string());

        let outcome = ForeignProjectImporter::new(paths, &FakeResolver, &registry, &progress)
            .import(archive, project_id);
        let messages = messages.into_inner().unwrap();
        (outcome, messages)
    }

    #[test]
    fn test_import_populates_descriptor() {
        let temp = TempDir::new().unwrap();
        let archive = make_archive(&temp, false, true);

        let (outcome, _) = import(&temp, &archive, "777");
        assert!(outcome.success, "{:?}", outcome.error);
        assert_eq!(outcome.project_id, "777");

        let paths = StorePaths::with_base_dir(temp.path().join("store"));
        let descriptor = read_descriptor(&paths.project_file("777")).unwrap();
        assert_eq!(descriptor.project_id().as_deref(), Some("777"));
        assert_eq!(descriptor.package_name(), "com.example.app");
        assert_eq!(descriptor.version_name(), "1.2");
        assert_eq!(descriptor.version_code(), "7");
        assert_eq!(descriptor.get_str(KEY_APP_NAME).as_deref(), Some("My Demo App!"));
        assert_eq!(descriptor.workspace_name(), "MyDemoApp");
        assert_eq!(descriptor.get(KEY_SCHEMA_VERSION), Some(&json!(6)));
    }

    #[test]
    fn test_import_copies_sources_and_injects_manifest() {
        let temp = TempDir::new().unwrap();
        let archive = make_archive(&temp, false, true);
        let (outcome, _) = import(&temp, &archive, "601");
        assert!(outcome.success, "{:?}", outcome.error);

        let paths = StorePaths::with_base_dir(temp.path().join("store"));
        assert!(paths
            .java_dir("601")
            .join("com/example/app/MainActivity.java")
            .is_file());
        assert!(paths.android_res_dir("601").join("values/strings.xml").is_file());
        assert!(paths.assets_dir("601").join("data.json").is_file());

        let permissions: Vec<String> =
            serde_json::from_str(&fs::read_to_string(paths.permission_file("601")).unwrap())
                .unwrap();
        assert_eq!(permissions, vec!["android.permission.INTERNET"]);
        assert_eq!(
            fs::read_to_string(paths.service_file("601")).unwrap(),
            ".SyncService"
        );
        assert_eq!(
            fs::read_to_string(paths.broadcast_file("601")).unwrap(),
            ".BootReceiver\n.AlarmReceiver"
        );
        let components = fs::read_to_string(paths.app_components_file("601")).unwrap();
        assert!(components.starts_with(r#"<activity android:name=".MainActivity" />"#));
        assert!(components.ends_with(r#"<receiver android:name=".AlarmReceiver" />"#));

        let settings = FileLibraryRegistry::new(paths.clone()).load("601").unwrap();
        let appcompat = &settings[APPCOMPAT_LIBRARY];
        assert!(appcompat.is_enabled());
        assert_eq!(appcompat.configurations.get("material3"), Some(&json!(true)));

        // Scratch folder removed
        assert!(!paths.cache_dir().join("MyApplication_unzipped").exists());
    }

    #[test]
    fn test_dependency_failures_do_not_fail_import() {
        let temp = TempDir::new().unwrap();
        let archive = make_archive(&temp, false, true);
        let (outcome, messages) = import(&temp, &archive, "601");

        assert!(outcome.success);
        assert_eq!(
            outcome.dependency_messages(),
            vec!["Artifact not found: com.example:missing:9.9"]
        );
        let resolving: Vec<&str> = messages
            .iter()
            .map(String::as_str)
            .filter(|m| m.starts_with("Resolving dependency"))
            .collect();
        assert_eq!(
            resolving,
            vec![
                "Resolving dependency 1/3: androidx.core:core:1.12.0",
                "Resolving dependency 2/3: com.example:missing:9.9",
                "Resolving dependency 3/3: not-a-coordinate",
            ]
        );

        let paths = StorePaths::with_base_dir(temp.path().join("store"));
        let libraries = LocalLibraryList::new(paths.local_library_file("601"))
            .load()
            .unwrap();
        assert_eq!(libraries.len(), 1);
        assert_eq!(libraries[0].name, "core-1.12.0");
    }

    #[test]
    fn test_nested_build_root() {
        let temp = TempDir::new().unwrap();
        let archive = make_archive(&temp, true, true);
        let (outcome, _) = import(&temp, &archive, "601");
        assert!(outcome.success, "{:?}", outcome.error);
    }

    #[test]
    fn test_missing_manifest_is_structural() {
        let temp = TempDir::new().unwrap();
        let archive = make_archive(&temp, false, false);
        let (outcome, _) = import(&temp, &archive, "601");

        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("AndroidManifest.xml not found"));

        let paths = StorePaths::with_base_dir(temp.path().join("store"));
        assert!(!paths.project_file("601").exists());
        assert!(!paths.cache_dir().join("MyApplication_unzipped").exists());
    }

    #[test]
    fn test_missing_app_folder() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("source");
        fs::create_dir_all(project.join("lib")).unwrap();
        fs::write(project.join("lib/readme.txt"), "not an app").unwrap();
        let archive = temp.path().join("broken.zip");
        archive::pack_to_file(&project, &archive).unwrap();

        let (outcome, _) = import(&temp, &archive, "601");
        assert!(!outcome.success);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Unable to find 'app' folder in the unzipped project.")
        );
    }

    #[test]
    fn test_non_zip_archive_fails_without_leftovers() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("MyApplication.zip");
        fs::write(&archive, b"this is not a zip archive").unwrap();

        let (outcome, _) = import(&temp, &archive, "601");

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("Couldn't unzip the project"));
        let paths = StorePaths::with_base_dir(temp.path().join("store"));
        assert!(!paths.project_file("601").exists());
        let leftovers: Vec<_> = fs::read_dir(paths.cache_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert!(leftovers.is_empty(), "{:?}", leftovers);
    }

    #[test]
    fn test_existing_scratch_folder_is_left_alone() {
        let temp = TempDir::new().unwrap();
        let archive = make_archive(&temp, false, true);
        let paths = StorePaths::with_base_dir(temp.path().join("store"));
        let occupied = paths.cache_dir().join("MyApplication_unzipped");
        fs::create_dir_all(&occupied).unwrap();
        fs::write(occupied.join("keep"), "user data").unwrap();

        let (outcome, _) = import(&temp, &archive, "601");

        assert!(outcome.success, "{:?}", outcome.error);
        assert_eq!(fs::read_to_string(occupied.join("keep")).unwrap(), "user data");
        assert!(!paths.cache_dir().join("MyApplication_unzipped_d").exists());
    }

    #[test]
    fn test_cancelled_import() {
        let temp = TempDir::new().unwrap();
        let archive = make_archive(&temp, false, true);
        let paths = StorePaths::with_base_dir(temp.path().join("store"));
        let registry = FileLibraryRegistry::new(paths.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome =
            ForeignProjectImporter::new(paths.clone(), &FakeResolver, &registry, &|_: &str| {})
                .with_cancellation(cancel)
                .import(&archive, "601");

        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("Operation cancelled"));
        assert!(!paths.project_file("601").exists());
    }

    #[test]
    fn test_workspace_name() {
        assert_eq!(workspace_name("My Demo App!"), "MyDemoApp");
        assert_eq!(workspace_name("Ünïcode"), "ncode");
        assert_eq!(workspace_name("日本"), "ImportedProject");
    }
}
