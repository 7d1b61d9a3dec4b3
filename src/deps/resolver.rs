//! Resolver backed by a Maven-layout directory on disk

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;

use tracing::debug;

use super::{DependencyResolver, Resolution, ResolutionCallback};
use crate::models::DependencyCoordinate;
use crate::storage::tree;

/// Resolves `group:artifact:version` against `<repo>/<group path>/<artifact>/<version>/`
///
/// Each artifact file found there is copied into `<local libs>/<file stem>/`.
/// `.jar` and `.dex` files are stored as `classes.jar` and `classes.dex`, the
/// names the enabled-library entries point at. The work runs on a spawned
/// thread, one per request.
#[derive(Debug, Clone)]
pub struct LocalRepositoryResolver {
    repository: PathBuf,
    local_libs_dir: PathBuf,
}

impl LocalRepositoryResolver {
    pub fn new(repository: impl Into<PathBuf>, local_libs_dir: impl Into<PathBuf>) -> Self {
        Self {
            repository: repository.into(),
            local_libs_dir: local_libs_dir.into(),
        }
    }

    /// Directory a coordinate lives in
    pub fn artifact_dir(&self, coordinate: &DependencyCoordinate) -> PathBuf {
        let mut dir = self.repository.clone();
        dir.extend(coordinate.group.split('.'));
        dir.join(&coordinate.artifact).join(&coordinate.version)
    }
}

impl DependencyResolver for LocalRepositoryResolver {
    fn resolve(&self, coordinate: &DependencyCoordinate, on_complete: ResolutionCallback) {
        let source = self.artifact_dir(coordinate);
        let local_libs_dir = self.local_libs_dir.clone();

        thread::spawn(move || {
            let resolution = if source.is_dir() {
                match install(&source, &local_libs_dir) {
                    Ok(names) => Resolution::Resolved(names),
                    Err(e) => Resolution::DownloadFailed(e.to_string()),
                }
            } else {
                debug!(path = %source.display(), "artifact directory missing");
                Resolution::NotFound
            };
            on_complete(resolution);
        });
    }
}

fn install(source: &Path, local_libs_dir: &Path) -> io::Result<Vec<String>> {
    let mut names = BTreeSet::new();

    for entry in fs::read_dir(source)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let file_name = match path.extension().and_then(|e| e.to_str()) {
            Some("jar") => "classes.jar".to_string(),
            Some("dex") => "classes.dex".to_string(),
            _ => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };

        let report = tree::copy(&path, &local_libs_dir.join(stem).join(file_name));
        if let Some(first) = report.failures.into_iter().next() {
            return Err(io::Error::other(first));
        }
        names.insert(stem.to_string());
    }

    Ok(names.into_iter().collect())
}
