//! CLI command handler for foreign project import

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::config::{Settings, StorePaths};
use crate::deps::LocalRepositoryResolver;
use crate::import::ForeignProjectImporter;
use crate::registry::FileLibraryRegistry;

/// Handle `import <archive>`
pub fn handle_import(
    paths: &StorePaths,
    settings: &Settings,
    archive: &Path,
    project_id: Option<String>,
    repo: Option<PathBuf>,
) -> Result<()> {
    if !archive.is_file() {
        bail!("File not found: {}", archive.display());
    }

    let project_id = match project_id {
        Some(id) => id,
        None => paths.next_project_id()?,
    };
    let repo = repo.unwrap_or_else(|| paths.repository_dir());

    let resolver = LocalRepositoryResolver::new(repo, paths.local_libs_dir());
    let registry = FileLibraryRegistry::new(paths.clone());
    let progress = |message: &str| println!("  {}", message);

    println!("Importing {} as project {}", archive.display(), project_id);
    let outcome = ForeignProjectImporter::new(paths.clone(), &resolver, &registry, &progress)
        .with_max_name_attempts(settings.max_name_attempts)
        .import(archive, &project_id);

    if !outcome.success {
        bail!(
            "Import failed: {}",
            outcome.error.unwrap_or_else(|| "unknown error".into())
        );
    }

    println!("Import complete! Project id: {}", outcome.project_id);
    if !outcome.dependency_errors.is_empty() {
        println!();
        println!("Some dependencies could not be resolved:");
        for message in outcome.dependency_messages() {
            println!("  - {}", message);
        }
    }
    if !outcome.copy_failures.is_empty() {
        println!("Warning: {} file(s) could not be copied", outcome.copy_failures.len());
    }

    Ok(())
}
