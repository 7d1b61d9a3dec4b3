//! Backup and restore CLI commands

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::backup::{list_backups, BackupEngine, JsonFileBlockSource, RestoreEngine};
use crate::config::{Settings, StorePaths};
use crate::crypto::read_descriptor;
use crate::models::KEY_APP_NAME;

/// One row of the `backups` table
#[derive(Tabled)]
struct BackupRow {
    #[tabled(rename = "Project")]
    project: String,
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Modified")]
    modified: String,
}

/// Handle `backup <id>`
pub fn handle_backup(
    paths: &StorePaths,
    settings: &Settings,
    project_id: &str,
    name: Option<String>,
    local_libs: bool,
    custom_blocks: Option<PathBuf>,
) -> Result<()> {
    let mut settings = settings.clone();
    settings.include_local_libs |= local_libs;
    settings.include_custom_blocks |= custom_blocks.is_some();

    let project_name = match name {
        Some(name) => name,
        None => project_display_name(paths, project_id),
    };

    let source = custom_blocks.map(JsonFileBlockSource::new);
    let mut engine = BackupEngine::new(paths.clone(), settings);
    if let Some(source) = &source {
        engine = engine.with_custom_blocks(source);
    }

    println!("Backing up project {} ({})...", project_id, project_name);
    let outcome = engine.backup(project_id, &project_name);
    print_copy_failures(&outcome.copy_failures);

    match outcome.archive {
        Some(archive) if outcome.success => {
            println!("Backup created: {}", archive.display());
            Ok(())
        }
        _ => bail!(
            "Backup failed: {}",
            outcome.error.unwrap_or_else(|| "unknown error".into())
        ),
    }
}

/// Handle `restore <archive>`
pub fn handle_restore(
    paths: &StorePaths,
    settings: &Settings,
    archive: &Path,
    project_id: Option<String>,
    local_libs: bool,
) -> Result<()> {
    if !archive.is_file() {
        bail!("Backup not found: {}", archive.display());
    }

    let mut settings = settings.clone();
    settings.include_local_libs |= local_libs;

    let project_id = match project_id {
        Some(id) => id,
        None => paths.next_project_id()?,
    };

    println!("Restoring {} as project {}...", archive.display(), project_id);
    let outcome = RestoreEngine::new(paths.clone(), settings).restore(archive, &project_id);
    print_copy_failures(&outcome.copy_failures);

    if !outcome.success {
        bail!(
            "Restore failed: {}",
            outcome.error.unwrap_or_else(|| "unknown error".into())
        );
    }
    println!("Restore complete! Project id: {}", outcome.project_id);
    Ok(())
}

/// Handle `backups`
pub fn handle_list_backups(paths: &StorePaths, settings: &Settings) -> Result<()> {
    let backup_dir = settings.clone().apply_to(paths.clone()).backup_dir();
    let backups = list_backups(&backup_dir)?;

    if backups.is_empty() {
        println!("No backups found.");
        println!("Create one with: pxi backup <project id>");
        return Ok(());
    }

    let rows: Vec<BackupRow> = backups
        .iter()
        .map(|b| BackupRow {
            project: b.project.clone(),
            file: b.filename.clone(),
            size: format_size(b.size_bytes),
            modified: b
                .modified
                .map(|m| m.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".into()),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
    println!("Total: {} backup(s)", backups.len());
    Ok(())
}

/// Name shown for a project: workspace name, then app name, then the id
fn project_display_name(paths: &StorePaths, project_id: &str) -> String {
    read_descriptor(&paths.project_file(project_id))
        .ok()
        .and_then(|d| {
            let ws = d.workspace_name();
            if ws.is_empty() {
                d.get_str(KEY_APP_NAME)
            } else {
                Some(ws)
            }
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| project_id.to_string())
}

fn print_copy_failures(failures: &[String]) {
    if failures.is_empty() {
        return;
    }
    println!("Warning: {} item(s) could not be copied:", failures.len());
    for failure in failures {
        println!("  - {}", failure);
    }
}

/// Format a byte size for display
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
