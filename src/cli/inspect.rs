//! Store commands: `inspect`, `config` and `init`

use anyhow::{Context, Result};

use crate::config::{Settings, StorePaths};
use crate::crypto::read_descriptor;

/// Handle `inspect <id>`: decrypt and print a project descriptor
pub fn handle_inspect(paths: &StorePaths, project_id: &str) -> Result<()> {
    let path = paths.project_file(project_id);
    let descriptor = read_descriptor(&path)
        .with_context(|| format!("Could not read project {}", project_id))?;

    println!("Project {}", project_id);
    println!("{}", "=".repeat(8 + project_id.len()));
    for (key, value) in descriptor.iter() {
        match value.as_str() {
            Some(text) => println!("{:<16} {}", key, text),
            None => println!("{:<16} {}", key, value),
        }
    }
    Ok(())
}

/// Handle `config`: show store paths and settings
pub fn handle_config(paths: &StorePaths, settings: &Settings) {
    let paths = settings.clone().apply_to(paths.clone());

    println!("Project Interchange Configuration");
    println!("=================================");
    println!("Store directory:     {}", paths.base_dir().display());
    println!("Settings file:       {}", paths.settings_file().display());
    println!("Backup directory:    {}", paths.backup_dir().display());
    println!("Local libraries:     {}", paths.local_libs_dir().display());
    println!("Dependency repo:     {}", paths.repository_dir().display());
    println!();
    println!("Settings:");
    println!("  Backup file name:      {}", settings.backup_file_name);
    println!("  Include local libs:    {}", settings.include_local_libs);
    println!("  Include custom blocks: {}", settings.include_custom_blocks);
    println!("  Max name attempts:     {}", settings.max_name_attempts);
}

/// Handle `init`: create the store layout and persist the current settings
pub fn handle_init(paths: &StorePaths, settings: &Settings) -> Result<()> {
    let paths = settings.apply_to(paths.clone());
    println!("Initializing store at: {}", paths.base_dir().display());
    paths
        .ensure_directories()
        .context("Failed to create store directories")?;
    settings.save(&paths).context("Failed to save settings")?;
    println!("Settings written to {}", paths.settings_file().display());
    Ok(())
}
