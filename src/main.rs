use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use project_interchange::cli::{
    handle_backup, handle_config, handle_import, handle_init, handle_inspect,
    handle_list_backups, handle_restore,
};
use project_interchange::config::{Settings, StorePaths};

#[derive(Parser)]
#[command(
    name = "pxi",
    version,
    about = "Backup, restore and import visual app projects",
    long_about = "pxi packages projects of the local project store into portable .swb \
                  archives, restores them under a new project id, and imports \
                  conventionally structured Android projects."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Back up a project into a .swb archive
    Backup {
        /// Project id
        project_id: String,
        /// Project name used for the archive folder and file name
        #[arg(short, long)]
        name: Option<String>,
        /// Include the project's local libraries
        #[arg(long)]
        local_libs: bool,
        /// JSON file with the custom block definitions to include
        #[arg(long, value_name = "FILE")]
        custom_blocks: Option<PathBuf>,
    },

    /// Restore a .swb archive as a new project
    Restore {
        /// Path to the archive
        archive: PathBuf,
        /// Destination project id (default: next free id)
        #[arg(short, long)]
        project_id: Option<String>,
        /// Also restore archived local libraries missing from the store
        #[arg(long)]
        local_libs: bool,
    },

    /// Import a zipped Android project
    Import {
        /// Path to the zip file
        archive: PathBuf,
        /// Destination project id (default: next free id)
        #[arg(short, long)]
        project_id: Option<String>,
        /// Maven-layout repository to resolve dependencies from
        #[arg(long, value_name = "DIR")]
        repo: Option<PathBuf>,
    },

    /// Decrypt and print a project descriptor
    Inspect {
        /// Project id
        project_id: String,
    },

    /// List backup archives
    Backups,

    /// Show configuration
    Config,

    /// Create the store directories and write the settings file
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    // Initialize paths and settings
    let paths = StorePaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    match cli.command {
        Commands::Backup {
            project_id,
            name,
            local_libs,
            custom_blocks,
        } => handle_backup(&paths, &settings, &project_id, name, local_libs, custom_blocks)?,
        Commands::Restore {
            archive,
            project_id,
            local_libs,
        } => handle_restore(&paths, &settings, &archive, project_id, local_libs)?,
        Commands::Import {
            archive,
            project_id,
            repo,
        } => handle_import(&paths, &settings, &archive, project_id, repo)?,
        Commands::Inspect { project_id } => handle_inspect(&paths, &project_id)?,
        Commands::Backups => handle_list_backups(&paths, &settings)?,
        Commands::Config => handle_config(&paths, &settings),
        Commands::Init => handle_init(&paths, &settings)?,
    }

    Ok(())
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();
}
