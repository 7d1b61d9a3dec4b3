//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the engines.

pub mod backup;
pub mod import;
pub mod inspect;

pub use backup::{handle_backup, handle_list_backups, handle_restore};
pub use import::handle_import;
pub use inspect::{handle_config, handle_init, handle_inspect};
