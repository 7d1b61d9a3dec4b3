//! Project Interchange - backup, restore and import for visual app projects
//!
//! This library packages a project of the local project store into a single
//! portable archive, restores such an archive under a new project id, and
//! imports conventionally structured Android projects into the native
//! project layout.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Store path layout and user settings
//! - `error`: Custom error types
//! - `models`: Project descriptor and dependency coordinates
//! - `crypto`: Fixed-key descriptor codec
//! - `archive`: Directory ⇄ zip archive codec
//! - `storage`: Tree copy with marker files, JSON helpers, library lists
//! - `metadata`: Build descriptor and manifest extraction
//! - `deps`: Serialized dependency resolution
//! - `naming`: Archive naming and collision avoidance
//! - `registry`: Progress, cancellation and library toggles
//! - `backup`: Backup and restore engines
//! - `import`: Foreign project importer
//!
//! # Example
//!
//! ```rust,ignore
//! use project_interchange::config::{Settings, StorePaths};
//! use project_interchange::backup::BackupEngine;
//!
//! let paths = StorePaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let outcome = BackupEngine::new(paths, settings).backup("601", "Demo");
//! ```

pub mod archive;
pub mod backup;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod deps;
pub mod error;
pub mod import;
pub mod metadata;
pub mod models;
pub mod naming;
pub mod registry;
pub mod storage;

pub use error::{InterchangeError, InterchangeResult};
