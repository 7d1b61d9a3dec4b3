//! Project backup and restore
//!
//! # Architecture
//!
//! - `BackupEngine`: stages a live project and packs it into a `.swb` archive
//! - `RestoreEngine`: unpacks an archive and merges it into the store under a
//!   new project id
//!
//! Both engines are synchronous and report through outcome structs: `success`
//! plus an error message for fatal failures, and a list of per-file copy
//! failures that never fail the run on their own.
//!
//! # Example
//!
//! ```rust,ignore
//! use project_interchange::backup::{BackupEngine, RestoreEngine};
//! use project_interchange::config::{Settings, StorePaths};
//!
//! let paths = StorePaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//!
//! let outcome = BackupEngine::new(paths.clone(), settings.clone()).backup("601", "Demo");
//! if let Some(archive) = outcome.archive {
//!     let restored = RestoreEngine::new(paths, settings).restore(&archive, "602");
//!     assert!(restored.success);
//! }
//! ```

mod manager;
mod restore;

pub use manager::{
    dedupe_blocks, list_backups, BackupEngine, BackupInfo, BackupOutcome, CustomBlockSource,
    JsonFileBlockSource,
};
pub use restore::{RestoreEngine, RestoreOutcome};
