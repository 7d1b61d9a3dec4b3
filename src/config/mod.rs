//! Configuration module for project interchange
//!
//! This module provides configuration management including:
//! - Project store path resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::{ResourceBucket, StorePaths};
pub use settings::Settings;
