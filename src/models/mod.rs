//! Core data models
//!
//! - `descriptor`: the project descriptor record
//! - `dependency`: dependency coordinates and per-item resolution failures

pub mod dependency;
pub mod descriptor;

pub use dependency::{DependencyCoordinate, DependencyFailure};
pub use descriptor::{
    ProjectDescriptor, KEY_APP_NAME, KEY_PACKAGE_NAME, KEY_PROJECT_ID, KEY_SCHEMA_VERSION,
    KEY_VERSION_CODE, KEY_VERSION_NAME, KEY_WORKSPACE_NAME, SCHEMA_VERSION,
};
