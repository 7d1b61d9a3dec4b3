//! Cryptographic functions for project interchange
//!
//! Provides the fixed-key AES-128-CBC codec used for project descriptor files.

pub mod descriptor;

pub use descriptor::{decode, encode, read_descriptor, write_descriptor};
