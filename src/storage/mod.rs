//! Storage layer for the project store
//!
//! Provides JSON file helpers with atomic writes, the enabled-library list,
//! and the tree copy primitives used by backup, restore and import.

pub mod file_io;
pub mod libraries;
pub mod tree;

pub use file_io::{read_json, write_json_atomic, write_text};
pub use libraries::{LocalLibrary, LocalLibraryList};
pub use tree::{copy, copy_safe, create_marker, CopyReport, TempWorkspace, NO_MEDIA_MARKER};
