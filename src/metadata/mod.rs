//! Metadata recovery from foreign project sources
//!
//! - `gradle`: pattern search over build descriptors
//! - `manifest`: DOM traversal of `AndroidManifest.xml` and `strings.xml`

pub mod gradle;
pub mod manifest;

pub use gradle::{dependency_declarations, gradle_value, parse_build_descriptor, BuildMetadata};
pub use manifest::{
    find_string_resource, parse_manifest, resolve_app_label, LabelRef, ManifestInfo,
    DEFAULT_APP_LABEL,
};
