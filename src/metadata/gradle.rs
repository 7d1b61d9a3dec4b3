//! Build descriptor (`build.gradle` / `build.gradle.kts`) scanning
//!
//! There is no Gradle parser here. Values are recovered with a fixed chain of
//! patterns that covers both the Groovy and Kotlin DSLs:
//!
//! 1. `key "value"` / `key = "value"`
//! 2. `key 'value'` / `key = 'value'`
//! 3. `key 7` / `key = 1.2` (bare numbers)
//!
//! The first pattern that matches anywhere in the text wins.

use std::sync::OnceLock;

use regex::Regex;

/// Declaration keywords whose quoted argument is a dependency coordinate
pub const DEPENDENCY_KEYWORDS: [&str; 4] =
    ["api", "implementation", "compileOnly", "testImplementation"];

/// Values recovered from a build descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildMetadata {
    pub application_id: Option<String>,
    pub version_name: Option<String>,
    pub version_code: Option<String>,
}

/// Extract `applicationId`, `versionName` and `versionCode`
pub fn parse_build_descriptor(content: &str) -> BuildMetadata {
    BuildMetadata {
        application_id: gradle_value(content, "applicationId"),
        version_name: gradle_value(content, "versionName"),
        version_code: gradle_value(content, "versionCode"),
    }
}

/// Look up a single property using the double-quote, single-quote, bare-number chain
pub fn gradle_value(content: &str, key: &str) -> Option<String> {
    let key = regex::escape(key);
    let patterns = [
        format!(r#"{}\s*=?\s*"([^"]+)""#, key),
        format!(r#"{}\s*=?\s*'([^']+)'"#, key),
        format!(r#"{}\s*=?\s*([\d.]+)"#, key),
    ];

    patterns.iter().find_map(|pattern| {
        Regex::new(pattern)
            .ok()?
            .captures(content)
            .map(|caps| caps[1].to_string())
    })
}

/// Every quoted argument of a dependency declaration, in source order
///
/// The strings are returned as written; callers validate them as
/// coordinates.
pub fn dependency_declarations(content: &str) -> Vec<String> {
    dependency_pattern()
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .collect()
}

fn dependency_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let keywords = DEPENDENCY_KEYWORDS.join("|");
        Regex::new(&format!(r#"\b(?:{})\s*\(?\s*['"]([^'"]*)['"]"#, keywords))
            .expect("dependency pattern is a valid regex")
    })
}
