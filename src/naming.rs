//! Backup archive naming and collision avoidance
//!
//! Archive names come from a user template. Supported placeholders:
//!
//! - `$projectName`, `$versionName`, `$versionCode`, `$pkgName`
//! - `$timeInMs`: milliseconds since the Unix epoch
//! - `$time(<format>)`: the current time in a strftime format
//!
//! A template that cannot be expanded falls back to
//! `<name> v<version> (<package>, <code>) <time>`.

use std::fmt::{Display, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, TimeZone};
use regex::{Captures, Regex};
use tracing::warn;

use crate::error::{InterchangeError, InterchangeResult};

/// Extension of backup archives
pub const ARCHIVE_EXTENSION: &str = "swb";

/// Appended once per retry when a name is taken
pub const DUPLICATE_SUFFIX: &str = "_d";

const FALLBACK_TIME_FORMAT: &str = "%Y-%-m-%dT%H%M%S";

const TIME_TOKEN_OPEN: &str = "$time(";

/// Project values available to a name template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameFields {
    pub project_name: String,
    pub version_name: String,
    pub version_code: String,
    pub package_name: String,
}

impl NameFields {
    /// Project name with path separators removed
    fn safe_project_name(&self) -> String {
        self.project_name.replace(['/', '\\'], "")
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$(?:time\((.*?)\)|timeInMs|projectName|versionName|versionCode|pkgName)")
            .expect("placeholder pattern is a valid regex")
    })
}

/// Expand a name template
///
/// Fails if a `$time(...)` format is invalid or unterminated, or if the
/// result is not usable as a single file name.
pub fn expand_template<Tz>(
    template: &str,
    fields: &NameFields,
    now: &DateTime<Tz>,
) -> InterchangeResult<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let project_name = fields.safe_project_name();
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in placeholder_pattern().captures_iter(template) {
        let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
        push_literal(&mut out, &template[last..whole.start])?;
        last = whole.end;

        match &caps[0] {
            "$projectName" => out.push_str(&project_name),
            "$versionName" => out.push_str(&fields.version_name),
            "$versionCode" => out.push_str(&fields.version_code),
            "$pkgName" => out.push_str(&fields.package_name),
            "$timeInMs" => out.push_str(&now.timestamp_millis().to_string()),
            _ => push_time(&mut out, &caps, now)?,
        }
    }
    push_literal(&mut out, &template[last..])?;

    if out.trim().is_empty() || out.contains(['/', '\\']) {
        return Err(InterchangeError::Config(format!(
            "Backup name template yields an unusable file name: {:?}",
            out
        )));
    }
    Ok(out)
}

fn push_literal(out: &mut String, text: &str) -> InterchangeResult<()> {
    if text.contains(TIME_TOKEN_OPEN) {
        return Err(InterchangeError::Config(format!(
            "Unterminated {}...) in backup name: {:?}",
            TIME_TOKEN_OPEN, text
        )));
    }
    out.push_str(text);
    Ok(())
}

fn push_time<Tz>(
    out: &mut String,
    caps: &Captures<'_>,
    now: &DateTime<Tz>,
) -> InterchangeResult<()>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let format = caps.get(1).map_or("", |m| m.as_str());
    write!(out, "{}", now.format(format)).map_err(|_| {
        InterchangeError::Config(format!("Invalid time format in backup name: {}", format))
    })
}

/// The name used when the template cannot be expanded
pub fn fallback_name<Tz>(fields: &NameFields, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{} v{} ({}, {}) {}",
        fields.safe_project_name(),
        fields.version_name,
        fields.package_name,
        fields.version_code,
        now.format(FALLBACK_TIME_FORMAT)
    )
}

/// Expand `template`, falling back to [`fallback_name`] on failure
pub fn backup_file_name<Tz>(template: &str, fields: &NameFields, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    expand_template(template, fields, now).unwrap_or_else(|e| {
        warn!(error = %e, "failed to parse custom backup file name, using default");
        fallback_name(fields, now)
    })
}

/// First free path `dir/<stem>[_d…][.ext]`
///
/// Tries at most `max_attempts` candidates, each adding one more
/// [`DUPLICATE_SUFFIX`].
pub fn unique_path(
    dir: &Path,
    stem: &str,
    extension: Option<&str>,
    max_attempts: u32,
) -> InterchangeResult<PathBuf> {
    let attempts = max_attempts.max(1);
    let mut name = stem.to_string();
    let mut candidate = PathBuf::new();

    for _ in 0..attempts {
        candidate = match extension {
            Some(ext) => dir.join(format!("{}.{}", name, ext)),
            None => dir.join(&name),
        };
        if !candidate.exists() {
            return Ok(candidate);
        }
        name.push_str(DUPLICATE_SUFFIX);
    }

    Err(InterchangeError::NamingCollision {
        path: candidate,
        attempts,
    })
}
