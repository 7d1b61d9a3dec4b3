//! Dependency coordinates and resolution failures

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A `group:artifact:version` triple declared in a build descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyCoordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl DependencyCoordinate {
    /// Create a coordinate from its parts
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for DependencyCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

/// Error returned when a declaration is not a three-part coordinate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCoordinate(pub String);

impl fmt::Display for InvalidCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid dependency format: {}", self.0)
    }
}

impl std::error::Error for InvalidCoordinate {}

impl FromStr for DependencyCoordinate {
    type Err = InvalidCoordinate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [group, artifact, version] => Ok(Self::new(*group, *artifact, *version)),
            _ => Err(InvalidCoordinate(s.to_string())),
        }
    }
}

/// Why a single dependency could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyFailure {
    /// The resolver found the artifact but could not fetch it
    DownloadFailed {
        coordinate: DependencyCoordinate,
        reason: String,
    },
    /// No repository knows the artifact
    NotFound { coordinate: DependencyCoordinate },
    /// Waiting for the resolver was interrupted
    Interrupted { coordinate: DependencyCoordinate },
    /// Resolved, but the project's library list could not be updated
    Unrecorded {
        coordinate: DependencyCoordinate,
        reason: String,
    },
}

impl DependencyFailure {
    /// The coordinate this failure belongs to
    pub fn coordinate(&self) -> &DependencyCoordinate {
        match self {
            Self::DownloadFailed { coordinate, .. }
            | Self::NotFound { coordinate }
            | Self::Interrupted { coordinate }
            | Self::Unrecorded { coordinate, .. } => coordinate,
        }
    }
}

impl fmt::Display for DependencyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DownloadFailed { coordinate, reason } => {
                write!(f, "Failed to download dependency: {} ({})", coordinate, reason)
            }
            Self::NotFound { coordinate } => write!(f, "Artifact not found: {}", coordinate),
            Self::Interrupted { coordinate } => {
                write!(f, "Dependency download interrupted: {}", coordinate)
            }
            Self::Unrecorded { coordinate, reason } => {
                write!(f, "Failed to enable dependency: {} ({})", coordinate, reason)
            }
        }
    }
}
