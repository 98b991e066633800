//! Remote operations offered by the compile service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An operation the compile service can run on an uploaded POJO + JAR pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteOperation {
    /// Compile the POJO against the JAR into a runnable `.jar`.
    Compile,
    /// Package the POJO and JAR as a deployable `.war`.
    #[serde(rename = "makewar")]
    MakeWar,
}

impl RemoteOperation {
    /// Path segment of the servlet handling this operation.
    pub fn path(self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::MakeWar => "makewar",
        }
    }

    /// Extension (without the dot) of the artifact the service returns.
    pub fn output_extension(self) -> &'static str {
        match self {
            Self::Compile => "jar",
            Self::MakeWar => "war",
        }
    }
}

impl fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Returned when an operation name is not one the compile service offers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported remote operation: {0:?}")]
pub struct ParseOperationError(pub String);

impl FromStr for RemoteOperation {
    type Err = ParseOperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compile" => Ok(Self::Compile),
            "makewar" => Ok(Self::MakeWar),
            other => Err(ParseOperationError(other.to_string())),
        }
    }
}
