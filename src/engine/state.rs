use std::fmt;

use crate::util::quote_version;

/// Outcome of comparing the stored manifest version with the published one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    UpToDate {
        version: String,
    },
    UpdateAvailable {
        current_version: String,
        latest_version: String,
    },
}

impl GateDecision {
    /// Version tokens are opaque: only byte equality counts.
    pub fn decide(current_version: &str, latest_version: &str) -> Self {
        if current_version == latest_version {
            GateDecision::UpToDate {
                version: current_version.to_owned(),
            }
        } else {
            GateDecision::UpdateAvailable {
                current_version: current_version.to_owned(),
                latest_version: latest_version.to_owned(),
            }
        }
    }

    pub fn skip_update(&self) -> bool {
        matches!(self, GateDecision::UpToDate { .. })
    }

    /// Named step outputs for the workflow, in emission order.
    pub fn outputs(&self) -> Vec<(&'static str, String)> {
        match self {
            GateDecision::UpToDate { .. } => vec![("skip_update", "true".into())],
            GateDecision::UpdateAvailable {
                current_version,
                latest_version,
            } => vec![
                ("skip_update", "false".into()),
                ("current_version", quote_version(current_version)),
                ("latest_version", latest_version.clone()),
            ],
        }
    }
}

/// Why a run stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunError {
    /// Bungie answered, but with a non-Success `ErrorStatus`.
    Remote {
        status: String,
        code: i64,
        message: String,
    },
    /// Transport, parse or filesystem failure.
    Failed(String),
}

impl From<String> for RunError {
    fn from(message: String) -> Self {
        RunError::Failed(message)
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Remote {
                status, message, ..
            } => write!(f, "Bungie ErrorStatus \"{status}\": \"{message}\""),
            RunError::Failed(message) => f.write_str(message),
        }
    }
}
