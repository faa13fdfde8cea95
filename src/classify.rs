use serde::{Deserialize, Serialize};

use crate::probe::ProbeError;

/// Marker strings radclient prints for the two definitive server verdicts.
pub const ACCEPT_MARKER: &str = "Access-Accept";
pub const REJECT_MARKER: &str = "Access-Reject";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthStatus {
    Success,
    Reject,
    Error,
}

impl AuthStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Reject => "REJECT",
            Self::Error => "ERROR",
        }
    }
}

/// Total mapping from a probe outcome to a status plus the raw output kept
/// for the per-request record. A probe failure replaces the output with the
/// failure diagnostic; a completed exchange with neither verdict marker is
/// an error, not a pending state.
pub fn classify(outcome: Result<String, ProbeError>) -> (AuthStatus, String) {
    match outcome {
        Err(err) => (AuthStatus::Error, err.to_string()),
        Ok(output) => {
            let status = if output.contains(ACCEPT_MARKER) {
                AuthStatus::Success
            } else if output.contains(REJECT_MARKER) {
                AuthStatus::Reject
            } else {
                AuthStatus::Error
            };
            (status, output)
        }
    }
}
