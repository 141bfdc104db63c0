//! Acceptance policies

use edm_model::DiagnosticCounts;
use serde::{Deserialize, Serialize};

/// Policy deciding whether a compiled model is accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AcceptancePolicy {
    /// Accept whatever was found; diagnostics are only reported
    AcceptAll,

    /// Reject when any error was found
    #[default]
    FailOnErrors,

    /// Reject when any error or warning was found
    FailOnWarnings,
}

impl AcceptancePolicy {
    /// Whether a model with these diagnostic counts is accepted.
    #[must_use]
    pub fn accepts(self, counts: DiagnosticCounts) -> bool {
        match self {
            Self::AcceptAll => true,
            Self::FailOnErrors => counts.errors == 0,
            Self::FailOnWarnings => counts.total() == 0,
        }
    }
}
