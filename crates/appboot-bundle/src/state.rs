//! Verification state machine for one candidate bundle.

use serde::{Deserialize, Serialize};

/// Progress of a single verification pass.
///
/// State transitions:
/// ```text
/// Unverified → ManifestLoaded → SelfVerified → EntryVerified* → Trusted
///          Any non-terminal state → Rejected (on error)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationState {
    /// Nothing has been read yet
    #[default]
    Unverified,
    /// Manifest parsed and structurally valid
    ManifestLoaded,
    /// Manifest self-signature checked
    SelfVerified,
    /// At least one listed resource checked
    EntryVerified,
    /// Every check passed
    Trusted,
    /// A check failed; the bundle must not be loaded
    Rejected,
}

impl VerificationState {
    /// Check if this state can transition to the target state
    pub fn can_transition_to(&self, target: VerificationState) -> bool {
        use VerificationState::*;
        matches!(
            (self, target),
            (Unverified, ManifestLoaded)
                | (ManifestLoaded, SelfVerified)
                | (SelfVerified, EntryVerified)
                | (EntryVerified, EntryVerified)
                | (EntryVerified, Trusted)
                // Any non-terminal state can be rejected
                | (Unverified, Rejected)
                | (ManifestLoaded, Rejected)
                | (SelfVerified, Rejected)
                | (EntryVerified, Rejected)
        )
    }

    /// Check if verification has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, VerificationState::Trusted | VerificationState::Rejected)
    }
}

impl std::fmt::Display for VerificationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationState::Unverified => write!(f, "Unverified"),
            VerificationState::ManifestLoaded => write!(f, "ManifestLoaded"),
            VerificationState::SelfVerified => write!(f, "SelfVerified"),
            VerificationState::EntryVerified => write!(f, "EntryVerified"),
            VerificationState::Trusted => write!(f, "Trusted"),
            VerificationState::Rejected => write!(f, "Rejected"),
        }
    }
}
