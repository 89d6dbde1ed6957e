use serde::{Deserialize, Serialize};

use crate::network::ConnectionPhase;

/// Outcome of one verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkVerificationState {
    /// Attempt running, no decision yet.
    Pending,
    /// Counterpart reachable and accepted this device.
    Succeeded,
    /// Counterpart unreachable, or the transport failed.
    Rejected,
    /// Counterpart explicitly refused this device.
    Denied,
}

impl NetworkVerificationState {
    pub fn is_terminal(self) -> bool {
        self != NetworkVerificationState::Pending
    }

    /// Map a terminal link phase to an outcome.
    ///
    /// Returns `None` while the counterpart is still deciding.
    pub fn from_terminal_phase(phase: ConnectionPhase) -> Option<Self> {
        match phase {
            p if p.is_deciding() => None,
            ConnectionPhase::VerificationDenied => Some(NetworkVerificationState::Denied),
            _ => Some(NetworkVerificationState::Succeeded),
        }
    }
}

/// Latest verification outcome tagged with the attempt that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSnapshot {
    /// Monotonic attempt generation; `0` means no attempt has started.
    pub attempt: u64,
    pub state: NetworkVerificationState,
}

impl VerificationSnapshot {
    pub fn idle() -> Self {
        Self {
            attempt: 0,
            state: NetworkVerificationState::Pending,
        }
    }
}
