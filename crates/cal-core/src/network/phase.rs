use serde::{Deserialize, Serialize};

/// Connection phase reported by the network link.
///
/// Declared in progression order; the derived `Ord` is what the verification
/// poll compares against [`ConnectionPhase::DECIDING_THRESHOLD`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    Disconnected,
    Connecting,
    Connected,
    /// Counterpart is deciding whether to accept this device.
    VerifyWait,
    Verified,
    VerificationDenied,
}

impl ConnectionPhase {
    /// Highest phase in which the counterpart has not decided yet.
    pub const DECIDING_THRESHOLD: ConnectionPhase = ConnectionPhase::VerifyWait;

    pub fn is_deciding(self) -> bool {
        self <= Self::DECIDING_THRESHOLD
    }

    pub fn is_terminal(self) -> bool {
        !self.is_deciding()
    }
}
