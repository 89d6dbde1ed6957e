//! Network verification domain types.

mod phase;
mod verification;

pub use phase::ConnectionPhase;
pub use verification::{NetworkVerificationState, VerificationSnapshot};
