//! Network link port.
//!
//! Abstracts the connection to the content counterpart. The verification
//! coordinator only needs to start a connection and watch its phase.

use anyhow::Result;
use async_trait::async_trait;

use crate::network::ConnectionPhase;

#[async_trait]
pub trait NetworkLinkPort: Send + Sync {
    /// (Re)connect to the counterpart. Resets the phase progression.
    async fn connect(&self, hostname: &str) -> Result<()>;

    /// Current phase; monotonic within one connection.
    async fn connection_phase(&self) -> Result<ConnectionPhase>;
}
