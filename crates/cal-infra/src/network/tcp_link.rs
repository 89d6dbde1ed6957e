//! TCP reachability link.
//!
//! Treats a successful TCP connect to the content server as verification.
//! There is no authorization step, so this link never reports
//! `VerificationDenied`. Each connect call owns the phase until a newer one
//! starts.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use cal_core::network::ConnectionPhase;
use cal_core::ports::NetworkLinkPort;

pub struct TcpReachabilityLink {
    port: u16,
    connect_timeout: Duration,
    phase: Mutex<AttemptPhase>,
}

/// Phase together with the connect call that wrote it.
#[derive(Debug, Clone, Copy)]
struct AttemptPhase {
    attempt: u64,
    phase: ConnectionPhase,
}

impl TcpReachabilityLink {
    pub fn new(port: u16, connect_timeout: Duration) -> Self {
        Self {
            port,
            connect_timeout,
            phase: Mutex::new(AttemptPhase {
                attempt: 0,
                phase: ConnectionPhase::Disconnected,
            }),
        }
    }

    /// Claim the phase slot for a new connect call.
    async fn begin_attempt(&self) -> u64 {
        let mut slot = self.phase.lock().await;
        slot.attempt += 1;
        slot.phase = ConnectionPhase::Connecting;
        slot.attempt
    }

    /// Publish the result of `attempt` unless a newer connect has started.
    async fn finish_attempt(&self, attempt: u64, phase: ConnectionPhase) -> bool {
        let mut slot = self.phase.lock().await;
        if slot.attempt != attempt {
            debug!(attempt, current = slot.attempt, "dropping phase of superseded connect");
            return false;
        }
        slot.phase = phase;
        true
    }
}

#[async_trait]
impl NetworkLinkPort for TcpReachabilityLink {
    async fn connect(&self, hostname: &str) -> Result<()> {
        let attempt = self.begin_attempt().await;
        let target = (hostname.trim(), self.port);

        let phase = match tokio::time::timeout(self.connect_timeout, TcpStream::connect(target)).await
        {
            Ok(Ok(stream)) => {
                info!(
                    hostname,
                    port = self.port,
                    peer = ?stream.peer_addr().ok(),
                    "content server reachable"
                );
                ConnectionPhase::Verified
            }
            Ok(Err(err)) => {
                warn!(hostname, port = self.port, error = %err, "content server unreachable");
                ConnectionPhase::Disconnected
            }
            Err(_) => {
                warn!(
                    hostname,
                    port = self.port,
                    timeout_ms = self.connect_timeout.as_millis() as u64,
                    "content server connect timed out"
                );
                ConnectionPhase::Disconnected
            }
        };

        self.finish_attempt(attempt, phase).await;
        Ok(())
    }

    async fn connection_phase(&self) -> Result<ConnectionPhase> {
        let phase = self.phase.lock().await.phase;
        debug!(?phase, "tcp link phase");
        Ok(phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn listening_host_is_verified() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accept = tokio::spawn(async move { listener.accept().await.map(|_| ()) });

        let link = TcpReachabilityLink::new(port, Duration::from_secs(2));
        link.connect("127.0.0.1").await.unwrap();

        assert_eq!(link.connection_phase().await.unwrap(), ConnectionPhase::Verified);
        accept.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn closed_port_is_disconnected() {
        // Bind and drop to get a port nobody listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let link = TcpReachabilityLink::new(port, Duration::from_secs(2));
        link.connect("127.0.0.1").await.unwrap();

        assert_eq!(
            link.connection_phase().await.unwrap(),
            ConnectionPhase::Disconnected
        );
    }

    #[tokio::test]
    async fn starts_disconnected() {
        let link = TcpReachabilityLink::new(3917, Duration::from_secs(1));

        assert_eq!(
            link.connection_phase().await.unwrap(),
            ConnectionPhase::Disconnected
        );
    }

    #[tokio::test]
    async fn superseded_connect_cannot_overwrite_newer_phase() {
        let link = TcpReachabilityLink::new(3917, Duration::from_secs(1));

        let first = link.begin_attempt().await;
        let second = link.begin_attempt().await;

        assert!(!link.finish_attempt(first, ConnectionPhase::Verified).await);
        assert_eq!(
            link.connection_phase().await.unwrap(),
            ConnectionPhase::Connecting
        );

        assert!(link.finish_attempt(second, ConnectionPhase::Disconnected).await);
        assert_eq!(
            link.connection_phase().await.unwrap(),
            ConnectionPhase::Disconnected
        );
    }
}
