//! Network verification coordinator.
//!
//! Runs one connect → poll → resolve attempt on a spawned task and publishes
//! its outcome through a `watch` slot tagged with the attempt generation.
//!
//! ## Supersession
//!
//! Starting attempt N+1 first publishes `Pending` for N+1, then aborts the
//! task of attempt N. The worker writes its outcome with
//! [`watch::Sender::send_if_modified`], comparing generations inside the
//! closure, so the check and the write happen under the same lock. A stale
//! attempt that slips past the abort therefore cannot overwrite the slot.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, info, info_span, warn, Instrument};

use cal_core::config::VerificationConfig;
use cal_core::network::{ConnectionPhase, NetworkVerificationState, VerificationSnapshot};
use cal_core::ports::NetworkLinkPort;

pub struct VerificationCoordinator {
    link: Arc<dyn NetworkLinkPort>,
    config: VerificationConfig,
    runtime: Handle,
    outcome_tx: Arc<watch::Sender<VerificationSnapshot>>,
    outcome_rx: watch::Receiver<VerificationSnapshot>,
    generation: u64,
    in_flight: Option<AbortHandle>,
}

impl VerificationCoordinator {
    pub fn new(link: Arc<dyn NetworkLinkPort>, config: VerificationConfig, runtime: Handle) -> Self {
        let (outcome_tx, outcome_rx) = watch::channel(VerificationSnapshot::idle());
        Self {
            link,
            config,
            runtime,
            outcome_tx: Arc::new(outcome_tx),
            outcome_rx,
            generation: 0,
            in_flight: None,
        }
    }

    /// Start a new attempt, superseding any attempt still in flight.
    ///
    /// Returns the generation of the new attempt.
    pub fn start(&mut self, hostname: &str) -> u64 {
        self.generation += 1;
        let attempt = self.generation;

        self.outcome_tx.send_replace(VerificationSnapshot {
            attempt,
            state: NetworkVerificationState::Pending,
        });

        if let Some(previous) = self.in_flight.take() {
            if !previous.is_finished() {
                debug!(superseded = attempt - 1, attempt, "aborting superseded verification attempt");
            }
            previous.abort();
        }

        let link = Arc::clone(&self.link);
        let config = self.config.clone();
        let outcome_tx = Arc::clone(&self.outcome_tx);
        let hostname = hostname.to_string();
        let span = info_span!("usecase.verification.attempt", attempt, hostname = %hostname);

        let handle = self.runtime.spawn(
            async move {
                let outcome = run_attempt(link.as_ref(), &hostname, &config).await;
                if publish_outcome(&outcome_tx, attempt, outcome) {
                    info!(?outcome, "verification attempt resolved");
                } else {
                    debug!(?outcome, "verification attempt superseded, discarding outcome");
                }
            }
            .instrument(span),
        );
        self.in_flight = Some(handle.abort_handle());

        attempt
    }

    /// Latest published snapshot. Never blocks.
    pub fn latest(&self) -> VerificationSnapshot {
        *self.outcome_rx.borrow()
    }

    /// Receiver for observers that want to await outcome changes.
    pub fn subscribe(&self) -> watch::Receiver<VerificationSnapshot> {
        self.outcome_tx.subscribe()
    }
}

impl Drop for VerificationCoordinator {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

/// Write `outcome` only if `attempt` is still the current generation.
fn publish_outcome(
    outcome_tx: &watch::Sender<VerificationSnapshot>,
    attempt: u64,
    outcome: NetworkVerificationState,
) -> bool {
    outcome_tx.send_if_modified(|slot| {
        if slot.attempt != attempt {
            return false;
        }
        slot.state = outcome;
        true
    })
}

async fn run_attempt(
    link: &dyn NetworkLinkPort,
    hostname: &str,
    config: &VerificationConfig,
) -> NetworkVerificationState {
    let attempt = connect_and_poll(link, hostname, config.poll_interval);
    match config.timeout {
        Some(limit) => match tokio::time::timeout(limit, attempt).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(timeout_ms = limit.as_millis() as u64, "verification timed out");
                NetworkVerificationState::Rejected
            }
        },
        None => attempt.await,
    }
}

async fn connect_and_poll(
    link: &dyn NetworkLinkPort,
    hostname: &str,
    poll_interval: Duration,
) -> NetworkVerificationState {
    if let Err(err) = link.connect(hostname).await {
        warn!(error = %err, "verification connect failed");
        return NetworkVerificationState::Rejected;
    }

    let mut phase = match link.connection_phase().await {
        Ok(phase) => phase,
        Err(err) => {
            warn!(error = %err, "reading connection phase failed");
            return NetworkVerificationState::Rejected;
        }
    };

    // Refused outright or unreachable: no point polling.
    if phase == ConnectionPhase::Disconnected {
        debug!("link disconnected right after connect");
        return NetworkVerificationState::Rejected;
    }

    loop {
        if let Some(outcome) = NetworkVerificationState::from_terminal_phase(phase) {
            return outcome;
        }
        tokio::time::sleep(poll_interval).await;
        phase = match link.connection_phase().await {
            Ok(phase) => phase,
            Err(err) => {
                warn!(error = %err, "polling connection phase failed");
                return NetworkVerificationState::Rejected;
            }
        };
        debug!(?phase, "verification poll");
    }
}
