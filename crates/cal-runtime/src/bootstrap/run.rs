//! Tick loop.

use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, info_span, warn, Instrument};

use cal_app::TickOutcome;
use cal_core::config::CalibratorConfig;
use cal_core::CalibrationState;

use super::wiring::{wire_dependencies, CalibratorDeps};
use crate::adapters::OperatorBatch;

/// Run Calibrator until the operator quits, Ctrl-C is pressed or a fatal
/// error occurs.
pub async fn run_calibrator(config: CalibratorConfig) -> anyhow::Result<()> {
    let mut deps = wire_dependencies(&config, Handle::current())?;

    let feed = deps.operator_feed.clone();
    let reader = tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        if let Err(err) = feed.pump(stdin).await {
            warn!(error = %err, "operator input closed");
        }
    });

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        info!("ctrl-c received");
    };

    let result = run_session(&mut deps, config.tick_interval, shutdown).await;
    // A pending stdin read keeps its blocking thread until the next line;
    // main shuts the runtime down without waiting for it.
    reader.abort();

    let final_state = result?;
    info!(state = %final_state, "calibrator stopped");
    Ok(())
}

/// Resolve startup, then tick until `shutdown` completes, the operator
/// quits or a fatal error occurs. Returns the last calibration state.
pub async fn run_session<F>(
    deps: &mut CalibratorDeps,
    tick_interval: Duration,
    shutdown: F,
) -> anyhow::Result<CalibrationState>
where
    F: Future<Output = ()>,
{
    drive_session(deps, tick_interval, shutdown)
        .instrument(info_span!("runtime.session"))
        .await
}

async fn drive_session<F>(
    deps: &mut CalibratorDeps,
    tick_interval: Duration,
    shutdown: F,
) -> anyhow::Result<CalibrationState>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let plan = tokio::select! {
        plan = deps.startup.resolve() => plan,
        _ = &mut shutdown => return Ok(deps.orchestrator.state()),
    };
    deps.orchestrator
        .begin(&plan)
        .context("start calibration flow")?;

    // Input typed during startup was never shown a prompt; only quit counts.
    let stale = deps.operator.drain();
    if stale.quit {
        info!("operator quit during startup");
        return Ok(deps.orchestrator.state());
    }
    if stale != OperatorBatch::default() {
        debug!(?stale, "discarded operator input from startup");
    }

    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_error: Option<String> = None;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        let batch = deps.operator.drain();
        if batch.quit {
            info!("operator quit");
            break;
        }
        if let Some(hostname) = batch.hostname {
            if deps.orchestrator.set_content_hostname(hostname.as_str()) {
                info!(hostname = %hostname, "content hostname entered");
            } else {
                warn!(hostname = %hostname, "hostname can only be changed in network configuration");
            }
        }

        match deps.orchestrator.tick(batch.input) {
            Ok(TickOutcome::Moved { .. }) => last_error = None,
            Ok(_) => {}
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                // Retried every tick; only report a changed error.
                let message = err.to_string();
                if last_error.as_deref() != Some(message.as_str()) {
                    warn!(error = %message, "calibration tick failed, retrying");
                    last_error = Some(message);
                }
            }
        }
    }

    Ok(deps.orchestrator.state())
}
