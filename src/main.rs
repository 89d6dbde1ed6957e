use std::time::Duration;

use cal_runtime::bootstrap::{
    load_config, resolve_config_path, run_calibrator, tracing::init_tracing_subscriber,
};
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    let config_path = resolve_config_path();
    let config = load_config(&config_path)?;

    init_tracing_subscriber(config.paths.logs_dir.as_deref())?;
    info!(
        config = %config_path.display(),
        device_class = ?config.device_class,
        "calibrator starting"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("calibrator")
        .build()?;

    let result = runtime.block_on(run_calibrator(config));
    // Do not wait for the stdin reader's blocking thread.
    runtime.shutdown_timeout(Duration::from_millis(100));

    if let Err(err) = &result {
        error!(error = %format!("{err:#}"), "calibrator failed");
    }
    result
}
