use anyhow::Context;

use churn::service::build_state;
use scoring::executable_utils::{initialize_executable, initialize_tracing, install_metrics_recorder, run_service};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("Starting churn scoring service...");
    let config = initialize_executable().map_err(|e| anyhow::anyhow!(e)).context("loading configuration")?;
    initialize_tracing(&config.service.log_level);

    let mut state = build_state(&config).await.context("building application state")?;
    match install_metrics_recorder() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => tracing::warn!(error = %e, "Metrics recorder not installed"),
    }

    if !state.predictor().is_ready() {
        tracing::warn!("Model unavailable, predictions will be rejected until restart");
    }

    run_service(&config.service, state)
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("running service")
}
