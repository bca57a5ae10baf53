use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bida_backend::{
    app::build_pipeline,
    config::Config,
    utils::time::{Clock, SystemClock},
};

/// Runs a single holiday check and exits. Fails only when the calendar
/// could not be read.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bida_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    config.log_summary();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let summary = build_pipeline(&config, clock)?.run().await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
