use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bida_backend::{
    app::build_pipeline,
    config::Config,
    scheduler::{shutdown_signal, SchedulerDriver},
    utils::time::{Clock, SystemClock},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bida_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    config.log_summary();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let pipeline = build_pipeline(&config, clock.clone())?;
    let driver = SchedulerDriver::new(Arc::new(pipeline), clock, config.daily_run_at);

    driver.run_until_shutdown(shutdown_signal()).await;

    tracing::info!("Scheduler stopped");
    Ok(())
}
