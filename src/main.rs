mod actuator;
mod config;
mod feed;
mod pipeline;
#[cfg(test)]
mod testing;

use actuator::SimulatedActuator;
use config::BotConfig;
use feed::TcpFeed;
use pipeline::Pipeline;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = BotConfig::from_env()?;

    info!("Feedbot starting");
    info!("  Feed server: {}", config.feed.address);
    info!("  Accounts: {:?}", config.pipeline.filter.accounts);
    info!("  Languages: {:?}", config.pipeline.filter.languages);

    let feed = Arc::new(TcpFeed::new(config.feed.clone()));
    let robot = Arc::new(SimulatedActuator::new(config.actuator.clone()));

    let handle = Pipeline::start(config.pipeline, feed.clone(), feed, robot.clone())?;

    let shutdown = handle.shutdown_trigger();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
            trigger.trigger();
        }
    });

    if let Err(e) = handle.join().await {
        error!("Feedbot stopped: {:#}", e);
        return Err(e);
    }

    if shutdown.is_triggered() {
        info!("Shutdown requested, pending actions discarded");
    }

    let pose = robot.pose().await;
    info!(
        "Feedbot stopped at x={:.1} y={:.1} heading={:.0}",
        pose.x, pose.y, pose.heading_deg
    );
    Ok(())
}
