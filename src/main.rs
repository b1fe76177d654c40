//! Collision Search - Main Application
//!
//! Runs an escalating partial collision campaign with periodic status reports.

use collision_search::{
    campaign::Campaign,
    config::{Config, LogFormat},
    utils::format_elapsed,
    Engine, Result, APP_NAME, APP_VERSION,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so the log level can come from it
    let config = Config::load().await?;

    init_tracing(&config);

    if config.print_config {
        print_configuration(&config)?;
        return Ok(());
    }

    let policy = config.campaign_policy()?;

    info!("Starting {} v{}", APP_NAME, APP_VERSION);
    info!("Collision string:                  {}", config.base_string);
    info!("Display update interval:           {}", format_elapsed(policy.report_interval));
    info!(
        "Target range (bits):               {}..={}",
        policy.start_target.bits(),
        policy.max_target.bits()
    );

    let mut engine = Engine::sha1();
    engine.set_base_string(config.base_string());

    let summary = Campaign::new(engine, policy).run().await?;

    if let Some(best) = summary.best() {
        info!(
            "Best collision: {} at counter {:x}",
            best.target,
            best.counter().unwrap_or_default()
        );
    }

    Ok(())
}

/// Initialize tracing; RUST_LOG takes precedence over the configured level
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Text => registry.with(fmt::layer().with_target(false)).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

/// Print current configuration
fn print_configuration(config: &Config) -> Result<()> {
    let config_yaml = serde_yaml::to_string(config)?;
    println!("{}", config_yaml);
    Ok(())
}
