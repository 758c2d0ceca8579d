//! # Urgence API Main Entry Point

use urgence_api::{config::ConfigLoader, server::run_server, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from layered env files and variables
    let config = ConfigLoader::new().load()?;

    telemetry::init_tracing(&config)?;

    tracing::info!("Loaded configuration for profile: {}", config.profile);
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::info!("Configuration: {}", redacted_json);
    }

    run_server(config).await
}
