use anyhow::Context;
use shop_server::{Config, Server, ServerState, init_logger_with_file};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    tracing::info!(
        "Starting shop-server v{} (env: {})",
        env!("CARGO_PKG_VERSION"),
        config.environment
    );

    let state = ServerState::initialize(&config)
        .await
        .context("Failed to initialize server state")?;

    Server::with_state(config.clone(), state)
        .run()
        .await
        .context("Server terminated with an error")?;

    Ok(())
}
