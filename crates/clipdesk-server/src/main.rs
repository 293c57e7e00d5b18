use anyhow::{Context, Result};
use clipdesk_runtime::{build_router, DeskApiState, DeskConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,clipdesk_runtime=info,clipdesk_ledger=info,clipdesk_server=info")
        }))
        .init();

    let config = DeskConfig::from_env().context("load CLIPDESK_* configuration")?;
    let store = config
        .startup_health_check()
        .await
        .context("ledger is not reachable, refusing to serve")?;

    let state = DeskApiState::from_config(&config, store);
    let loaded = state
        .ledger
        .load()
        .await
        .context("initial ledger read and header repair")?;
    tracing::info!(
        total_files = loaded.total_files(),
        backend = ?config.backend,
        completion_mode = ?config.completion_mode,
        identity_key = config.identity_key.as_str(),
        "ledger ready"
    );

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("bind {}", config.server_addr))?;
    tracing::info!("clipdesk server listening on http://{}", config.server_addr);
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
