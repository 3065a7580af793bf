use crate::app::{router, AppState};
use crate::config::CarlConfig;
use anyhow::{Context, Result};
use std::net::SocketAddr;

/// Bind the configured address and serve until Ctrl-C
pub async fn start_server(config: CarlConfig) -> Result<()> {
    let addr: SocketAddr = config
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address: {}", config.bind))?;

    let state = AppState::from_config(&config)?;
    tracing::info!(
        "Loaded {} repository aliases, relaying files through {}",
        config.aliases.len(),
        state.proxy_origin()
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("carl listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down server");
        })
        .await?;

    Ok(())
}
