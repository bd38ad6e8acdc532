//! ADR Reporting Portal gateway.
//! Serves the report, calendar and chat API from one in-memory store.

mod app;
mod error;
mod handlers;

use adr_portal_core::PortalConfig;
use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::{build_app, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PortalConfig::load().map_err(|e| {
        tracing::error!("[gateway] configuration rejected: {}", e);
        e
    })?;
    let addr = config.bind_addr();

    let state = AppState::new(config);
    state.calendar.seed(Utc::now());
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        "ADR portal gateway v{} listening on {}",
        adr_portal_core::version(),
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("[gateway] shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("[gateway] could not listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("[gateway] shutdown requested (Ctrl+C)");
}
