//! Atrium core service - main entry point.
//!
//! Starts the HTTP API serving:
//! - Global configuration reads and section-scoped updates
//! - Plugin registration, update, and deletion
//! - Container status for the platform's services

use atrium_core::api::{router, AppState};
use atrium_core::Settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load settings from the environment
    let settings = Settings::from_env();

    // Initialize observability
    atrium_core::observability::init_tracing();

    // Wire up shared services (all handlers share these instances)
    let state = AppState::from_settings(settings.clone());

    // Configuration integrity is a precondition for serving any request:
    // a missing required section aborts startup here.
    {
        let mut config = state.global_config.lock().await;
        config.load()?;
    }

    let listener = tokio::net::TcpListener::bind(&settings.server.listen_addr).await?;
    tracing::info!("Atrium core API listening on {}", settings.server.listen_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
