//! HTTP boundary for the control-plane service.
//!
//! The router owns no state of its own: each document domain is an explicit
//! service instance injected through `AppState`, so tests can substitute
//! file-backed fixtures without touching process globals.

mod handlers;
mod responses;

use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::audit;
use crate::config::GlobalConfig;
use crate::plugins::PluginRegistry;
use crate::reload::ReloadSignal;
use crate::types::Settings;

/// Shared state injected into every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub global_config: Arc<Mutex<GlobalConfig>>,
    pub plugins: Arc<Mutex<PluginRegistry>>,
    pub reload: ReloadSignal,
}

impl AppState {
    /// Wire up all services from process settings.
    pub fn from_settings(settings: Settings) -> Self {
        let audit = audit::sink_from_config(&settings.audit);

        Self {
            global_config: Arc::new(Mutex::new(GlobalConfig::new(
                &settings.storage.global_config_path,
            ))),
            plugins: Arc::new(Mutex::new(PluginRegistry::new(
                &settings.storage.plugin_config_path,
                audit,
            ))),
            reload: ReloadSignal::new(&settings.storage.reload_path),
            settings: Arc::new(settings),
        }
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route(
            "/api/config",
            get(handlers::get_config).patch(handlers::patch_config),
        )
        .route(
            "/api/plugins",
            get(handlers::get_plugins)
                .post(handlers::register_plugin)
                .patch(handlers::update_plugin)
                .delete(handlers::delete_plugin),
        )
        .route("/api/containers", get(handlers::container_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
