//! API route handlers.
//!
//! Handlers re-read durable storage at the start of every operation; the
//! per-domain mutex makes each load→mutate→persist cycle single-writer.
//! Successful mutations touch the worker reload signal before responding.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::api::responses::success_message;
use crate::api::AppState;
use crate::config::ConfigPatch;
use crate::plugins::{PluginRecord, PluginUpdate};
use crate::runtime::{self, ServiceStatus, DEFAULT_SERVICES};
use crate::types::{Error, Result};

/// Parse a JSON request body, distinguishing "no data" from "bad data".
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    if body.is_empty() {
        return Err(Error::validation("no data provided"));
    }
    serde_json::from_slice(body)
        .map_err(|err| Error::validation(format!("invalid request body: {err}")))
}

/// Health probe used by the container healthcheck.
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Current global configuration, freshly loaded.
pub async fn get_config(State(state): State<AppState>) -> Result<impl IntoResponse> {
    tracing::debug!("Global config requested through API");

    let mut config = state.global_config.lock().await;
    config.load()?;

    Ok(Json(json!({
        "result": "success",
        "config": config.document(),
    })))
}

/// Section-scoped configuration update.
pub async fn patch_config(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let patch: ConfigPatch = parse_body(&body)?;

    {
        let mut config = state.global_config.lock().await;
        config.load()?;
        config.update(&patch)?;
    }

    // Recycle the workers so the change takes effect.
    state.reload.touch();

    Ok(success_message("Configuration updated successfully"))
}

/// One plugin (via the `X-Plugin-Name` header) or the full list (`all`).
pub async fn get_plugins(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let Some(plugin_name) = headers
        .get("x-plugin-name")
        .and_then(|value| value.to_str().ok())
    else {
        return Err(Error::validation("missing X-Plugin-Name header"));
    };

    let mut registry = state.plugins.lock().await;
    registry.load()?;

    if plugin_name == "all" {
        return Ok(Json(json!({
            "result": "success",
            "plugins": registry.list(),
        })));
    }

    match registry.get(plugin_name) {
        Some(plugin) => Ok(Json(json!({
            "result": "success",
            "plugin": plugin,
        }))),
        None => Err(Error::not_found(format!("plugin '{plugin_name}' not found"))),
    }
}

/// Register a new plugin.
pub async fn register_plugin(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let record: PluginRecord = parse_body(&body)?;

    {
        let mut registry = state.plugins.lock().await;
        registry.load()?;
        registry.register(record).await?;
    }

    state.reload.touch();
    Ok(success_message("Plugin added successfully"))
}

/// Update an existing plugin, matched by `plugin_name`.
pub async fn update_plugin(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let patch: PluginUpdate = parse_body(&body)?;

    {
        let mut registry = state.plugins.lock().await;
        registry.load()?;
        registry.update(patch).await?;
    }

    state.reload.touch();
    Ok(success_message("Plugin updated successfully"))
}

#[derive(Debug, Deserialize)]
struct DeleteRequest {
    name: String,
}

/// Remove a plugin by name.
pub async fn delete_plugin(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let request: DeleteRequest = parse_body(&body)?;

    {
        let mut registry = state.plugins.lock().await;
        registry.load()?;
        registry.delete(&request.name).await?;
    }

    state.reload.touch();
    Ok(success_message("Plugin deleted successfully"))
}

#[derive(Debug, Deserialize)]
pub struct ContainerQuery {
    container: Option<String>,
}

/// Status of one named service, or of the default platform set.
pub async fn container_status(
    State(state): State<AppState>,
    Query(query): Query<ContainerQuery>,
) -> Result<impl IntoResponse> {
    let services: Vec<String> = match query.container {
        Some(name) => vec![name],
        None => DEFAULT_SERVICES.iter().map(|s| (*s).to_string()).collect(),
    };

    // One negotiation per request; the client dials per call and the
    // handle is released when this handler returns.
    let client = runtime::negotiate(&state.settings.runtime).await?;

    let mut statuses = Vec::with_capacity(services.len());
    for service in &services {
        match runtime::status_for(&client, service).await? {
            Some(status) => statuses.push(status),
            None => {
                tracing::warn!("Container {service} not found or not running");
                statuses.push(ServiceStatus::missing(service));
            }
        }
    }

    Ok(Json(json!({
        "result": "success",
        "services": statuses,
    })))
}
