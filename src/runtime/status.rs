//! Service status resolution.
//!
//! Containers are opaque to the platform; the mapping to logical services
//! goes through image labels. A container belongs to a service when its
//! service-name label (or plugin-name label, for plugin sidecars) equals
//! the queried name.

use serde::Serialize;

use crate::runtime::client::{ContainerSummary, RuntimeClient};
use crate::types::Result;

/// Label assigning a container to a logical platform service.
pub const SERVICE_LABEL: &str = "io.atrium.service.name";

/// Label assigning a container to a registered plugin.
pub const PLUGIN_LABEL: &str = "io.atrium.plugin.name";

const TITLE_LABEL: &str = "org.opencontainers.image.title";
const DESCRIPTION_LABEL: &str = "org.opencontainers.image.description";
const VERSION_LABEL: &str = "org.opencontainers.image.version";

/// Platform services as defined in the compose file, queried when no
/// explicit container is requested.
pub const DEFAULT_SERVICES: &[&str] = &[
    "core",
    "web-interface",
    "security",
    "logging",
    "messaging",
    "scheduler",
];

/// Normalized liveness/metadata snapshot for one logical service.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServiceStatus {
    pub name: String,
    pub title: String,
    pub description: String,
    pub service_name: String,
    pub version: String,
    pub status: String,
    pub health: String,
}

impl ServiceStatus {
    /// Placeholder returned when no running container matches a service.
    pub fn missing(service: &str) -> Self {
        Self {
            name: service.to_string(),
            title: "missing".to_string(),
            description: "unknown".to_string(),
            service_name: service.to_string(),
            version: "unknown".to_string(),
            status: "container not found".to_string(),
            health: "unknown".to_string(),
        }
    }
}

/// Find the container backing a service.
///
/// When several containers carry the same label, the most recently created
/// one wins; the runtime's listing order is not trusted.
fn find_match<'a>(
    containers: &'a [ContainerSummary],
    service: &str,
) -> Option<&'a ContainerSummary> {
    containers
        .iter()
        .filter(|container| {
            let labels = &container.labels;
            labels.get(SERVICE_LABEL).map(String::as_str) == Some(service)
                || labels.get(PLUGIN_LABEL).map(String::as_str) == Some(service)
        })
        .max_by_key(|container| container.created)
}

fn label_or<'a>(container: &'a ContainerSummary, label: &str, fallback: &'a str) -> &'a str {
    container
        .labels
        .get(label)
        .map(String::as_str)
        .unwrap_or(fallback)
}

/// Resolve the status of one logical service.
///
/// Returns `None` when the runtime reports no running containers or no
/// container carries a matching label; the HTTP layer substitutes the
/// placeholder record in that case.
pub async fn status_for(
    client: &RuntimeClient,
    service: &str,
) -> Result<Option<ServiceStatus>> {
    let containers = client.list_containers().await?;
    if containers.is_empty() {
        tracing::debug!("Runtime reports no running containers");
        return Ok(None);
    }

    let Some(matched) = find_match(&containers, service) else {
        return Ok(None);
    };

    // The listing's state string is coarse; inspect for the precise
    // status and health the runtime tracks per container.
    let inspect = client.inspect_container(&matched.id).await?;
    let state = inspect.state.unwrap_or_default();
    let status = if state.status.is_empty() {
        matched.state.clone()
    } else {
        state.status
    };
    let health = state
        .health
        .map(|health| health.status)
        .filter(|status| !status.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    Ok(Some(ServiceStatus {
        name: matched.display_name(),
        title: label_or(matched, TITLE_LABEL, "Unknown Title").to_string(),
        description: label_or(matched, DESCRIPTION_LABEL, "No description available")
            .to_string(),
        service_name: service.to_string(),
        version: label_or(matched, VERSION_LABEL, "Unknown Version").to_string(),
        status,
        health,
    }))
}
