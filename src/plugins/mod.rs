//! Plugin configuration management.
//!
//! A plugin record describes one external integration: its webhook endpoint,
//! shared secret, and source allow-list. Records live in an ordered YAML
//! list on disk; invalid entries are dropped (not hard-failed) at load time.
//!
//! Each plugin gets a unique, URL-safe callback route derived from its name
//! and webhook URL. The route is recomputed on every load and never trusted
//! from storage or callers.

mod registry;

pub use registry::PluginRegistry;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::types::{Error, Result};

/// One plugin record as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PluginRecord {
    pub name: String,
    pub description: String,
    pub webhook: WebhookConfig,
}

/// Webhook configuration for a plugin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct WebhookConfig {
    pub url: String,
    pub secret: String,
    pub auth_type: String,
    pub allowed_ip: Vec<String>,
}

/// Update request for an existing plugin.
///
/// `plugin_name` selects the record to overwrite; `name` itself is mutable,
/// so the two may differ.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginUpdate {
    pub plugin_name: String,
    pub name: String,
    pub description: String,
    pub webhook: WebhookConfig,
}

/// A plugin record plus its derived callback route.
#[derive(Debug, Clone, Serialize)]
pub struct PluginView {
    #[serde(flatten)]
    pub record: PluginRecord,
    pub safe_url: String,
}

impl From<&PluginRecord> for PluginView {
    fn from(record: &PluginRecord) -> Self {
        Self {
            safe_url: safe_url(&record.name, &record.webhook.url),
            record: record.clone(),
        }
    }
}

// Percent-encode everything except unreserved characters and `/`, matching
// the route shape the web tier mounts.
const SAFE_URL_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// Derive the unique callback route for a plugin.
///
/// Lowercased, spaces mapped to `_`, `#` stripped, then percent-encoded.
/// Deterministic and idempotent for a given name/URL pair.
pub fn safe_url(name: &str, webhook_url: &str) -> String {
    let raw = format!("/plugin/{name}/{webhook_url}")
        .to_lowercase()
        .replace(' ', "_")
        .replace('#', "");

    utf8_percent_encode(&raw, SAFE_URL_SET).to_string()
}

/// Validate a webhook allow-list.
///
/// Each entry must parse as a bare IP address or a CIDR network; a mixed
/// list is accepted. The first invalid entry fails the whole list.
pub fn validate_allow_list(entries: &[String]) -> Result<()> {
    for raw in entries {
        if let Err(reason) = validate_allow_entry(raw) {
            tracing::error!("Invalid allowed-ip entry '{raw}': {reason}");
            return Err(Error::validation(format!(
                "invalid allowed-ip entry '{raw}': {reason}"
            )));
        }
    }
    Ok(())
}

fn validate_allow_entry(raw: &str) -> std::result::Result<(), String> {
    let raw = raw.trim();

    match raw.split_once('/') {
        Some((ip_raw, prefix_raw)) => {
            let ip: IpAddr = ip_raw
                .trim()
                .parse()
                .map_err(|_| format!("invalid network address '{ip_raw}'"))?;
            let prefix: u8 = prefix_raw
                .trim()
                .parse()
                .map_err(|_| format!("invalid prefix '{prefix_raw}'"))?;
            let max_prefix = match ip {
                IpAddr::V4(_) => 32,
                IpAddr::V6(_) => 128,
            };
            if prefix > max_prefix {
                return Err(format!("prefix {prefix} exceeds max {max_prefix} for {ip}"));
            }
            Ok(())
        }
        None => raw
            .parse::<IpAddr>()
            .map(|_| ())
            .map_err(|_| format!("invalid IP address '{raw}'")),
    }
}
