//! Process settings.
//!
//! Settings are loaded from environment variables with sensible defaults for
//! running inside the platform's compose stack.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Global service settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Durable-storage paths.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Container runtime transport configuration.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Audit log delivery configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// API bind address.
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Durable-storage paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Global configuration document.
    pub global_config_path: PathBuf,

    /// Plugin list document.
    pub plugin_config_path: PathBuf,

    /// Worker reload sentinel. Sibling worker processes poll its mtime.
    pub reload_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            global_config_path: PathBuf::from("config/global.yaml"),
            plugin_config_path: PathBuf::from("config/plugins.yaml"),
            reload_path: PathBuf::from("/app/reload.txt"),
        }
    }
}

/// Transport selection override for runtime connection negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Platform detection: local socket / named pipe first, then TCP.
    #[default]
    Auto,
    /// Local socket or named pipe only.
    Socket,
    /// TCP candidates only; the local socket is never attempted.
    Tcp,
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "socket" => Ok(Self::Socket),
            "tcp" => Ok(Self::Tcp),
            other => Err(format!("unknown transport mode '{other}'")),
        }
    }
}

/// Container runtime transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Transport override (`auto`, `socket`, `tcp`).
    pub transport: TransportMode,

    /// Primary TCP candidate host. The compose stack maps this to the
    /// Docker host via `extra_hosts: host.docker.internal: host-gateway`.
    pub host: String,

    /// Primary TCP candidate port.
    pub port: u16,

    /// Local socket path tried first under `auto`.
    pub socket_path: PathBuf,

    /// Per-candidate connection timeout.
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            transport: TransportMode::Auto,
            host: "host.docker.internal".to_string(),
            port: 2375,
            socket_path: PathBuf::from("/var/run/docker.sock"),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Audit log delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuditConfig {
    /// Logging-service endpoint. Unset disables delivery.
    pub endpoint: Option<String>,
}

impl Settings {
    /// Load settings from environment variables, falling back to defaults.
    ///
    /// Unparseable values are logged and ignored rather than aborting
    /// startup; the defaults are always serviceable.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(addr) = std::env::var("ATRIUM_LISTEN_ADDR") {
            settings.server.listen_addr = addr;
        }
        if let Ok(path) = std::env::var("ATRIUM_GLOBAL_CONFIG") {
            settings.storage.global_config_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("ATRIUM_PLUGIN_CONFIG") {
            settings.storage.plugin_config_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("ATRIUM_RELOAD_FILE") {
            settings.storage.reload_path = PathBuf::from(path);
        }
        if let Ok(mode) = std::env::var("ATRIUM_RUNTIME_TRANSPORT") {
            match mode.parse() {
                Ok(mode) => settings.runtime.transport = mode,
                Err(err) => tracing::warn!("ATRIUM_RUNTIME_TRANSPORT ignored: {err}"),
            }
        }
        if let Ok(host) = std::env::var("ATRIUM_RUNTIME_HOST") {
            settings.runtime.host = host;
        }
        if let Ok(port) = std::env::var("ATRIUM_RUNTIME_PORT") {
            match port.parse() {
                Ok(port) => settings.runtime.port = port,
                Err(err) => tracing::warn!("ATRIUM_RUNTIME_PORT ignored: {err}"),
            }
        }
        if let Ok(path) = std::env::var("ATRIUM_RUNTIME_SOCKET") {
            settings.runtime.socket_path = PathBuf::from(path);
        }
        if let Ok(timeout) = std::env::var("ATRIUM_RUNTIME_CONNECT_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => settings.runtime.connect_timeout = Duration::from_secs(secs),
                Err(err) => {
                    tracing::warn!("ATRIUM_RUNTIME_CONNECT_TIMEOUT_SECS ignored: {err}")
                }
            }
        }
        if let Ok(endpoint) = std::env::var("ATRIUM_AUDIT_URL") {
            settings.audit.endpoint = Some(endpoint);
        }

        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_serviceable() {
        let settings = Settings::default();
        assert_eq!(settings.server.listen_addr, "0.0.0.0:8080");
        assert_eq!(settings.runtime.port, 2375);
        assert_eq!(settings.runtime.transport, TransportMode::Auto);
        assert!(settings.audit.endpoint.is_none());
    }

    #[test]
    fn transport_mode_parses_case_insensitively() {
        assert_eq!("TCP".parse::<TransportMode>().ok(), Some(TransportMode::Tcp));
        assert_eq!(
            "Socket".parse::<TransportMode>().ok(),
            Some(TransportMode::Socket)
        );
        assert_eq!("auto".parse::<TransportMode>().ok(), Some(TransportMode::Auto));
        assert!("pigeon".parse::<TransportMode>().is_err());
    }
}
