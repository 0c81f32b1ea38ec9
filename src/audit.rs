//! Audit log delivery.
//!
//! Plugin mutations are recorded with the platform's logging service. An
//! audit miss must never fail the mutation that triggered it, so sinks
//! swallow their own errors and report them at error level only.

use async_trait::async_trait;
use std::sync::Arc;

use crate::types::AuditConfig;

/// Destination for audit log lines.
#[async_trait]
pub trait AuditSink: Send + Sync + std::fmt::Debug {
    async fn log(&self, message: &str);
}

/// Posts audit lines to the logging service.
#[derive(Debug)]
pub struct HttpAuditSink {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpAuditSink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AuditSink for HttpAuditSink {
    async fn log(&self, message: &str) {
        let body = serde_json::json!({
            "source": "core",
            "message": message,
            "timestamp": chrono::Utc::now(),
        });

        match self.client.post(&self.endpoint).json(&body).send().await {
            Ok(response) if !response.status().is_success() => {
                tracing::error!(
                    "Audit delivery to {} returned {}",
                    self.endpoint,
                    response.status()
                );
            }
            Ok(_) => {}
            Err(err) => {
                tracing::error!("Audit delivery to {} failed: {err}", self.endpoint);
            }
        }
    }
}

/// Sink used when no logging-service endpoint is configured.
#[derive(Debug, Default)]
pub struct NullAuditSink;

#[async_trait]
impl AuditSink for NullAuditSink {
    async fn log(&self, message: &str) {
        tracing::debug!("audit (no sink configured): {message}");
    }
}

/// Build the sink selected by configuration.
pub fn sink_from_config(config: &AuditConfig) -> Arc<dyn AuditSink> {
    match &config.endpoint {
        Some(endpoint) => Arc::new(HttpAuditSink::new(endpoint)),
        None => Arc::new(NullAuditSink),
    }
}
