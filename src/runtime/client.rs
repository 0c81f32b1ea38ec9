//! Container runtime REST client.
//!
//! Minimal typed client for the runtime's HTTP API, speaking HTTP/1.1 over
//! whichever transport negotiation selected. Connections are one-shot: each
//! request dials, sends, and releases its stream, so a handle never outlives
//! the status query that acquired it.

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::header::HOST;
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
#[cfg(unix)]
use tokio::net::UnixStream;

use crate::runtime::transport::Target;
use crate::types::{Error, Result};

/// Byte stream to the container runtime, any transport.
pub trait RuntimeIo: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> RuntimeIo for T {}

/// Client bound to one negotiated transport target.
#[derive(Debug, Clone)]
pub struct RuntimeClient {
    target: Target,
    connect_timeout: Duration,
}

impl RuntimeClient {
    pub fn new(target: Target, connect_timeout: Duration) -> Self {
        Self {
            target,
            connect_timeout,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Liveness probe.
    pub async fn ping(&self) -> Result<()> {
        self.get("/_ping").await.map(|_| ())
    }

    /// All running containers.
    pub async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        self.get_json("/containers/json").await
    }

    /// Full state of one container, the source of its precise
    /// status/health strings.
    pub async fn inspect_container(&self, id: &str) -> Result<ContainerInspect> {
        self.get_json(&format!("/containers/{id}/json")).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.get(path).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn dial(&self) -> Result<Box<dyn RuntimeIo>> {
        let connect = async {
            let io: Box<dyn RuntimeIo> = match &self.target {
                #[cfg(unix)]
                Target::Socket(path) => Box::new(UnixStream::connect(path).await?),
                #[cfg(windows)]
                Target::Pipe(name) => Box::new(
                    tokio::net::windows::named_pipe::ClientOptions::new().open(name)?,
                ),
                Target::Tcp(host, port) => {
                    Box::new(TcpStream::connect((host.as_str(), *port)).await?)
                }
            };
            Ok::<_, std::io::Error>(io)
        };

        match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(io) => Ok(io?),
            Err(_) => Err(Error::connectivity(format!(
                "connect to {} timed out after {:?}",
                self.target, self.connect_timeout
            ))),
        }
    }

    async fn get(&self, path: &str) -> Result<Bytes> {
        let io = self.dial().await?;

        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(io))
            .await
            .map_err(|err| {
                Error::connectivity(format!("handshake with {} failed: {err}", self.target))
            })?;

        // Drive the connection until the response is complete.
        tokio::spawn(async move {
            if let Err(err) = conn.await {
                tracing::debug!("runtime connection closed: {err}");
            }
        });

        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(HOST, "atrium-runtime")
            .body(Empty::<Bytes>::new())
            .map_err(|err| Error::internal(format!("invalid runtime request: {err}")))?;

        let response = sender.send_request(request).await.map_err(|err| {
            Error::connectivity(format!("request to {} failed: {err}", self.target))
        })?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|err| {
                Error::connectivity(format!("response from {} failed: {err}", self.target))
            })?
            .to_bytes();

        if status.is_success() {
            Ok(body)
        } else if status == StatusCode::NOT_FOUND {
            Err(Error::not_found(format!("runtime has no resource at {path}")))
        } else {
            Err(Error::connectivity(format!(
                "runtime returned {status} for {path}"
            )))
        }
    }
}

/// One entry from the running-container listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerSummary {
    pub id: String,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub status: String,
}

impl ContainerSummary {
    /// Primary container name without the leading slash the runtime adds.
    pub fn display_name(&self) -> String {
        self.names
            .first()
            .map(|name| name.trim_start_matches('/').to_string())
            .unwrap_or_else(|| self.id.clone())
    }
}

/// Inspected container state.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerInspect {
    #[serde(default)]
    pub name: String,
    pub state: Option<ContainerState>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerState {
    #[serde(default)]
    pub status: String,
    pub health: Option<HealthState>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthState {
    #[serde(default)]
    pub status: String,
}
