//! Runtime connection negotiation.
//!
//! The container runtime may be reachable over a local socket, a named pipe
//! (Windows), or TCP. Candidates are built fresh per negotiation from
//! platform detection, the transport override, and static fallback hosts,
//! then tried in order with a liveness probe. The first success wins; the
//! negotiation only fails after every candidate is exhausted.

use std::fmt;
use std::path::PathBuf;

use crate::runtime::client::RuntimeClient;
use crate::types::{Error, Result, RuntimeConfig, TransportMode};

/// Named pipe published by the runtime on Windows hosts.
#[cfg(windows)]
pub const WINDOWS_PIPE: &str = r"\\.\pipe\docker_engine";

/// Loopback fallbacks appended after the configured TCP endpoint.
const FALLBACK_HOSTS: &[(&str, u16)] = &[("127.0.0.1", 2375), ("localhost", 2375)];

/// One transport target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    #[cfg(unix)]
    Socket(PathBuf),
    #[cfg(windows)]
    Pipe(String),
    Tcp(String, u16),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(unix)]
            Target::Socket(path) => write!(f, "unix://{}", path.display()),
            #[cfg(windows)]
            Target::Pipe(name) => write!(f, "npipe://{name}"),
            Target::Tcp(host, port) => write!(f, "tcp://{host}:{port}"),
        }
    }
}

/// One negotiation candidate with a human-readable method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub target: Target,
    pub method: &'static str,
}

/// Build the ordered candidate list for one negotiation.
///
/// Order: local socket / named pipe first (unless forced TCP), then the
/// configured `host:port`, then the loopback fallbacks. A `socket`
/// override restricts the list to the socket branch; a `tcp` override
/// never touches the socket, even if the path exists.
pub fn candidates_for(config: &RuntimeConfig) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    if config.transport != TransportMode::Tcp {
        #[cfg(unix)]
        if config.socket_path.exists() || config.transport == TransportMode::Socket {
            candidates.push(Candidate {
                target: Target::Socket(config.socket_path.clone()),
                method: "local socket",
            });
        }

        #[cfg(windows)]
        candidates.push(Candidate {
            target: Target::Pipe(WINDOWS_PIPE.to_string()),
            method: "named pipe",
        });
    }

    if config.transport == TransportMode::Socket {
        return candidates;
    }

    candidates.push(Candidate {
        target: Target::Tcp(config.host.clone(), config.port),
        method: "configured tcp",
    });

    for (host, port) in FALLBACK_HOSTS {
        let target = Target::Tcp((*host).to_string(), *port);
        if candidates.iter().any(|c| c.target == target) {
            continue;
        }
        candidates.push(Candidate {
            target,
            method: "loopback tcp",
        });
    }

    candidates
}

/// Negotiate a transport to the container runtime.
///
/// Each candidate is probed with `GET /_ping` under the configured
/// connection timeout. Failures are logged and the next candidate tried;
/// only full exhaustion surfaces an error, wrapping the last underlying
/// failure.
pub async fn negotiate(config: &RuntimeConfig) -> Result<RuntimeClient> {
    let candidates = candidates_for(config);
    if candidates.is_empty() {
        return Err(Error::connectivity(
            "no runtime transport candidates available",
        ));
    }

    let mut last_error = String::from("no candidates attempted");
    for candidate in candidates {
        tracing::debug!(
            "Trying runtime transport {} ({})",
            candidate.target,
            candidate.method
        );

        let client = RuntimeClient::new(candidate.target.clone(), config.connect_timeout);
        match client.ping().await {
            Ok(()) => {
                tracing::info!(
                    "Connected to container runtime via {} ({})",
                    candidate.target,
                    candidate.method
                );
                return Ok(client);
            }
            Err(err) => {
                tracing::warn!(
                    "Runtime transport {} ({}) failed: {err}",
                    candidate.target,
                    candidate.method
                );
                last_error = err.to_string();
            }
        }
    }

    Err(Error::connectivity(format!(
        "all runtime transports exhausted: {last_error}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn config_with(transport: TransportMode, socket_path: PathBuf) -> RuntimeConfig {
        RuntimeConfig {
            transport,
            host: "runtime-host".to_string(),
            port: 2375,
            socket_path,
            connect_timeout: Duration::from_secs(1),
        }
    }

    #[cfg(unix)]
    #[test]
    fn auto_tries_existing_socket_before_tcp() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("runtime.sock");
        std::fs::write(&socket, b"").unwrap();

        let candidates = candidates_for(&config_with(TransportMode::Auto, socket.clone()));

        assert_eq!(candidates[0].target, Target::Socket(socket));
        assert_eq!(
            candidates[1].target,
            Target::Tcp("runtime-host".to_string(), 2375)
        );
        assert_eq!(candidates.len(), 4);
    }

    #[cfg(unix)]
    #[test]
    fn auto_skips_missing_socket() {
        let candidates =
            candidates_for(&config_with(TransportMode::Auto, "/nonexistent.sock".into()));
        assert!(candidates
            .iter()
            .all(|c| matches!(c.target, Target::Tcp(_, _))));
    }

    #[cfg(unix)]
    #[test]
    fn tcp_override_never_attempts_existing_socket() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("runtime.sock");
        std::fs::write(&socket, b"").unwrap();

        let candidates = candidates_for(&config_with(TransportMode::Tcp, socket));
        assert!(candidates
            .iter()
            .all(|c| matches!(c.target, Target::Tcp(_, _))));
    }

    #[cfg(unix)]
    #[test]
    fn socket_override_is_socket_only() {
        let candidates =
            candidates_for(&config_with(TransportMode::Socket, "/missing.sock".into()));
        assert_eq!(candidates.len(), 1);
        assert!(matches!(candidates[0].target, Target::Socket(_)));
    }

    #[test]
    fn loopback_fallbacks_are_deduplicated() {
        let mut config = config_with(TransportMode::Tcp, "/nonexistent.sock".into());
        config.host = "127.0.0.1".to_string();

        let candidates = candidates_for(&config);
        assert_eq!(candidates.len(), 2);
        assert_eq!(
            candidates[1].target,
            Target::Tcp("localhost".to_string(), 2375)
        );
    }

    /// Minimal fake runtime endpoint: answers any request with 200 "OK".
    async fn fake_runtime() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = stream.read(&mut buf).await;
                    let _ = stream
                        .write_all(
                            b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nOK",
                        )
                        .await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        addr
    }

    #[tokio::test]
    async fn negotiate_stops_at_first_successful_candidate() {
        let addr = fake_runtime().await;

        let mut config = config_with(TransportMode::Tcp, "/nonexistent.sock".into());
        config.host = addr.ip().to_string();
        config.port = addr.port();

        let client = negotiate(&config).await.unwrap();
        assert!(matches!(client.target(), Target::Tcp(_, _)));
        client.ping().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn negotiate_fails_after_exhausting_candidates() {
        // Socket-only override with a missing socket keeps the test hermetic:
        // exactly one candidate, guaranteed to fail.
        let config = config_with(TransportMode::Socket, "/nonexistent.sock".into());
        let result = negotiate(&config).await;

        assert!(matches!(result, Err(Error::Connectivity(_))));
    }
}
