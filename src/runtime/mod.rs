//! Container runtime connectivity and service discovery.
//!
//! Split into three concerns: transport negotiation (`transport`), the REST
//! client bound to the negotiated transport (`client`), and the mapping from
//! containers to logical services (`status`).

mod client;
mod status;
mod transport;

pub use client::{ContainerInspect, ContainerState, ContainerSummary, HealthState, RuntimeClient};
pub use status::{status_for, ServiceStatus, DEFAULT_SERVICES, PLUGIN_LABEL, SERVICE_LABEL};
pub use transport::{candidates_for, negotiate, Candidate, Target};
