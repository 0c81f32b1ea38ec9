//! Core types for the control-plane service.
//!
//! This module provides foundational types used throughout the system:
//! - **Errors**: Application error types with thiserror derives
//! - **Settings**: Process settings loaded from the environment

mod errors;
mod settings;

pub use errors::{Error, Result};
pub use settings::{
    AuditConfig, RuntimeConfig, ServerConfig, Settings, StorageConfig, TransportMode,
};
