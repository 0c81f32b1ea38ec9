//! # Atrium Core - Control-Plane Service
//!
//! Rust implementation of the platform's core service providing:
//! - Global configuration persistence with section/key validation
//! - Plugin registry with webhook allow-lists and derived callback routes
//! - Worker reload signalling after configuration mutations
//! - Container runtime transport negotiation with ordered fallbacks
//! - Service status resolution from container metadata labels
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────────────────────────┐
//!  HTTP requests →│            API layer             │
//!                 │  ┌──────────┐  ┌──────────────┐  │
//!                 │  │  Global  │  │    Plugin    │  │
//!                 │  │  Config  │  │   Registry   │──┼─→ audit log
//!                 │  └────┬─────┘  └──────┬───────┘  │
//!                 │       └── YAML store ─┴──→ reload │
//!                 │  ┌──────────────────────────────┐│
//!                 │  │ Runtime negotiator → resolver ││
//!                 │  └──────────────────────────────┘│
//!                 └──────────────────────────────────┘
//! ```
//!
//! Durable storage is the source of truth: both documents are re-read at
//! the start of every read or write operation, and each domain's
//! load→mutate→persist cycle runs under a single-writer lock.

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

// Re-export public API
pub mod api;
pub mod audit;
pub mod config;
pub mod plugins;
pub mod reload;
pub mod runtime;
pub mod store;
pub mod types;

// Internal utilities
pub mod observability;

pub use types::{Error, Result, Settings};
