//! PassPrep Server - HTTP API and command-line front end
//!
//! Exposes the run ledger over HTTP and drives offline sessions:
//! - `POST /runs`, `GET /runs/:run_id`, `PATCH /runs/:run_id/stages`
//! - `GET /healthz`
//! - `passprep serve | process | show`

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod api_errors;
pub mod commands;
pub mod config;
pub mod handlers;
pub mod telemetry;

pub use api_errors::ApiError;
pub use config::{ConfigError, ServerConfig};
pub use handlers::{build_router, AppState};
pub use telemetry::init_tracing;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
