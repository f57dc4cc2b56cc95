//! parley-gateway — HTTP front end for the parley relay
//!
//! Serves the chat endpoint consumed by the web frontend, plus liveness and
//! health probes, behind a CORS policy limited to known development origins.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{DEFAULT_CORS_ORIGINS, GatewayServer, GatewayState};
