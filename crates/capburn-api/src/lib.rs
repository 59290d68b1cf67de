//! Axum HTTP server for caption burn-in renders.
//!
//! This crate provides:
//! - `POST /render` over the render pipeline
//! - Liveness and readiness probes
//! - Rate limiting, request ids and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
