//! Axum HTTP API for the quota ledger.
//!
//! This crate provides:
//! - Quota snapshot, evaluate, consume and plan endpoints
//! - Caller identity from the upstream gateway's `X-User-Id` header
//! - Rate limiting and security headers
//! - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{ApiConfig, StoreBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::QuotaService;
pub use state::AppState;
