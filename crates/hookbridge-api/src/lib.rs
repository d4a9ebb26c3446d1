//! # hookbridge-api
//!
//! HTTP API layer for HookBridge built on Axum.
//!
//! Exposes the webhook endpoints (`/get_hook`, `/upload_hook`), a health
//! probe, request logging middleware, and the server run loop.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use state::AppState;
