//! API routes

pub mod health;

use axum::Router;
use axum::routing::get;

/// Build the API router
pub fn router() -> Router {
    Router::new().route("/api/v1/health", get(health::health))
}
