//! Health check endpoint

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::core::constants::APP_NAME_LOWER;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub component: &'static str,
    pub version: &'static str,
}

/// Health check endpoint
///
/// A constant triple: the backend is alive as long as the process answers.
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            component: APP_NAME_LOWER,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_returns_constant_triple() {
        let response = HealthResponse {
            status: "ok",
            component: APP_NAME_LOWER,
            version: env!("CARGO_PKG_VERSION"),
        };
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["component"], "statsink");
        assert!(!body["version"].as_str().unwrap().is_empty());
    }
}
