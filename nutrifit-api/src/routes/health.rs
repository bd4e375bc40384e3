use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use diesel::prelude::*;
use std::sync::Arc;

use nutrifit_shared::types::api::{HealthCheck, HealthResponse, HealthStatus};

use crate::AppState;

/// Liveness: the process is up and serving.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy("nutrifit-api", env!("CARGO_PKG_VERSION")))
}

/// Readiness: liveness plus a round trip to PostgreSQL.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> Response {
    let database = match state.db.get() {
        Ok(mut conn) => match diesel::sql_query("SELECT 1").execute(&mut conn) {
            Ok(_) => HealthCheck::healthy("database"),
            Err(e) => HealthCheck::unhealthy("database", e.to_string()),
        },
        Err(e) => HealthCheck::unhealthy("database", e.to_string()),
    };

    let response = HealthResponse::healthy("nutrifit-api", env!("CARGO_PKG_VERSION"))
        .with_checks(vec![database]);

    let status = match response.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };

    (status, Json(response)).into_response()
}
