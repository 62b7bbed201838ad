use axum::{Json, extract::State};
use serde::Serialize;

use crate::{AppState, database, error::Result};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'static str>,
}

pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        database: None,
    })
}

/// Fails with a 500 when the pool cannot reach Postgres.
pub async fn readiness_check(State(state): State<AppState>) -> Result<Json<HealthStatus>> {
    database::check_health(&state.db).await?;

    Ok(Json(HealthStatus {
        status: "ready",
        database: Some("connected"),
    }))
}
