/*!
 * # Health Check Module
 *
 * `/health` reports process liveness together with a database ping. The
 * process is considered alive even when the database is not reachable; in
 * that case the status is `degraded`.
 */

use axum::{extract::State, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::AppState;

/// Basic health status
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
    Degraded,
}

/// Health check detail
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthDetail {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Overall health information
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthInfo {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub details: BTreeMap<String, HealthDetail>,
}

impl HealthInfo {
    fn from_details(uptime_seconds: u64, details: BTreeMap<String, HealthDetail>) -> Self {
        let any_down = details
            .values()
            .any(|detail| detail.status != HealthStatus::Up);

        Self {
            status: if any_down {
                HealthStatus::Degraded
            } else {
                HealthStatus::Up
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            uptime_seconds,
            details,
        }
    }
}

/// Basic health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match crate::db::check_connection(&state.db).await {
        Ok(()) => HealthDetail {
            status: HealthStatus::Up,
            message: None,
            timestamp: Utc::now(),
        },
        Err(e) => HealthDetail {
            status: HealthStatus::Down,
            message: Some(e.response_message()),
            timestamp: Utc::now(),
        },
    };

    let mut details = BTreeMap::new();
    details.insert("database".to_string(), database);

    Json(HealthInfo::from_details(
        state.started_at.elapsed().as_secs(),
        details,
    ))
}
