//! One-click maintenance actions. Failures are reported as error notices
//! with HTTP 200 so the caller always gets a renderable result.

use super::common::{success_response, Notice};
use crate::{connection::ConnectionDebugInfo, db, schema, ApiResponse, AppState};
use axum::{extract::State, response::Response};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
pub struct ActionResult {
    pub notice: Notice,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<&'static str>>,
}

pub async fn test_connection(State(state): State<AppState>) -> Response {
    let outcome = db::test_connection(&state.config, &state.connection).await;
    let notice = if outcome.ok {
        Notice::success(outcome.message)
    } else {
        warn!(host = %state.connection.host(), "Connection test failed");
        Notice::error(outcome.message)
    };

    success_response(ApiResponse::with_notice(
        ActionResult {
            notice: notice.clone(),
            tables: None,
        },
        &notice,
    ))
}

pub async fn init_schema(State(state): State<AppState>) -> Response {
    let result = match schema::init_schema(&state.db).await {
        Ok(report) => {
            info!(tables = report.tables.len(), "Schema ready");
            ActionResult {
                notice: Notice::success(format!(
                    "Tables created or verified ({})",
                    report.tables.len()
                )),
                tables: Some(report.tables),
            }
        }
        Err(e) => ActionResult {
            notice: Notice::error(format!("Could not create tables: {}", e)),
            tables: None,
        },
    };

    let notice = result.notice.clone();
    success_response(ApiResponse::with_notice(result, &notice))
}

/// Host, port, origin and query parameters of the active connection
pub async fn connection_debug(State(state): State<AppState>) -> Response {
    let info: ConnectionDebugInfo = state.connection.debug_info();
    success_response(ApiResponse::success(info))
}
