//! Ledgerbook library
//!
//! Bookkeeping for small businesses: a Postgres connection resolver, an
//! idempotent schema initializer, ledger entry registration and an
//! accrual-basis income statement, exposed as a JSON API.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod connection;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod schema;
pub mod services;
pub mod telemetry;

use axum::{
    routing::{get, post},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppConfig;
use crate::connection::ConnectionDescriptor;
use crate::handlers::{common::Notice, AppServices};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub connection: Arc<ConnectionDescriptor>,
    pub services: AppServices,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig, connection: ConnectionDescriptor) -> Self {
        let db = Arc::new(db);
        let services = AppServices::new(db.clone(), &config.currency_symbol);
        Self {
            db,
            config: Arc::new(config),
            connection: Arc::new(connection),
            services,
            started_at: Instant::now(),
        }
    }
}

// Common response wrappers
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: telemetry::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    /// Payload plus the notice text; an error notice marks the response unsuccessful
    pub fn with_notice(data: T, notice: &Notice) -> Self {
        Self {
            success: !notice.is_error(),
            data: Some(data),
            message: Some(notice.message.clone()),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// All application routes, without state
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::home::home))
        .route(
            "/actions/test-connection",
            post(handlers::actions::test_connection),
        )
        .route("/actions/init-schema", post(handlers::actions::init_schema))
        .route("/debug/connection", get(handlers::actions::connection_debug))
        .route(
            "/entries",
            get(handlers::entries::entries_view).post(handlers::entries::register_entry),
        )
        .route("/companies", post(handlers::entries::create_company))
        .route(
            "/income-statement",
            get(handlers::reports::income_statement),
        )
        .route("/health", get(health::health_check))
}

/// Routes with request-id propagation and HTTP tracing applied
pub fn build_router(state: AppState) -> Router {
    app_routes()
        .layer(telemetry::configure_http_tracing())
        .layer(axum::middleware::from_fn(telemetry::request_id_middleware))
        .with_state(state)
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use crate::telemetry::{scope_request_id, RequestId};
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            scope_request_id(RequestId::new("meta-123"), async { ApiResponse::success("ok") })
                .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn error_notice_marks_response_unsuccessful() {
        let notice = Notice::error("Connection failed: timed out");
        let response = scope_request_id(RequestId::new("meta-err"), async {
            ApiResponse::with_notice((), &notice)
        })
        .await;

        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("Connection failed: timed out"));
        assert_eq!(
            response.meta.and_then(|m| m.request_id).as_deref(),
            Some("meta-err")
        );
    }
}
