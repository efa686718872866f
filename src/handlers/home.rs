use super::common::{success_response, Notice};
use crate::ApiResponse;
use axum::response::Response;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ActionLink {
    pub method: &'static str,
    pub path: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HomeView {
    pub title: &'static str,
    pub description: &'static str,
    pub notice: Notice,
    pub actions: Vec<ActionLink>,
}

const ACTIONS: [(&str, &str, &str); 7] = [
    ("POST", "/actions/test-connection", "Test database connection"),
    ("POST", "/actions/init-schema", "Create / verify tables"),
    ("GET", "/entries", "Ledger entries"),
    ("POST", "/companies", "Register company"),
    ("POST", "/entries", "Register entry"),
    ("GET", "/income-statement", "Income statement (accrual basis)"),
    ("GET", "/debug/connection", "Connection details"),
];

pub async fn home() -> Response {
    let view = HomeView {
        title: "Ledgerbook",
        description: "Bookkeeping for small businesses: register companies and ledger entries, \
                      then review the accrual-basis income statement.",
        notice: Notice::info(
            "Run \"Test database connection\" first, then \"Create / verify tables\" on a new database.",
        ),
        actions: ACTIONS
            .iter()
            .map(|&(method, path, label)| ActionLink {
                method,
                path,
                label,
            })
            .collect(),
    };

    success_response(ApiResponse::success(view))
}
