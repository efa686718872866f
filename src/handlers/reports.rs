use super::common::{map_service_error, success_response, CompanyQuery, Notice};
use crate::{
    entities::company::Model as CompanyModel, errors::ApiError, services::IncomeStatement,
    ApiResponse, AppState,
};
use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct IncomeStatementView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanyModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<IncomeStatement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

pub async fn income_statement(
    State(state): State<AppState>,
    Query(query): Query<CompanyQuery>,
) -> Result<Response, ApiError> {
    let services = &state.services;
    let Some(company) = services
        .companies
        .resolve(query.company_id)
        .await
        .map_err(map_service_error)?
    else {
        return Ok(success_response(ApiResponse::success(IncomeStatementView {
            company: None,
            statement: None,
            notice: Some(Notice::warning("Register a company first")),
        })));
    };

    let statement = services
        .reports
        .income_statement(company.id)
        .await
        .map_err(map_service_error)?;

    let notice = match statement {
        Some(_) => None,
        None => Some(Notice::info("No entries registered yet")),
    };

    Ok(success_response(ApiResponse::success(IncomeStatementView {
        company: Some(company),
        statement,
        notice,
    })))
}
