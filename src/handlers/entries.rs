use super::common::{
    created_response, map_service_error, success_response, validate_input, CompanyQuery, Notice,
};
use crate::{
    entities::{company::Model as CompanyModel, ledger_entry::Model as LedgerEntryModel, EntryType},
    errors::ApiError,
    services::{NewCompany, NewLedgerEntry},
    ApiResponse, AppState,
};
use axum::{
    extract::{Query, State},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use sea_orm::Iterable;

/// Entries view, branching on whether a company exists yet
#[derive(Debug, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum EntriesView {
    /// No company yet: only the company form is offered
    Bootstrap {
        notice: Notice,
        required_fields: Vec<&'static str>,
        optional_fields: Vec<&'static str>,
    },
    EntryForm {
        company: CompanyModel,
        entry_types: Vec<EntryType>,
        entries: Vec<LedgerEntryModel>,
    },
}

#[derive(Debug, Serialize)]
pub struct CompanyCreated {
    pub notice: Notice,
    pub company: CompanyModel,
}

#[derive(Debug, Serialize)]
pub struct EntryRegistered {
    pub notice: Notice,
    pub company_id: i32,
    pub entry: LedgerEntryModel,
    pub entries: Vec<LedgerEntryModel>,
}

/// Entry form submission; `company_id` falls back to the default company
#[derive(Debug, Deserialize)]
pub struct RegisterEntryRequest {
    #[serde(default)]
    pub company_id: Option<i32>,
    #[serde(flatten)]
    pub entry: NewLedgerEntry,
}

fn no_company() -> ApiError {
    ApiError::BadRequest("Register a company first".to_string())
}

pub async fn entries_view(
    State(state): State<AppState>,
    Query(query): Query<CompanyQuery>,
) -> Result<Response, ApiError> {
    let services = &state.services;
    let company = services
        .companies
        .resolve(query.company_id)
        .await
        .map_err(map_service_error)?;

    let view = match company {
        None => EntriesView::Bootstrap {
            notice: Notice::info("No company registered yet. Register one to start."),
            required_fields: vec!["name"],
            optional_fields: vec!["tax_id"],
        },
        Some(company) => {
            let entries = services
                .ledger
                .list_entries(company.id)
                .await
                .map_err(map_service_error)?;
            EntriesView::EntryForm {
                company,
                entry_types: EntryType::iter().collect(),
                entries,
            }
        }
    };

    Ok(success_response(ApiResponse::success(view)))
}

pub async fn create_company(
    State(state): State<AppState>,
    Json(input): Json<NewCompany>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let company = state
        .services
        .companies
        .bootstrap(input)
        .await
        .map_err(map_service_error)?;

    let notice = Notice::success(format!("Company \"{}\" registered", company.name));
    Ok(created_response(ApiResponse::with_notice(
        CompanyCreated {
            notice: notice.clone(),
            company,
        },
        &notice,
    )))
}

pub async fn register_entry(
    State(state): State<AppState>,
    Json(request): Json<RegisterEntryRequest>,
) -> Result<Response, ApiError> {
    validate_input(&request.entry)?;

    let services = &state.services;
    let company = services
        .companies
        .resolve(request.company_id)
        .await
        .map_err(map_service_error)?
        .ok_or_else(no_company)?;

    let entry = services
        .ledger
        .register(company.id, request.entry)
        .await
        .map_err(map_service_error)?;
    let entries = services
        .ledger
        .list_entries(company.id)
        .await
        .map_err(map_service_error)?;

    let notice = Notice::success("Entry registered");
    Ok(created_response(ApiResponse::with_notice(
        EntryRegistered {
            notice: notice.clone(),
            company_id: company.id,
            entry,
            entries,
        },
        &notice,
    )))
}
