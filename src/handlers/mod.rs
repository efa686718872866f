pub mod actions;
pub mod common;
pub mod entries;
pub mod home;
pub mod reports;

use crate::{
    db::DbPool,
    services::{CompanyService, LedgerService, ReportService},
};
use std::sync::Arc;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub companies: Arc<CompanyService>,
    pub ledger: Arc<LedgerService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, currency_symbol: &str) -> Self {
        Self {
            companies: Arc::new(CompanyService::new(db_pool.clone())),
            ledger: Arc::new(LedgerService::new(db_pool.clone())),
            reports: Arc::new(ReportService::new(db_pool, currency_symbol)),
        }
    }
}
