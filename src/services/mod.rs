// Bookkeeping services
pub mod companies;
pub mod ledger;
pub mod reports;

use validator::ValidationError;

pub use companies::{CompanyService, NewCompany};
pub use ledger::{LedgerService, NewLedgerEntry};
pub use reports::{IncomeStatement, IncomeStatementLine, ReportService};

/// Rejects empty and whitespace-only text
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some("must not be empty".into());
        Err(err)
    } else {
        Ok(())
    }
}
