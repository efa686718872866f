use crate::{
    entities::{
        company::Entity as Company,
        ledger_entry::{self, EntryType, Model as LedgerEntryModel},
    },
    errors::ServiceError,
};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Label for entries without a classification
pub const UNCLASSIFIED_LABEL: &str = "UNCLASSIFIED";

/// Currency prefix when none is configured
pub const DEFAULT_CURRENCY_SYMBOL: &str = "R$";

/// One group of the income statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeStatementLine {
    /// `None` for the unclassified group
    pub entry_type: Option<EntryType>,
    pub label: String,
    pub total: Decimal,
    pub total_display: String,
}

/// Accrual-basis income statement of one company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub lines: Vec<IncomeStatementLine>,
    pub grand_total: Decimal,
    pub grand_total_display: String,
    pub entry_count: usize,
}

/// Group entries by type with [`DEFAULT_CURRENCY_SYMBOL`] formatting
pub fn aggregate(entries: &[LedgerEntryModel]) -> Option<IncomeStatement> {
    aggregate_with_symbol(entries, DEFAULT_CURRENCY_SYMBOL)
}

/// Sum amounts per entry type plus a grand total.
///
/// Groups are ordered by label with the unclassified group last. Returns
/// `None` for an empty slice.
pub fn aggregate_with_symbol(
    entries: &[LedgerEntryModel],
    currency_symbol: &str,
) -> Option<IncomeStatement> {
    if entries.is_empty() {
        return None;
    }

    // (unclassified, label) sorts classified groups first, alphabetically
    let mut groups: BTreeMap<(bool, String), (Option<EntryType>, Decimal)> = BTreeMap::new();
    let mut grand_total = Decimal::ZERO;

    for entry in entries {
        let label = entry
            .entry_type
            .map(|t| t.to_string())
            .unwrap_or_else(|| UNCLASSIFIED_LABEL.to_string());
        let slot = groups
            .entry((entry.entry_type.is_none(), label))
            .or_insert((entry.entry_type, Decimal::ZERO));
        slot.1 += entry.amount;
        grand_total += entry.amount;
    }

    let lines = groups
        .into_iter()
        .map(|((_, label), (entry_type, total))| IncomeStatementLine {
            entry_type,
            label,
            total,
            total_display: format_currency(currency_symbol, total),
        })
        .collect();

    Some(IncomeStatement {
        lines,
        grand_total,
        grand_total_display: format_currency(currency_symbol, grand_total),
        entry_count: entries.len(),
    })
}

/// `R$ 1,300.00`: two decimals rounded half-to-even, comma thousands
/// separators, sign right before the digits.
pub fn format_currency(symbol: &str, amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    let fixed = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{} {}{}.{}", symbol, sign, grouped, frac_part)
}

/// Income statement queries
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DatabaseConnection>,
    currency_symbol: String,
}

impl ReportService {
    pub fn new(db: Arc<DatabaseConnection>, currency_symbol: impl Into<String>) -> Self {
        Self {
            db,
            currency_symbol: currency_symbol.into(),
        }
    }

    /// `None` when the company has no entries yet
    #[instrument(skip(self))]
    pub async fn income_statement(
        &self,
        company_id: i32,
    ) -> Result<Option<IncomeStatement>, ServiceError> {
        if Company::find_by_id(company_id).one(&*self.db).await?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Company {} not found",
                company_id
            )));
        }

        let entries = ledger_entry::Entity::find()
            .filter(ledger_entry::Column::CompanyId.eq(company_id))
            .all(&*self.db)
            .await?;
        debug!(company_id, entries = entries.len(), "Aggregating income statement");

        Ok(aggregate_with_symbol(&entries, &self.currency_symbol))
    }
}
