use crate::{
    entities::{
        company::Entity as Company,
        ledger_entry::{self, EntryType, Model as LedgerEntryModel},
    },
    errors::ServiceError,
};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::{Validate, ValidationError};

/// User-supplied values for one ledger entry
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewLedgerEntry {
    /// Defaults to today
    #[serde(default)]
    pub competence_date: Option<NaiveDate>,
    #[serde(default)]
    pub movement_date: Option<NaiveDate>,
    #[validate(custom = "crate::services::not_blank")]
    pub description: String,
    #[validate(custom = "positive_amount")]
    pub amount: Decimal,
    pub entry_type: EntryType,
    #[serde(default)]
    pub account_id: Option<i32>,
    #[serde(default)]
    pub client_id: Option<i32>,
    #[serde(default)]
    pub supplier_id: Option<i32>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub document_ref: Option<String>,
}

fn positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_positive() && !amount.is_zero() {
        Ok(())
    } else {
        let mut err = ValidationError::new("positive_amount");
        err.message = Some("must be greater than zero".into());
        Err(err)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Append-only access to `ledger_entry`
#[derive(Clone)]
pub struct LedgerService {
    db: Arc<DatabaseConnection>,
}

impl LedgerService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Validate and persist one entry for an existing company
    #[instrument(skip(self, input), fields(entry_type = %input.entry_type))]
    pub async fn register(
        &self,
        company_id: i32,
        input: NewLedgerEntry,
    ) -> Result<LedgerEntryModel, ServiceError> {
        input.validate()?;

        let company = Company::find_by_id(company_id).one(&*self.db).await?;
        if company.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Company {} not found",
                company_id
            )));
        }

        let entry = ledger_entry::ActiveModel {
            company_id: Set(company_id),
            competence_date: Set(input
                .competence_date
                .unwrap_or_else(|| Local::now().date_naive())),
            movement_date: Set(input.movement_date),
            description: Set(input.description.trim().to_string()),
            account_id: Set(input.account_id),
            client_id: Set(input.client_id),
            supplier_id: Set(input.supplier_id),
            amount: Set(input.amount),
            entry_type: Set(Some(input.entry_type)),
            origin: Set(non_empty(input.origin)),
            document_ref: Set(non_empty(input.document_ref)),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        metrics::counter!("ledgerbook.entries.registered", 1, "entry_type" => input.entry_type.to_string());
        info!(company_id, entry_id = entry.id, "Ledger entry registered");
        Ok(entry)
    }

    /// Entries of one company in storage order
    pub async fn list_entries(&self, company_id: i32) -> Result<Vec<LedgerEntryModel>, ServiceError> {
        Ok(ledger_entry::Entity::find()
            .filter(ledger_entry::Column::CompanyId.eq(company_id))
            .all(&*self.db)
            .await?)
    }

    pub async fn count_entries(&self, company_id: i32) -> Result<u64, ServiceError> {
        Ok(ledger_entry::Entity::find()
            .filter(ledger_entry::Column::CompanyId.eq(company_id))
            .count(&*self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(description: &str, amount: Decimal) -> NewLedgerEntry {
        NewLedgerEntry {
            competence_date: None,
            movement_date: None,
            description: description.to_string(),
            amount,
            entry_type: EntryType::Expense,
            account_id: None,
            client_id: None,
            supplier_id: None,
            origin: None,
            document_ref: None,
        }
    }

    #[test]
    fn accepts_positive_amount_and_text() {
        assert!(entry("Office rent", dec!(0.01)).validate().is_ok());
    }

    #[test]
    fn rejects_zero_and_negative_amounts() {
        for amount in [dec!(0), dec!(0.00), dec!(-10)] {
            let errors = entry("Office rent", amount).validate().unwrap_err();
            assert!(errors.field_errors().contains_key("amount"), "{amount}");
        }
    }

    #[test]
    fn rejects_whitespace_description() {
        let errors = entry(" \t ", dec!(5)).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("description"));
    }

    #[test]
    fn entry_type_must_be_known_literal() {
        let body = r#"{"description":"x","amount":"1","entry_type":"DIVIDEND"}"#;
        assert!(serde_json::from_str::<NewLedgerEntry>(body).is_err());

        let body = r#"{"description":"x","amount":"1.50","entry_type":"COST"}"#;
        let parsed: NewLedgerEntry = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.entry_type, EntryType::Cost);
        assert_eq!(parsed.amount, dec!(1.50));
    }

    #[test]
    fn blank_optional_text_is_dropped() {
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(Some(" NF-12 ".into())), Some("NF-12".into()));
    }
}
