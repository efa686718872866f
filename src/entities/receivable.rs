use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

/// Settlement state of a receivable or payable title
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementStatus {
    #[sea_orm(string_value = "OPEN")]
    Open,
    #[sea_orm(string_value = "PARTIAL")]
    Partial,
    #[sea_orm(string_value = "SETTLED")]
    Settled,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

/// Amount owed to the company by a client
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "receivable")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub company_id: i32,

    pub client_id: Option<i32>,

    pub title: String,

    pub issue_date: NaiveDate,

    pub due_date: NaiveDate,

    /// Face amount of the title
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,

    /// Outstanding balance
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub balance: Decimal,

    pub status: SettlementStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id"
    )]
    Company,
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            status: Set(SettlementStatus::Open),
            ..ActiveModelTrait::default()
        }
    }
}

impl Model {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == SettlementStatus::Open && self.due_date < today
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn only_open_titles_past_due_are_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let mut title = Model {
            id: 1,
            company_id: 1,
            client_id: None,
            title: "INV-7".into(),
            issue_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            amount: dec!(500),
            balance: dec!(500),
            status: SettlementStatus::Open,
        };
        assert!(title.is_overdue(today));

        title.status = SettlementStatus::Settled;
        assert!(!title.is_overdue(today));

        title.status = SettlementStatus::Open;
        assert!(!title.is_overdue(title.due_date));
    }

    #[test]
    fn new_titles_start_open() {
        let active = ActiveModel::new();
        assert_eq!(active.status, Set(SettlementStatus::Open));
    }
}
