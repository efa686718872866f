use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

pub use super::receivable::SettlementStatus;

/// Amount the company owes a supplier
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payable")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub company_id: i32,

    pub supplier_id: Option<i32>,

    pub title: String,

    pub issue_date: NaiveDate,

    pub due_date: NaiveDate,

    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,

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
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
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
