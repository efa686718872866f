use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What a product row represents
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    #[sea_orm(string_value = "GOOD")]
    Good,
    #[sea_orm(string_value = "SERVICE")]
    Service,
    /// Raw material consumed by production
    #[sea_orm(string_value = "MATERIAL")]
    Material,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub company_id: i32,

    pub sku: String,

    pub name: String,

    /// Unit of measure (e.g. "UN", "KG", "H")
    pub unit: String,

    pub product_type: ProductType,

    /// Revenue line of the chart of accounts this product books into
    pub revenue_account_id: Option<i32>,
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
        belongs_to = "super::chart_of_accounts::Entity",
        from = "Column::RevenueAccountId",
        to = "super::chart_of_accounts::Column::Id"
    )]
    RevenueAccount,
    #[sea_orm(has_many = "super::inventory_position::Entity")]
    InventoryPosition,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::chart_of_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RevenueAccount.def()
    }
}

impl Related<super::inventory_position::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryPosition.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
