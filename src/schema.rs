//! Idempotent table creation from the entity definitions.

use crate::entities::{
    chart_of_accounts, client, company, inventory_position, ledger_entry, payable, product,
    receivable, supplier,
};
use crate::errors::ServiceError;
use metrics::{counter, histogram};
use sea_orm::{sea_query::TableCreateStatement, ConnectionTrait, DatabaseConnection, Schema};
use serde::Serialize;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{error, info};

struct TableDef {
    name: &'static str,
    create: fn(&Schema) -> TableCreateStatement,
}

/// Tables in foreign-key dependency order
fn registry() -> &'static [TableDef] {
    static TABLES: OnceLock<Vec<TableDef>> = OnceLock::new();
    TABLES.get_or_init(|| {
        vec![
            TableDef {
                name: "company",
                create: |s| s.create_table_from_entity(company::Entity),
            },
            TableDef {
                name: "chart_of_accounts",
                create: |s| s.create_table_from_entity(chart_of_accounts::Entity),
            },
            TableDef {
                name: "client",
                create: |s| s.create_table_from_entity(client::Entity),
            },
            TableDef {
                name: "supplier",
                create: |s| s.create_table_from_entity(supplier::Entity),
            },
            TableDef {
                name: "product",
                create: |s| s.create_table_from_entity(product::Entity),
            },
            TableDef {
                name: "inventory_position",
                create: |s| s.create_table_from_entity(inventory_position::Entity),
            },
            TableDef {
                name: "ledger_entry",
                create: |s| s.create_table_from_entity(ledger_entry::Entity),
            },
            TableDef {
                name: "receivable",
                create: |s| s.create_table_from_entity(receivable::Entity),
            },
            TableDef {
                name: "payable",
                create: |s| s.create_table_from_entity(payable::Entity),
            },
        ]
    })
}

/// Names of every managed table, in creation order
pub fn table_names() -> Vec<&'static str> {
    registry().iter().map(|spec| spec.name).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaReport {
    pub tables: Vec<&'static str>,
}

/// Create every missing table. Existing tables are left untouched.
pub async fn init_schema(db: &DatabaseConnection) -> Result<SchemaReport, ServiceError> {
    let start = Instant::now();
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    for spec in registry() {
        let mut stmt = (spec.create)(&schema);
        stmt.if_not_exists();

        db.execute(backend.build(&stmt)).await.map_err(|e| {
            error!(table = spec.name, error = %e, "Creating table failed");
            counter!("ledgerbook_schema.init.failure", 1);
            ServiceError::DatabaseError(e)
        })?;
    }

    let elapsed = start.elapsed();
    histogram!("ledgerbook_schema.init.duration", elapsed);
    info!(tables = registry().len(), "Schema initialized in {:?}", elapsed);

    Ok(SchemaReport {
        tables: table_names(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{Database, EntityTrait, PaginatorTrait, Set};

    #[tokio::test]
    async fn init_is_idempotent_and_keeps_rows() {
        let db = Database::connect("sqlite::memory:").await.unwrap();

        let report = init_schema(&db).await.unwrap();
        assert_eq!(report.tables.first(), Some(&"company"));
        assert_eq!(report.tables.len(), 9);

        company::Entity::insert(company::ActiveModel {
            name: Set("Acme".to_string()),
            ..Default::default()
        })
        .exec(&db)
        .await
        .unwrap();

        init_schema(&db).await.unwrap();
        assert_eq!(company::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[test]
    fn create_statements_build_on_every_backend() {
        use sea_orm::DbBackend;

        for backend in [DbBackend::Sqlite, DbBackend::Postgres] {
            let schema = Schema::new(backend);
            for def in registry() {
                let stmt = backend.build(&(def.create)(&schema));
                assert!(
                    stmt.sql.contains(def.name),
                    "{backend:?} statement for {} is missing its table name",
                    def.name
                );
            }
        }
    }

    #[test]
    fn registry_is_built_once() {
        let first = registry().as_ptr();
        let second = registry().as_ptr();
        assert_eq!(first, second);
        assert_eq!(
            table_names(),
            vec![
                "company",
                "chart_of_accounts",
                "client",
                "supplier",
                "product",
                "inventory_position",
                "ledger_entry",
                "receivable",
                "payable",
            ]
        );
    }
}
