use crate::{
    entities::company::{self, Entity as Company, Model as CompanyModel},
    errors::ServiceError,
};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

/// Company bootstrap form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewCompany {
    #[validate(custom = "crate::services::not_blank")]
    pub name: String,
    /// Blank values are stored as absent
    #[serde(default)]
    pub tax_id: Option<String>,
}

impl NewCompany {
    fn normalized_tax_id(&self) -> Option<String> {
        self.tax_id
            .as_deref()
            .map(str::trim)
            .filter(|tax_id| !tax_id.is_empty())
            .map(str::to_string)
    }
}

/// Owns the company table. Companies are created once and never changed.
#[derive(Clone)]
pub struct CompanyService {
    db: Arc<DatabaseConnection>,
}

impl CompanyService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn count(&self) -> Result<u64, ServiceError> {
        Ok(Company::find().count(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, company_id: i32) -> Result<CompanyModel, ServiceError> {
        Company::find_by_id(company_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Company {} not found", company_id)))
    }

    /// The lowest-id company, if any exists
    pub async fn default_company(&self) -> Result<Option<CompanyModel>, ServiceError> {
        Ok(Company::find()
            .order_by_asc(company::Column::Id)
            .one(&*self.db)
            .await?)
    }

    /// Explicit id wins; otherwise fall back to [`Self::default_company`]
    pub async fn resolve(&self, company_id: Option<i32>) -> Result<Option<CompanyModel>, ServiceError> {
        match company_id {
            Some(id) => self.get(id).await.map(Some),
            None => self.default_company().await,
        }
    }

    /// Create the first company.
    ///
    /// Rejected with `Conflict` once any company exists.
    #[instrument(skip(self, input), fields(name = %input.name.trim()))]
    pub async fn bootstrap(&self, input: NewCompany) -> Result<CompanyModel, ServiceError> {
        input.validate()?;

        if self.count().await? > 0 {
            return Err(ServiceError::Conflict(
                "A company is already registered".to_string(),
            ));
        }

        let company = company::ActiveModel {
            name: Set(input.name.trim().to_string()),
            tax_id: Set(input.normalized_tax_id()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        metrics::counter!("ledgerbook.companies.created", 1);
        info!(company_id = company.id, "Company registered");
        Ok(company)
    }
}
