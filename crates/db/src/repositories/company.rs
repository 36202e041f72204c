//! Company repository: details, settings, statistics and categories.

use chrono::Utc;
use reimburse_core::approval::Company;
use reimburse_core::merge_categories;
use reimburse_shared::types::CurrencyCode;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{
    companies, expenses,
    sea_orm_active_enums::{ExpenseStatus, UserRole},
    users,
};

use super::error::RepositoryError;
use super::mapping::{company_from_model, required_text};

/// Input for creating a company.
#[derive(Debug, Clone)]
pub struct CreateCompanyInput {
    /// Display name.
    pub name: String,
    /// Base currency for converted amounts.
    pub currency: CurrencyCode,
    /// Country name.
    pub country: String,
}

/// Input for updating a company. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateCompanyInput {
    /// New name.
    pub name: Option<String>,
    /// New base currency.
    pub currency: Option<CurrencyCode>,
    /// New country.
    pub country: Option<String>,
}

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyStats {
    /// Users with the employee role.
    pub employee_count: u64,
    /// Users with the manager role.
    pub manager_count: u64,
    /// All expenses ever submitted.
    pub total_expenses: u64,
    /// Expenses still awaiting a decision.
    pub pending_expenses: u64,
    /// Approved expenses.
    pub approved_expenses: u64,
    /// Sum of approved converted amounts, in the company currency.
    pub approved_amount: Decimal,
}

/// Company repository.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    db: DatabaseConnection,
}

impl CompanyRepository {
    /// Creates a new company repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a company.
    pub async fn create(&self, input: CreateCompanyInput) -> Result<Company, RepositoryError> {
        let name = required_text(&input.name, "name")?;
        let country = required_text(&input.country, "country")?;
        let now = Utc::now().into();

        let model = companies::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name),
            currency: Set(input.currency.to_string()),
            country: Set(country),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        company_from_model(model)
    }

    /// Finds a company by ID.
    pub async fn find(&self, company_id: Uuid) -> Result<Company, RepositoryError> {
        let model = companies::Entity::find_by_id(company_id)
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::NotFound("Company"))?;
        company_from_model(model)
    }

    /// Updates name, currency or country.
    ///
    /// Changing the currency does not re-convert existing expenses.
    pub async fn update(
        &self,
        company_id: Uuid,
        input: UpdateCompanyInput,
    ) -> Result<Company, RepositoryError> {
        let model = companies::Entity::find_by_id(company_id)
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::NotFound("Company"))?;

        let mut active: companies::ActiveModel = model.into();
        if let Some(name) = input.name {
            active.name = Set(required_text(&name, "name")?);
        }
        if let Some(currency) = input.currency {
            active.currency = Set(currency.to_string());
        }
        if let Some(country) = input.country {
            active.country = Set(required_text(&country, "country")?);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&self.db).await?;
        company_from_model(updated)
    }

    /// Counts users and expenses for the company.
    pub async fn stats(&self, company_id: Uuid) -> Result<CompanyStats, RepositoryError> {
        let employee_count = self.count_users(company_id, UserRole::Employee).await?;
        let manager_count = self.count_users(company_id, UserRole::Manager).await?;
        let total_expenses = self.count_expenses(company_id, None).await?;
        let pending_expenses = self
            .count_expenses(company_id, Some(ExpenseStatus::Pending))
            .await?;
        let approved_expenses = self
            .count_expenses(company_id, Some(ExpenseStatus::Approved))
            .await?;

        let approved_amounts: Vec<Decimal> = expenses::Entity::find()
            .filter(expenses::Column::CompanyId.eq(company_id))
            .filter(expenses::Column::Status.eq(ExpenseStatus::Approved))
            .select_only()
            .column(expenses::Column::ConvertedAmount)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(CompanyStats {
            employee_count,
            manager_count,
            total_expenses,
            pending_expenses,
            approved_expenses,
            approved_amount: approved_amounts.into_iter().sum(),
        })
    }

    /// Default categories followed by the ones the company already uses.
    pub async fn categories(&self, company_id: Uuid) -> Result<Vec<String>, RepositoryError> {
        let used: Vec<String> = expenses::Entity::find()
            .filter(expenses::Column::CompanyId.eq(company_id))
            .select_only()
            .column(expenses::Column::Category)
            .distinct()
            .order_by_asc(expenses::Column::Category)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(merge_categories(used))
    }

    async fn count_users(&self, company_id: Uuid, role: UserRole) -> Result<u64, RepositoryError> {
        let count = users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .filter(users::Column::Role.eq(role))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn count_expenses(
        &self,
        company_id: Uuid,
        status: Option<ExpenseStatus>,
    ) -> Result<u64, RepositoryError> {
        let mut query = expenses::Entity::find().filter(expenses::Column::CompanyId.eq(company_id));
        if let Some(status) = status {
            query = query.filter(expenses::Column::Status.eq(status));
        }
        Ok(query.count(&self.db).await?)
    }
}
