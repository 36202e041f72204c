//! Expense repository: submission and read models.
//!
//! Submission converts the amount, asks the routing engine for the initial
//! transition and inserts the already-routed row in one transaction, so a
//! pending expense is never stored without an approver.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use reimburse_core::approval::validation::{NewExpense, validate_expense};
use reimburse_core::approval::{
    Actor, ApprovalEngine, ApprovalError, Expense, ExpenseStatus, HistoryEntry, RoutingOutcome,
};
use reimburse_core::currency::CurrencyConverter;
use reimburse_shared::ManagerFlagLocation;
use reimburse_shared::types::{ExpenseId, PageRequest, PageResponse, UserId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::{approval_history, companies, expenses, sea_orm_active_enums};

use super::error::RepositoryError;
use super::mapping::{company_from_model, core_status_to_db, expense_from_model, history_from_model};
use super::routing::{load_directory, load_ledger, load_policies};

/// An expense together with its approval history, oldest entry first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpenseWithHistory {
    /// The expense.
    #[serde(flatten)]
    pub expense: Expense,
    /// Recorded approval actions.
    pub history: Vec<HistoryEntry>,
}

/// Expense repository.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
    converter: Arc<CurrencyConverter>,
    manager_flag: ManagerFlagLocation,
}

impl ExpenseRepository {
    /// Creates a new expense repository using the reference rate table.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            converter: Arc::new(CurrencyConverter::default()),
            manager_flag: ManagerFlagLocation::default(),
        }
    }

    /// Uses `converter` for amount conversion.
    #[must_use]
    pub fn with_converter(mut self, converter: Arc<CurrencyConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// Sets whose flag gates routing to the submitter's manager.
    #[must_use]
    pub const fn with_manager_flag(mut self, manager_flag: ManagerFlagLocation) -> Self {
        self.manager_flag = manager_flag;
        self
    }

    /// Validates, converts and routes a new expense for `actor`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input, `ConversionUnavailable`
    /// when no rate exists, and `ReferenceIntegrity` when the submitter or
    /// company is gone. Nothing is stored on error.
    pub async fn submit(
        &self,
        actor: &Actor,
        input: &NewExpense,
    ) -> Result<Expense, RepositoryError> {
        let valid = validate_expense(input)?;
        let company_id = actor.company_id.into_inner();

        let txn = self.db.begin().await?;

        let company = companies::Entity::find_by_id(company_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ApprovalError::ReferenceIntegrity("Company does not exist".to_string())
            })?;
        let company = company_from_model(company)?;

        let converted_amount = self
            .converter
            .convert(valid.amount, valid.currency, company.currency)
            .map_err(ApprovalError::from)?;

        let now = Utc::now();
        let mut expense = Expense {
            id: ExpenseId::new(),
            company_id: actor.company_id,
            employee_id: actor.id,
            amount: valid.amount,
            currency: valid.currency,
            converted_amount,
            category: valid.category,
            description: valid.description,
            expense_date: valid.expense_date,
            status: ExpenseStatus::Pending,
            approval_step: 0,
            current_approver_id: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let directory = load_directory(&txn, company_id).await?;
        let policies = load_policies(&txn, company_id).await?;
        let transition = ApprovalEngine::new(&policies, &directory)
            .with_manager_flag(self.manager_flag)
            .submit(&expense)?;
        transition.apply(&mut expense);

        expenses::ActiveModel {
            id: Set(expense.id.into_inner()),
            company_id: Set(company_id),
            employee_id: Set(expense.employee_id.into_inner()),
            amount: Set(expense.amount),
            currency: Set(expense.currency.to_string()),
            converted_amount: Set(expense.converted_amount),
            category: Set(expense.category.clone()),
            description: Set(expense.description.clone()),
            expense_date: Set(expense.expense_date),
            status: Set(core_status_to_db(expense.status)),
            approval_step: Set(expense.approval_step),
            current_approver_id: Set(expense.current_approver_id.map(UserId::into_inner)),
            version: Set(expense.version),
            created_at: Set(expense.created_at.into()),
            updated_at: Set(expense.updated_at.into()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        if let RoutingOutcome::StaleApprover { approver_id } = transition.outcome {
            warn!(
                expense_id = %expense.id,
                approver_id = %approver_id,
                "Routed approver no longer exists; expense auto-approved"
            );
        }
        info!(
            expense_id = %expense.id,
            status = expense.status.as_str(),
            step = expense.approval_step,
            converted_amount = %expense.converted_amount,
            "Expense submitted"
        );

        Ok(expense)
    }

    /// The employee's own expenses, newest first, each with its history.
    pub async fn list_mine(
        &self,
        company_id: Uuid,
        employee_id: Uuid,
    ) -> Result<Vec<ExpenseWithHistory>, RepositoryError> {
        let rows = expenses::Entity::find()
            .filter(expenses::Column::CompanyId.eq(company_id))
            .filter(expenses::Column::EmployeeId.eq(employee_id))
            .order_by_desc(expenses::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut history = self.history_by_expense(ids).await?;

        rows.into_iter()
            .map(|row| {
                let entries = history.remove(&row.id).unwrap_or_default();
                Ok(ExpenseWithHistory {
                    expense: expense_from_model(row)?,
                    history: entries,
                })
            })
            .collect()
    }

    /// Pending expenses currently assigned to `approver_id`, oldest first.
    pub async fn list_for_approval(
        &self,
        company_id: Uuid,
        approver_id: Uuid,
    ) -> Result<Vec<Expense>, RepositoryError> {
        expenses::Entity::find()
            .filter(expenses::Column::CompanyId.eq(company_id))
            .filter(expenses::Column::Status.eq(sea_orm_active_enums::ExpenseStatus::Pending))
            .filter(expenses::Column::CurrentApproverId.eq(approver_id))
            .order_by_asc(expenses::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(expense_from_model)
            .collect()
    }

    /// Every expense of the company, newest first, one page at a time.
    pub async fn list_company(
        &self,
        company_id: Uuid,
        page: &PageRequest,
    ) -> Result<PageResponse<Expense>, RepositoryError> {
        let page = page.normalized();
        let query = expenses::Entity::find().filter(expenses::Column::CompanyId.eq(company_id));

        let total = query.clone().count(&self.db).await?;
        let data = query
            .order_by_desc(expenses::Column::CreatedAt)
            .order_by_desc(expenses::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?
            .into_iter()
            .map(expense_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Loads one expense of the company with its ordered history.
    pub async fn load_expense_with_history(
        &self,
        company_id: Uuid,
        expense_id: Uuid,
    ) -> Result<ExpenseWithHistory, RepositoryError> {
        let row = expenses::Entity::find_by_id(expense_id)
            .filter(expenses::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::NotFound("Expense"))?;
        let ledger = load_ledger(&self.db, expense_id).await?;
        let expense = expense_from_model(row)?;

        Ok(ExpenseWithHistory {
            history: ledger.entries_for(expense.id).cloned().collect(),
            expense,
        })
    }

    async fn history_by_expense(
        &self,
        expense_ids: Vec<Uuid>,
    ) -> Result<HashMap<Uuid, Vec<HistoryEntry>>, RepositoryError> {
        let mut grouped: HashMap<Uuid, Vec<HistoryEntry>> = HashMap::new();
        if expense_ids.is_empty() {
            return Ok(grouped);
        }

        let rows = approval_history::Entity::find()
            .filter(approval_history::Column::ExpenseId.is_in(expense_ids))
            .order_by_asc(approval_history::Column::CreatedAt)
            .order_by_asc(approval_history::Column::Id)
            .all(&self.db)
            .await?;

        for row in rows {
            grouped
                .entry(row.expense_id)
                .or_default()
                .push(history_from_model(row));
        }
        Ok(grouped)
    }
}
