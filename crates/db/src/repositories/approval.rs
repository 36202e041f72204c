//! Approval repository: persists approve, reject and override transitions.
//!
//! Every transition runs in one database transaction:
//! 1. Read the expense, its history, the company's users and policies
//! 2. Compute the transition in the routing engine
//! 3. Append the history entry
//! 4. Update the expense only if it is still pending at the version read
//!
//! If step 4 matches no row another actor got there first; the transaction
//! is dropped, which rolls the history entry back as well.

use reimburse_core::approval::{
    Actor, ApprovalDecision, ApprovalEngine, ApprovalError, Expense, RoutingOutcome, Transition,
};
use reimburse_shared::ManagerFlagLocation;
use reimburse_shared::types::UserId;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::entities::{expenses, sea_orm_active_enums::ExpenseStatus};

use super::error::RepositoryError;
use super::mapping::{core_status_to_db, expense_from_model, history_active_model};
use super::routing::{load_directory, load_ledger, load_policies};

/// Approval repository.
#[derive(Debug, Clone)]
pub struct ApprovalRepository {
    db: DatabaseConnection,
    manager_flag: ManagerFlagLocation,
}

impl ApprovalRepository {
    /// Creates a new approval repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            manager_flag: ManagerFlagLocation::default(),
        }
    }

    /// Sets whose flag gates routing to the submitter's manager.
    #[must_use]
    pub const fn with_manager_flag(mut self, manager_flag: ManagerFlagLocation) -> Self {
        self.manager_flag = manager_flag;
        self
    }

    /// Applies the current approver's decision.
    ///
    /// # Errors
    ///
    /// Returns `InvalidApprovalTarget` when the expense is missing, in another
    /// company, not pending, not assigned to `actor`, or was changed
    /// concurrently.
    pub async fn act(
        &self,
        actor: &Actor,
        expense_id: Uuid,
        decision: ApprovalDecision,
        comments: Option<String>,
    ) -> Result<Expense, RepositoryError> {
        let txn = self.db.begin().await?;
        let expense = find_target(&txn, actor, expense_id).await?;

        let mut ledger = load_ledger(&txn, expense_id).await?;
        let directory = load_directory(&txn, actor.company_id.into_inner()).await?;
        let policies = load_policies(&txn, actor.company_id.into_inner()).await?;

        let transition = ApprovalEngine::new(&policies, &directory)
            .with_manager_flag(self.manager_flag)
            .act(&expense, actor, decision, &mut ledger, comments)?;

        persist(txn, expense, &transition).await
    }

    /// Forces a pending expense to approved or rejected. Admins only.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` for non-admins and `InvalidApprovalTarget` when the
    /// expense is missing, in another company, or no longer pending.
    pub async fn override_decision(
        &self,
        actor: &Actor,
        expense_id: Uuid,
        decision: ApprovalDecision,
        comments: Option<&str>,
    ) -> Result<Expense, RepositoryError> {
        ApprovalEngine::ensure_can_override(actor)?;

        let txn = self.db.begin().await?;
        let expense = find_target(&txn, actor, expense_id).await?;

        let mut ledger = load_ledger(&txn, expense_id).await?;
        let directory = load_directory(&txn, actor.company_id.into_inner()).await?;
        let policies = load_policies(&txn, actor.company_id.into_inner()).await?;

        let transition = ApprovalEngine::new(&policies, &directory)
            .override_decision(&expense, actor, decision, &mut ledger, comments)?;

        persist(txn, expense, &transition).await
    }
}

/// Expense in the actor's company; anything else is reported as an invalid
/// target so callers cannot probe for other companies' expenses.
async fn find_target(
    txn: &DatabaseTransaction,
    actor: &Actor,
    expense_id: Uuid,
) -> Result<Expense, RepositoryError> {
    let row = expenses::Entity::find_by_id(expense_id)
        .filter(expenses::Column::CompanyId.eq(actor.company_id.into_inner()))
        .one(txn)
        .await?
        .ok_or(ApprovalError::InvalidApprovalTarget)?;
    expense_from_model(row)
}

async fn persist(
    txn: DatabaseTransaction,
    mut expense: Expense,
    transition: &Transition,
) -> Result<Expense, RepositoryError> {
    let read_version = expense.version;

    if let Some(entry) = &transition.history {
        history_active_model(entry).insert(&txn).await?;
    }

    transition.apply(&mut expense);
    let changes = expenses::ActiveModel {
        status: Set(core_status_to_db(expense.status)),
        current_approver_id: Set(expense.current_approver_id.map(UserId::into_inner)),
        approval_step: Set(expense.approval_step),
        version: Set(expense.version),
        updated_at: Set(expense.updated_at.into()),
        ..Default::default()
    };

    let result = expenses::Entity::update_many()
        .set(changes)
        .filter(expenses::Column::Id.eq(expense.id.into_inner()))
        .filter(expenses::Column::Version.eq(read_version))
        .filter(expenses::Column::Status.eq(ExpenseStatus::Pending))
        .exec(&txn)
        .await?;

    if result.rows_affected == 0 {
        warn!(
            expense_id = %expense.id,
            version = read_version,
            "Expense changed concurrently; transition discarded"
        );
        return Err(ApprovalError::InvalidApprovalTarget.into());
    }

    txn.commit().await.map_err(|e| {
        error!(expense_id = %expense.id, error = %e, "Failed to commit approval transition");
        e
    })?;

    log_transition(&expense, transition);
    Ok(expense)
}

fn log_transition(expense: &Expense, transition: &Transition) {
    if let RoutingOutcome::StaleApprover { approver_id } = transition.outcome {
        warn!(
            expense_id = %expense.id,
            approver_id = %approver_id,
            "Next approver no longer exists; expense auto-approved"
        );
    }
    info!(
        expense_id = %expense.id,
        status = expense.status.as_str(),
        step = expense.approval_step,
        outcome = ?transition.outcome,
        "Approval transition applied"
    );
}
