//! Loads the inputs the routing engine reads: users, policies and history.
//!
//! Generic over `ConnectionTrait` so the same loaders run inside a
//! transaction or against the pool.

use reimburse_core::approval::{HistoryLedger, PolicySet, UserDirectory};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::{approval_flows, approval_history, approval_rules, users};

use super::error::RepositoryError;
use super::mapping::{flow_from_model, history_from_model, rule_from_model, user_from_model};

/// Every user of the company, active or not.
pub(crate) async fn load_directory<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
) -> Result<UserDirectory, RepositoryError> {
    let rows = users::Entity::find()
        .filter(users::Column::CompanyId.eq(company_id))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(user_from_model).collect())
}

/// Flows and rules of the company, inactive ones included; the resolver
/// skips those.
pub(crate) async fn load_policies<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
) -> Result<PolicySet, RepositoryError> {
    let flows = approval_flows::Entity::find()
        .filter(approval_flows::Column::CompanyId.eq(company_id))
        .all(conn)
        .await?
        .into_iter()
        .map(flow_from_model)
        .collect::<Result<Vec<_>, _>>()?;

    let rules = approval_rules::Entity::find()
        .filter(approval_rules::Column::CompanyId.eq(company_id))
        .all(conn)
        .await?
        .into_iter()
        .map(rule_from_model)
        .collect();

    Ok(PolicySet::new(flows, rules))
}

/// History of one expense, oldest first.
pub(crate) async fn load_ledger<C: ConnectionTrait>(
    conn: &C,
    expense_id: Uuid,
) -> Result<HistoryLedger, RepositoryError> {
    let rows = approval_history::Entity::find()
        .filter(approval_history::Column::ExpenseId.eq(expense_id))
        .order_by_asc(approval_history::Column::CreatedAt)
        .order_by_asc(approval_history::Column::Id)
        .all(conn)
        .await?;
    Ok(HistoryLedger::from_entries(
        rows.into_iter().map(history_from_model).collect(),
    ))
}
