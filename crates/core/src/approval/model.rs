//! Domain records the routing engine reads and writes.

use chrono::{DateTime, NaiveDate, Utc};
use reimburse_shared::types::{
    ApprovalFlowId, ApprovalRuleId, CompanyId, CurrencyCode, ExpenseId, HistoryEntryId, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{ExpenseStatus, HistoryAction, RuleType, UserRole};

/// Organizational context for expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Company ID.
    pub id: CompanyId,
    /// Display name.
    pub name: String,
    /// Base currency all expenses are converted into.
    pub currency: CurrencyCode,
    /// Country name.
    pub country: String,
}

/// A user in the company directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: UserId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Role in the company.
    pub role: UserRole,
    /// Direct manager, if any.
    pub manager_id: Option<UserId>,
    /// Gates fallback routing to the manager.
    pub is_manager_approver: bool,
    /// Inactive users are kept for history but not offered as approvers.
    pub is_active: bool,
}

/// The principal performing an operation, as supplied by the identity boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Acting user.
    pub id: UserId,
    /// Acting user's role.
    pub role: UserRole,
    /// Acting user's company.
    pub company_id: CompanyId,
}

/// An expense moving through approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Expense ID.
    pub id: ExpenseId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Submitting employee.
    pub employee_id: UserId,
    /// Amount in the submitted currency.
    pub amount: Decimal,
    /// Submitted currency.
    pub currency: CurrencyCode,
    /// Amount in the company's base currency.
    pub converted_amount: Decimal,
    /// Expense category.
    pub category: String,
    /// Optional free text.
    pub description: Option<String>,
    /// Date the expense was incurred.
    pub expense_date: NaiveDate,
    /// Routing status.
    pub status: ExpenseStatus,
    /// Number of sequential steps entered so far.
    pub approval_step: i32,
    /// Approver the expense is waiting on; `None` once terminal.
    pub current_approver_id: Option<UserId>,
    /// Optimistic concurrency version, bumped on every transition.
    pub version: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// Returns true if `actor` is the approver this expense is waiting on.
    #[must_use]
    pub fn is_awaiting(&self, actor: &Actor) -> bool {
        self.status == ExpenseStatus::Pending
            && self.company_id == actor.company_id
            && self.current_approver_id == Some(actor.id)
    }
}

/// One position in an approval flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStep {
    /// 1-based position in the flow.
    pub order: i32,
    /// Step label, e.g. "Finance review".
    pub name: String,
    /// User who approves at this step.
    pub approver_id: UserId,
}

/// Sequential routing policy scoped to an amount band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalFlow {
    /// Flow ID.
    pub id: ApprovalFlowId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Display name.
    pub name: String,
    /// Ordered approver sequence, never empty.
    pub steps: Vec<ApprovalStep>,
    /// Inclusive lower bound.
    pub min_amount: Decimal,
    /// Inclusive upper bound, `None` = unbounded.
    pub max_amount: Option<Decimal>,
    /// Only active flows are matched.
    pub is_active: bool,
    /// Creation time, used as a deterministic tie-break.
    pub created_at: DateTime<Utc>,
}

/// Conditional routing policy scoped to an amount band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRule {
    /// Rule ID.
    pub id: ApprovalRuleId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Display name.
    pub name: String,
    /// Rule kind.
    pub rule_type: RuleType,
    /// Required share of the sequence, 1..=100.
    pub approval_percentage: Option<i32>,
    /// Approver whose approval settles the expense.
    pub specific_approver_id: Option<UserId>,
    /// Inclusive lower bound.
    pub min_amount: Decimal,
    /// Inclusive upper bound, `None` = unbounded.
    pub max_amount: Option<Decimal>,
    /// Only active rules are matched.
    pub is_active: bool,
    /// Flow providing the approver sequence the rule rides on.
    pub approval_flow_id: Option<ApprovalFlowId>,
    /// Creation time, used as a deterministic tie-break.
    pub created_at: DateTime<Utc>,
}

/// Immutable record of one approval action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Entry ID.
    pub id: HistoryEntryId,
    /// Expense acted on.
    pub expense_id: ExpenseId,
    /// User who acted.
    pub approver_id: UserId,
    /// What they did.
    pub action: HistoryAction,
    /// Optional remarks; overrides are prefixed with "Admin override".
    pub comments: Option<String>,
    /// `Expense::approval_step` at the time of the action.
    pub step: i32,
    /// When the action was recorded.
    pub created_at: DateTime<Utc>,
}
