//! Approval domain enums.
//!
//! Each enum round-trips through its lowercase database/API spelling via
//! `as_str` and `parse`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Expense status in the approval lifecycle.
///
/// The valid transitions are:
/// - Pending → Pending (advance to the next approver)
/// - Pending → Approved (last step, rule satisfied, auto-approval, override)
/// - Pending → Rejected (any rejection, override)
///
/// `Escalated` is reserved: no transition produces it and it is treated as
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    /// Awaiting a decision from the current approver.
    Pending,
    /// Approved, terminal.
    Approved,
    /// Rejected, terminal.
    Rejected,
    /// Reserved, terminal-equivalent.
    Escalated,
}

impl ExpenseStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Escalated => "escalated",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "escalated" => Some(Self::Escalated),
            _ => None,
        }
    }

    /// Returns true once the expense can no longer change.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Action recorded in the approval history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    /// Approver approved.
    Approved,
    /// Approver rejected.
    Rejected,
    /// Reserved.
    Escalated,
}

impl HistoryAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Escalated => "escalated",
        }
    }

    /// Parses an action from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "escalated" => Some(Self::Escalated),
            _ => None,
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decision submitted by an approver or an admin override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalDecision {
    /// Approve the expense.
    Approved,
    /// Reject the expense.
    Rejected,
}

impl ApprovalDecision {
    /// Parses a decision from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// History action recorded for this decision.
    #[must_use]
    pub const fn history_action(self) -> HistoryAction {
        match self {
            Self::Approved => HistoryAction::Approved,
            Self::Rejected => HistoryAction::Rejected,
        }
    }

    /// Terminal status this decision forces under an override.
    #[must_use]
    pub const fn terminal_status(self) -> ExpenseStatus {
        match self {
            Self::Approved => ExpenseStatus::Approved,
            Self::Rejected => ExpenseStatus::Rejected,
        }
    }
}

/// Kind of conditional approval rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// Approved once enough of the sequence has approved.
    Percentage,
    /// Approved once a named approver approves.
    SpecificApprover,
    /// Approved when either condition holds.
    Hybrid,
}

impl RuleType {
    /// Returns the string representation of the rule type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::SpecificApprover => "specific_approver",
            Self::Hybrid => "hybrid",
        }
    }

    /// Parses a rule type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "percentage" => Some(Self::Percentage),
            "specific_approver" => Some(Self::SpecificApprover),
            "hybrid" => Some(Self::Hybrid),
            _ => None,
        }
    }

    /// Returns true if the rule needs `approval_percentage`.
    #[must_use]
    pub fn uses_percentage(&self) -> bool {
        matches!(self, Self::Percentage | Self::Hybrid)
    }

    /// Returns true if the rule needs `specific_approver_id`.
    #[must_use]
    pub fn uses_specific_approver(&self) -> bool {
        matches!(self, Self::SpecificApprover | Self::Hybrid)
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User role within a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Submits expenses.
    Employee,
    /// Submits and approves expenses.
    Manager,
    /// Full company administration.
    Admin,
}

impl UserRole {
    /// Parse a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "employee" => Some(Self::Employee),
            "manager" => Some(Self::Manager),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    /// Managers and admins may act on expenses routed to them.
    #[must_use]
    pub fn can_approve(&self) -> bool {
        matches!(self, Self::Manager | Self::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
