//! Append-only approval history.
//!
//! The ledger is the single source of truth for how many distinct approvals
//! an expense has received. Entries are never mutated or removed.

use std::collections::HashSet;

use chrono::Utc;
use reimburse_shared::types::{ExpenseId, HistoryEntryId, UserId};

use super::model::HistoryEntry;
use super::types::HistoryAction;

/// Prefix applied to the comments of admin overrides.
pub const OVERRIDE_PREFIX: &str = "Admin override";

/// Builds the comment stored for an admin override.
#[must_use]
pub fn override_comment(comments: Option<&str>) -> String {
    match comments.map(str::trim).filter(|c| !c.is_empty()) {
        Some(c) => format!("{OVERRIDE_PREFIX}: {c}"),
        None => OVERRIDE_PREFIX.to_string(),
    }
}

/// Ordered, append-only history for one or more expenses.
#[derive(Debug, Clone, Default)]
pub struct HistoryLedger {
    entries: Vec<HistoryEntry>,
}

impl HistoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a ledger from persisted entries, oldest first.
    #[must_use]
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }

    /// Appends an entry and returns it.
    pub fn record(
        &mut self,
        expense_id: ExpenseId,
        approver_id: UserId,
        action: HistoryAction,
        step: i32,
        comments: Option<String>,
    ) -> &HistoryEntry {
        self.entries.push(HistoryEntry {
            id: HistoryEntryId::new(),
            expense_id,
            approver_id,
            action,
            comments,
            step,
            created_at: Utc::now(),
        });
        let last = self.entries.len() - 1;
        &self.entries[last]
    }

    /// All entries for an expense, oldest first.
    pub fn entries_for(&self, expense_id: ExpenseId) -> impl Iterator<Item = &HistoryEntry> {
        self.entries
            .iter()
            .filter(move |e| e.expense_id == expense_id)
    }

    /// Approved entries for an expense, oldest first.
    #[must_use]
    pub fn list_approved_for(&self, expense_id: ExpenseId) -> Vec<&HistoryEntry> {
        self.entries_for(expense_id)
            .filter(|e| e.action == HistoryAction::Approved)
            .collect()
    }

    /// Number of distinct users who approved the expense.
    #[must_use]
    pub fn distinct_approvals(&self, expense_id: ExpenseId) -> usize {
        self.list_approved_for(expense_id)
            .into_iter()
            .map(|e| e.approver_id)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Returns true if `approver_id` has approved the expense.
    #[must_use]
    pub fn has_approved(&self, expense_id: ExpenseId, approver_id: UserId) -> bool {
        self.entries_for(expense_id)
            .any(|e| e.action == HistoryAction::Approved && e.approver_id == approver_id)
    }

    /// Total entries held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }
}
