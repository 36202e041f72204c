//! Expense approval routing.
//!
//! This module implements the approval routing engine: policy resolution,
//! the expense state machine and the append-only history ledger.
//!
//! # Modules
//!
//! - `types` - Status, action, rule-type and role enums
//! - `model` - Expense, user, flow, rule and history records
//! - `directory` - User lookup and manager-hierarchy checks
//! - `resolver` - Flow/rule selection by amount band
//! - `ledger` - Append-only approval history
//! - `engine` - Submit, approve, reject and override transitions
//! - `validation` - Input checks for expenses, flows, rules and users

pub mod directory;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod model;
pub mod resolver;
pub mod types;
pub mod validation;

#[cfg(test)]
mod engine_props;
#[cfg(test)]
mod fixtures;
#[cfg(test)]
mod tests;

pub use directory::UserDirectory;
pub use engine::{ApprovalEngine, RoutingOutcome, Transition};
pub use error::ApprovalError;
pub use ledger::HistoryLedger;
pub use model::{Actor, ApprovalFlow, ApprovalRule, ApprovalStep, Company, Expense, HistoryEntry, User};
pub use resolver::{PolicyMatch, PolicySet};
pub use types::{ApprovalDecision, ExpenseStatus, HistoryAction, RuleType, UserRole};
