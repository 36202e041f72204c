//! Entity re-exports.

pub use super::approval_flows::Entity as ApprovalFlows;
pub use super::approval_history::Entity as ApprovalHistory;
pub use super::approval_rules::Entity as ApprovalRules;
pub use super::companies::Entity as Companies;
pub use super::expenses::Entity as Expenses;
pub use super::users::Entity as Users;
