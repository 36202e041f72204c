//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod approval;
pub mod approval_flow;
pub mod approval_rule;
pub mod company;
pub mod error;
pub mod expense;
pub mod user;

mod mapping;
mod routing;

pub use approval::ApprovalRepository;
pub use approval_flow::ApprovalFlowRepository;
pub use approval_rule::ApprovalRuleRepository;
pub use company::{CompanyRepository, CompanyStats, CreateCompanyInput, UpdateCompanyInput};
pub use error::RepositoryError;
pub use expense::{ExpenseRepository, ExpenseWithHistory};
pub use user::{CreateUserInput, UpdateUserInput, UserRepository};
