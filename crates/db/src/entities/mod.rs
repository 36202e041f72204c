//! `SeaORM` entity definitions.

pub mod prelude;

pub mod approval_flows;
pub mod approval_history;
pub mod approval_rules;
pub mod companies;
pub mod expenses;
pub mod sea_orm_active_enums;
pub mod users;
