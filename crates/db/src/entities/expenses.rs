//! `SeaORM` Entity for expenses table.

use super::sea_orm_active_enums::ExpenseStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub employee_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub amount: Decimal,
    pub currency: String,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub converted_amount: Decimal,
    pub category: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub expense_date: Date,
    pub status: ExpenseStatus,
    pub approval_step: i32,
    pub current_approver_id: Option<Uuid>,
    pub version: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::companies::Entity",
        from = "Column::CompanyId",
        to = "super::companies::Column::Id"
    )]
    Companies,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::EmployeeId",
        to = "super::users::Column::Id"
    )]
    Employee,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CurrentApproverId",
        to = "super::users::Column::Id"
    )]
    CurrentApprover,
    #[sea_orm(has_many = "super::approval_history::Entity")]
    ApprovalHistory,
}

impl Related<super::companies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Companies.def()
    }
}

impl Related<super::approval_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
