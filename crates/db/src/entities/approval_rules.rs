//! `SeaORM` Entity for approval_rules table.

use super::sea_orm_active_enums::ApprovalRuleType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub rule_type: ApprovalRuleType,
    pub approval_percentage: Option<i32>,
    pub specific_approver_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub min_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))", nullable)]
    pub max_amount: Option<Decimal>,
    pub is_active: bool,
    pub approval_flow_id: Option<Uuid>,
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
        belongs_to = "super::approval_flows::Entity",
        from = "Column::ApprovalFlowId",
        to = "super::approval_flows::Column::Id"
    )]
    ApprovalFlows,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::SpecificApproverId",
        to = "super::users::Column::Id"
    )]
    SpecificApprover,
}

impl Related<super::companies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Companies.def()
    }
}

impl Related<super::approval_flows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalFlows.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
