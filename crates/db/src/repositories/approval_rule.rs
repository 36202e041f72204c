//! Approval rule repository.
//!
//! Provides CRUD operations for conditional approval rules.

use chrono::Utc;
use reimburse_core::approval::ApprovalRule;
use reimburse_core::approval::validation::{RuleInput, validate_rule};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::approval_rules;

use super::error::RepositoryError;
use super::mapping::{core_rule_type_to_db, rule_from_model};
use super::routing::{load_directory, load_policies};

/// Approval rule repository.
#[derive(Debug, Clone)]
pub struct ApprovalRuleRepository {
    db: DatabaseConnection,
}

impl ApprovalRuleRepository {
    /// Creates a new approval rule repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the company's rules by `min_amount`, lowest first.
    pub async fn list(&self, company_id: Uuid) -> Result<Vec<ApprovalRule>, RepositoryError> {
        let rows = approval_rules::Entity::find()
            .filter(approval_rules::Column::CompanyId.eq(company_id))
            .order_by_asc(approval_rules::Column::MinAmount)
            .order_by_asc(approval_rules::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(rule_from_model).collect())
    }

    /// Validates and stores a new rule.
    pub async fn create(
        &self,
        company_id: Uuid,
        input: &RuleInput,
    ) -> Result<ApprovalRule, RepositoryError> {
        let directory = load_directory(&self.db, company_id).await?;
        let policies = load_policies(&self.db, company_id).await?;
        let rule = validate_rule(input, company_id.into(), &directory, policies.flows())?;
        let now = Utc::now().into();

        let model = approval_rules::ActiveModel {
            id: Set(Uuid::now_v7()),
            company_id: Set(company_id),
            name: Set(rule.name),
            rule_type: Set(core_rule_type_to_db(rule.rule_type)),
            approval_percentage: Set(rule.approval_percentage),
            specific_approver_id: Set(rule.specific_approver_id.map(Into::into)),
            min_amount: Set(rule.min_amount),
            max_amount: Set(rule.max_amount),
            is_active: Set(rule.is_active),
            approval_flow_id: Set(rule.approval_flow_id.map(Into::into)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(rule_id = %model.id, rule_type = rule.rule_type.as_str(), "Approval rule created");
        Ok(rule_from_model(model))
    }

    /// Replaces a rule's definition.
    pub async fn update(
        &self,
        company_id: Uuid,
        id: Uuid,
        input: &RuleInput,
    ) -> Result<ApprovalRule, RepositoryError> {
        let model = approval_rules::Entity::find_by_id(id)
            .filter(approval_rules::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::NotFound("Approval rule"))?;

        let directory = load_directory(&self.db, company_id).await?;
        let policies = load_policies(&self.db, company_id).await?;
        let rule = validate_rule(input, company_id.into(), &directory, policies.flows())?;

        let mut active: approval_rules::ActiveModel = model.into();
        active.name = Set(rule.name);
        active.rule_type = Set(core_rule_type_to_db(rule.rule_type));
        active.approval_percentage = Set(rule.approval_percentage);
        active.specific_approver_id = Set(rule.specific_approver_id.map(Into::into));
        active.min_amount = Set(rule.min_amount);
        active.max_amount = Set(rule.max_amount);
        active.is_active = Set(rule.is_active);
        active.approval_flow_id = Set(rule.approval_flow_id.map(Into::into));
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&self.db).await?;
        info!(rule_id = %id, "Approval rule updated");
        Ok(rule_from_model(updated))
    }

    /// Deletes a rule.
    pub async fn delete(&self, company_id: Uuid, id: Uuid) -> Result<(), RepositoryError> {
        let result = approval_rules::Entity::delete_many()
            .filter(approval_rules::Column::Id.eq(id))
            .filter(approval_rules::Column::CompanyId.eq(company_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound("Approval rule"));
        }
        info!(rule_id = %id, "Approval rule deleted");
        Ok(())
    }
}
