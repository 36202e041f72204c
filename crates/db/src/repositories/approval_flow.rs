//! Approval flow repository.
//!
//! Flows are validated against the company's users before every write;
//! the stored `steps` column is always a numbered, non-empty array.

use chrono::Utc;
use reimburse_core::approval::ApprovalFlow;
use reimburse_core::approval::validation::{FlowInput, validate_flow};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::approval_flows;

use super::error::RepositoryError;
use super::mapping::{flow_from_model, steps_to_json};
use super::routing::load_directory;

/// Approval flow repository.
#[derive(Debug, Clone)]
pub struct ApprovalFlowRepository {
    db: DatabaseConnection,
}

impl ApprovalFlowRepository {
    /// Creates a new approval flow repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the company's flows by `min_amount`, lowest first.
    pub async fn list(&self, company_id: Uuid) -> Result<Vec<ApprovalFlow>, RepositoryError> {
        approval_flows::Entity::find()
            .filter(approval_flows::Column::CompanyId.eq(company_id))
            .order_by_asc(approval_flows::Column::MinAmount)
            .order_by_asc(approval_flows::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(flow_from_model)
            .collect()
    }

    /// Finds one flow of the company.
    pub async fn find(&self, company_id: Uuid, id: Uuid) -> Result<ApprovalFlow, RepositoryError> {
        flow_from_model(self.find_model(company_id, id).await?)
    }

    /// Validates and stores a new flow.
    pub async fn create(
        &self,
        company_id: Uuid,
        input: &FlowInput,
    ) -> Result<ApprovalFlow, RepositoryError> {
        let directory = load_directory(&self.db, company_id).await?;
        let flow = validate_flow(input, company_id.into(), &directory)?;
        let now = Utc::now().into();

        let model = approval_flows::ActiveModel {
            id: Set(Uuid::now_v7()),
            company_id: Set(company_id),
            name: Set(flow.name),
            steps: Set(steps_to_json(&flow.steps)?),
            min_amount: Set(flow.min_amount),
            max_amount: Set(flow.max_amount),
            is_active: Set(flow.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(flow_id = %model.id, steps = flow.steps.len(), "Approval flow created");
        flow_from_model(model)
    }

    /// Replaces a flow's definition.
    ///
    /// Expenses already in flight keep their step counter and pick up the
    /// new steps on their next approval.
    pub async fn update(
        &self,
        company_id: Uuid,
        id: Uuid,
        input: &FlowInput,
    ) -> Result<ApprovalFlow, RepositoryError> {
        let model = self.find_model(company_id, id).await?;
        let directory = load_directory(&self.db, company_id).await?;
        let flow = validate_flow(input, company_id.into(), &directory)?;

        let mut active: approval_flows::ActiveModel = model.into();
        active.name = Set(flow.name);
        active.steps = Set(steps_to_json(&flow.steps)?);
        active.min_amount = Set(flow.min_amount);
        active.max_amount = Set(flow.max_amount);
        active.is_active = Set(flow.is_active);
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&self.db).await?;
        info!(flow_id = %id, "Approval flow updated");
        flow_from_model(updated)
    }

    /// Deletes a flow. Rules linked to it fall back to band matching.
    pub async fn delete(&self, company_id: Uuid, id: Uuid) -> Result<(), RepositoryError> {
        let result = approval_flows::Entity::delete_many()
            .filter(approval_flows::Column::Id.eq(id))
            .filter(approval_flows::Column::CompanyId.eq(company_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound("Approval flow"));
        }
        info!(flow_id = %id, "Approval flow deleted");
        Ok(())
    }

    async fn find_model(
        &self,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<approval_flows::Model, RepositoryError> {
        approval_flows::Entity::find_by_id(id)
            .filter(approval_flows::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::NotFound("Approval flow"))
    }
}
