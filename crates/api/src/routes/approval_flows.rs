//! Approval flow management routes. Admins only.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use reimburse_core::approval::validation::{FlowInput, StepInput};
use reimburse_db::ApprovalFlowRepository;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::parse_decimal;
use crate::error::repository_error_response;
use crate::{AppState, middleware::AuthUser};

/// Creates the approval flow routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/company/approval-flows",
            get(list_flows).post(create_flow),
        )
        .route(
            "/company/approval-flows/{id}",
            put(update_flow).delete(delete_flow),
        )
}

/// One step of a flow request.
#[derive(Debug, Deserialize)]
pub struct StepRequest {
    /// Step label.
    #[serde(default)]
    pub name: String,
    /// Approver for the step.
    pub approver_id: Uuid,
}

/// Request body for creating or replacing a flow.
#[derive(Debug, Deserialize)]
pub struct FlowRequest {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Ordered approver steps; numbered from 1 on save.
    #[serde(default)]
    pub steps: Vec<StepRequest>,
    /// Inclusive lower bound, default 0.
    pub min_amount: Option<String>,
    /// Inclusive upper bound; open-ended when absent.
    pub max_amount: Option<String>,
    /// Active flag, default true.
    pub is_active: Option<bool>,
}

impl FlowRequest {
    fn into_input(self) -> Result<FlowInput, Response> {
        Ok(FlowInput {
            min_amount: parse_decimal("min_amount", self.min_amount.as_deref())?,
            max_amount: parse_decimal("max_amount", self.max_amount.as_deref())?,
            name: self.name,
            steps: self
                .steps
                .into_iter()
                .map(|s| StepInput {
                    name: s.name,
                    approver_id: s.approver_id.into(),
                })
                .collect(),
            is_active: self.is_active,
        })
    }
}

/// GET `/company/approval-flows` - Flows by `min_amount`, lowest first.
async fn list_flows(State(state): State<AppState>, auth: AuthUser) -> Response {
    if let Err(response) = auth.require_admin() {
        return response;
    }

    match ApprovalFlowRepository::new((*state.db).clone())
        .list(auth.company_id())
        .await
    {
        Ok(flows) => Json(json!({ "data": flows })).into_response(),
        Err(e) => repository_error_response(&e),
    }
}

/// POST `/company/approval-flows` - Create a flow.
async fn create_flow(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<FlowRequest>,
) -> Response {
    if let Err(response) = auth.require_admin() {
        return response;
    }
    let input = match payload.into_input() {
        Ok(input) => input,
        Err(response) => return response,
    };

    match ApprovalFlowRepository::new((*state.db).clone())
        .create(auth.company_id(), &input)
        .await
    {
        Ok(flow) => (StatusCode::CREATED, Json(flow)).into_response(),
        Err(e) => repository_error_response(&e),
    }
}

/// PUT `/company/approval-flows/{id}` - Replace a flow.
async fn update_flow(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<FlowRequest>,
) -> Response {
    if let Err(response) = auth.require_admin() {
        return response;
    }
    let input = match payload.into_input() {
        Ok(input) => input,
        Err(response) => return response,
    };

    match ApprovalFlowRepository::new((*state.db).clone())
        .update(auth.company_id(), id, &input)
        .await
    {
        Ok(flow) => Json(flow).into_response(),
        Err(e) => repository_error_response(&e),
    }
}

/// DELETE `/company/approval-flows/{id}` - Delete a flow.
async fn delete_flow(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    if let Err(response) = auth.require_admin() {
        return response;
    }

    match ApprovalFlowRepository::new((*state.db).clone())
        .delete(auth.company_id(), id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => repository_error_response(&e),
    }
}
