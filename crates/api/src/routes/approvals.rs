//! Approval action routes.
//!
//! Both endpoints answer every "wrong expense" case with the same 404 so a
//! caller cannot tell a missing expense from one assigned to someone else.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::post,
};
use reimburse_core::approval::{ApprovalDecision, UserRole};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{repository_error_response, validation_error};
use crate::{AppState, middleware::AuthUser};

/// Creates the approval routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/approvals/{expense_id}/action", post(act_on_expense))
        .route("/approvals/{expense_id}/override", post(override_expense))
}

/// Request body for an approval decision.
#[derive(Debug, Deserialize)]
pub struct ApprovalActionRequest {
    /// `approved` or `rejected`.
    pub action: String,
    /// Optional note stored in the history.
    pub comments: Option<String>,
}

fn parse_decision(action: &str) -> Result<ApprovalDecision, Response> {
    ApprovalDecision::parse(action.trim())
        .ok_or_else(|| validation_error("action must be 'approved' or 'rejected'"))
}

/// POST `/approvals/{expense_id}/action` - Approve or reject as the current approver.
async fn act_on_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(expense_id): Path<Uuid>,
    Json(payload): Json<ApprovalActionRequest>,
) -> Response {
    if let Err(response) = auth.require_role(&[UserRole::Manager, UserRole::Admin]) {
        return response;
    }
    let decision = match parse_decision(&payload.action) {
        Ok(decision) => decision,
        Err(response) => return response,
    };

    match state
        .approvals()
        .act(&auth.actor(), expense_id, decision, payload.comments)
        .await
    {
        Ok(expense) => Json(expense).into_response(),
        Err(e) => repository_error_response(&e),
    }
}

/// POST `/approvals/{expense_id}/override` - Force a decision. Admins only.
async fn override_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(expense_id): Path<Uuid>,
    Json(payload): Json<ApprovalActionRequest>,
) -> Response {
    let decision = match parse_decision(&payload.action) {
        Ok(decision) => decision,
        Err(response) => return response,
    };

    match state
        .approvals()
        .override_decision(
            &auth.actor(),
            expense_id,
            decision,
            payload.comments.as_deref(),
        )
        .await
    {
        Ok(expense) => Json(expense).into_response(),
        Err(e) => repository_error_response(&e),
    }
}
