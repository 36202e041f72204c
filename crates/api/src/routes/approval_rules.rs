//! Approval rule management routes. Admins only.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use reimburse_core::approval::RuleType;
use reimburse_core::approval::validation::RuleInput;
use reimburse_db::ApprovalRuleRepository;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::parse_decimal;
use crate::error::{repository_error_response, validation_error};
use crate::{AppState, middleware::AuthUser};

/// Creates the approval rule routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/company/approval-rules",
            get(list_rules).post(create_rule),
        )
        .route(
            "/company/approval-rules/{id}",
            put(update_rule).delete(delete_rule),
        )
}

/// Request body for creating or replacing a rule.
#[derive(Debug, Deserialize)]
pub struct RuleRequest {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// `percentage`, `specific_approver` or `hybrid`.
    pub rule_type: String,
    /// Required percentage for percentage and hybrid rules.
    pub approval_percentage: Option<i32>,
    /// Required approver for specific_approver and hybrid rules.
    pub specific_approver_id: Option<Uuid>,
    /// Inclusive lower bound, default 0.
    pub min_amount: Option<String>,
    /// Inclusive upper bound.
    pub max_amount: Option<String>,
    /// Active flag, default true.
    pub is_active: Option<bool>,
    /// Flow supplying the approver sequence.
    pub approval_flow_id: Option<Uuid>,
}

impl RuleRequest {
    fn into_input(self) -> Result<RuleInput, Response> {
        let rule_type = RuleType::parse(self.rule_type.trim()).ok_or_else(|| {
            validation_error("rule_type must be 'percentage', 'specific_approver' or 'hybrid'")
        })?;

        Ok(RuleInput {
            min_amount: parse_decimal("min_amount", self.min_amount.as_deref())?,
            max_amount: parse_decimal("max_amount", self.max_amount.as_deref())?,
            name: self.name,
            rule_type,
            approval_percentage: self.approval_percentage,
            specific_approver_id: self.specific_approver_id.map(Into::into),
            is_active: self.is_active,
            approval_flow_id: self.approval_flow_id.map(Into::into),
        })
    }
}

/// GET `/company/approval-rules` - Rules by `min_amount`, lowest first.
async fn list_rules(State(state): State<AppState>, auth: AuthUser) -> Response {
    if let Err(response) = auth.require_admin() {
        return response;
    }

    match ApprovalRuleRepository::new((*state.db).clone())
        .list(auth.company_id())
        .await
    {
        Ok(rules) => Json(json!({ "data": rules })).into_response(),
        Err(e) => repository_error_response(&e),
    }
}

/// POST `/company/approval-rules` - Create a rule.
async fn create_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<RuleRequest>,
) -> Response {
    if let Err(response) = auth.require_admin() {
        return response;
    }
    let input = match payload.into_input() {
        Ok(input) => input,
        Err(response) => return response,
    };

    match ApprovalRuleRepository::new((*state.db).clone())
        .create(auth.company_id(), &input)
        .await
    {
        Ok(rule) => (StatusCode::CREATED, Json(rule)).into_response(),
        Err(e) => repository_error_response(&e),
    }
}

/// PUT `/company/approval-rules/{id}` - Replace a rule.
async fn update_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RuleRequest>,
) -> Response {
    if let Err(response) = auth.require_admin() {
        return response;
    }
    let input = match payload.into_input() {
        Ok(input) => input,
        Err(response) => return response,
    };

    match ApprovalRuleRepository::new((*state.db).clone())
        .update(auth.company_id(), id, &input)
        .await
    {
        Ok(rule) => Json(rule).into_response(),
        Err(e) => repository_error_response(&e),
    }
}

/// DELETE `/company/approval-rules/{id}` - Delete a rule.
async fn delete_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    if let Err(response) = auth.require_admin() {
        return response;
    }

    match ApprovalRuleRepository::new((*state.db).clone())
        .delete(auth.company_id(), id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => repository_error_response(&e),
    }
}
