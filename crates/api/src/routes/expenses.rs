//! Expense submission and listing routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use reimburse_core::approval::UserRole;
use reimburse_core::approval::validation::NewExpense;
use reimburse_shared::types::PageRequest;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::parse_decimal;
use crate::error::{forbidden, repository_error_response};
use crate::{AppState, middleware::AuthUser};

/// Creates the expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", get(list_company_expenses).post(create_expense))
        .route("/expenses/my-expenses", get(list_my_expenses))
        .route("/expenses/for-approval", get(list_for_approval))
        .route("/expenses/{id}", get(get_expense))
}

/// Request body for submitting an expense.
#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    /// Amount in the original currency, as a decimal string.
    pub amount: Option<String>,
    /// ISO currency code of `amount`.
    #[serde(default)]
    pub currency: String,
    /// Spending category.
    #[serde(default)]
    pub category: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Date incurred (`YYYY-MM-DD`).
    pub expense_date: Option<NaiveDate>,
}

/// POST `/expenses` - Submit an expense; it is routed immediately.
async fn create_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateExpenseRequest>,
) -> Response {
    let amount = match parse_decimal("amount", payload.amount.as_deref()) {
        Ok(amount) => amount,
        Err(response) => return response,
    };

    let input = NewExpense {
        amount,
        currency: payload.currency,
        category: payload.category,
        description: payload.description,
        expense_date: payload.expense_date,
    };

    match state.expenses().submit(&auth.actor(), &input).await {
        Ok(expense) => (StatusCode::CREATED, Json(expense)).into_response(),
        Err(e) => repository_error_response(&e),
    }
}

/// GET `/expenses/my-expenses` - The caller's expenses with history, newest first.
async fn list_my_expenses(State(state): State<AppState>, auth: AuthUser) -> Response {
    match state
        .expenses()
        .list_mine(auth.company_id(), auth.user_id())
        .await
    {
        Ok(items) => Json(json!({ "data": items })).into_response(),
        Err(e) => repository_error_response(&e),
    }
}

/// GET `/expenses/for-approval` - Pending expenses assigned to the caller.
async fn list_for_approval(State(state): State<AppState>, auth: AuthUser) -> Response {
    if let Err(response) = auth.require_role(&[UserRole::Manager, UserRole::Admin]) {
        return response;
    }

    match state
        .expenses()
        .list_for_approval(auth.company_id(), auth.user_id())
        .await
    {
        Ok(items) => Json(json!({ "data": items })).into_response(),
        Err(e) => repository_error_response(&e),
    }
}

/// GET `/expenses` - All company expenses, paginated. Admins only.
async fn list_company_expenses(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> Response {
    if let Err(response) = auth.require_admin() {
        return response;
    }

    match state.expenses().list_company(auth.company_id(), &page).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => repository_error_response(&e),
    }
}

/// GET `/expenses/{id}` - Expense with history for its owner, its current
/// approver or an admin.
async fn get_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let detail = match state
        .expenses()
        .load_expense_with_history(auth.company_id(), id)
        .await
    {
        Ok(detail) => detail,
        Err(e) => return repository_error_response(&e),
    };

    let actor = auth.actor();
    let allowed = auth.role() == UserRole::Admin
        || detail.expense.employee_id == actor.id
        || detail.expense.current_approver_id == Some(actor.id);
    if !allowed {
        return forbidden("You cannot view this expense");
    }

    Json(detail).into_response()
}
