//! User administration routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use reimburse_core::approval::UserRole;
use reimburse_db::UserRepository;
use reimburse_db::repositories::{CreateUserInput, UpdateUserInput};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use uuid::Uuid;

use crate::error::{forbidden, repository_error_response, validation_error};
use crate::{AppState, middleware::AuthUser};

/// Creates the user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/managers", get(list_managers))
        .route("/users/{id}", put(update_user))
}

/// Request body for creating a user.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Login email, stored lowercased.
    #[serde(default)]
    pub email: String,
    /// `admin`, `manager` or `employee`; defaults to employee.
    pub role: Option<String>,
    /// Direct manager.
    pub manager_id: Option<Uuid>,
    /// Whether this user approves their reports first.
    #[serde(default)]
    pub is_manager_approver: bool,
}

/// Request body for updating a user. Absent fields stay unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    /// New name.
    pub name: Option<String>,
    /// New role.
    pub role: Option<String>,
    /// New manager; `null` clears it.
    #[serde(default, deserialize_with = "present")]
    pub manager_id: Option<Option<Uuid>>,
    /// New manager-approver flag.
    pub is_manager_approver: Option<bool>,
    /// Activates or deactivates the user.
    pub is_active: Option<bool>,
}

// Distinguishes an explicit `null` from a missing field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn parse_role(value: &str) -> Result<UserRole, Response> {
    UserRole::parse(value.trim())
        .ok_or_else(|| validation_error("role must be 'admin', 'manager' or 'employee'"))
}

/// GET `/users` - Admins see the whole company, managers their direct reports.
async fn list_users(State(state): State<AppState>, auth: AuthUser) -> Response {
    let repo = UserRepository::new((*state.db).clone());
    let result = match auth.role() {
        UserRole::Admin => repo.list_company(auth.company_id()).await,
        UserRole::Manager => {
            repo.list_direct_reports(auth.company_id(), auth.user_id())
                .await
        }
        UserRole::Employee => return forbidden("Employees cannot list users"),
    };

    match result {
        Ok(users) => Json(json!({ "data": users })).into_response(),
        Err(e) => repository_error_response(&e),
    }
}

/// GET `/users/managers` - Active managers. Admins only.
async fn list_managers(State(state): State<AppState>, auth: AuthUser) -> Response {
    if let Err(response) = auth.require_admin() {
        return response;
    }

    match UserRepository::new((*state.db).clone())
        .list_managers(auth.company_id())
        .await
    {
        Ok(users) => Json(json!({ "data": users })).into_response(),
        Err(e) => repository_error_response(&e),
    }
}

/// POST `/users` - Create a user. Admins only.
async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateUserRequest>,
) -> Response {
    if let Err(response) = auth.require_admin() {
        return response;
    }

    let role = match payload.role.as_deref().map(parse_role).transpose() {
        Ok(role) => role.unwrap_or(UserRole::Employee),
        Err(response) => return response,
    };

    let input = CreateUserInput {
        name: payload.name,
        email: payload.email,
        role,
        manager_id: payload.manager_id.map(Into::into),
        is_manager_approver: payload.is_manager_approver,
    };

    match UserRepository::new((*state.db).clone())
        .create(auth.company_id(), input)
        .await
    {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => repository_error_response(&e),
    }
}

/// PUT `/users/{id}` - Update a user. Admins only.
async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Response {
    if let Err(response) = auth.require_admin() {
        return response;
    }

    let role = match payload.role.as_deref().map(parse_role).transpose() {
        Ok(role) => role,
        Err(response) => return response,
    };

    let input = UpdateUserInput {
        name: payload.name,
        role,
        manager_id: payload.manager_id.map(|m| m.map(Into::into)),
        is_manager_approver: payload.is_manager_approver,
        is_active: payload.is_active,
    };

    match UserRepository::new((*state.db).clone())
        .update(auth.company_id(), id, input)
        .await
    {
        Ok(user) => Json(user).into_response(),
        Err(e) => repository_error_response(&e),
    }
}
