//! Company settings, statistics, approvers and categories.

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use reimburse_db::repositories::UpdateCompanyInput;
use reimburse_db::{CompanyRepository, UserRepository};
use reimburse_shared::types::CurrencyCode;
use serde::Deserialize;
use serde_json::json;

use crate::error::{repository_error_response, validation_error};
use crate::{AppState, middleware::AuthUser};

/// Creates the company routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/company", get(get_company).put(update_company))
        .route("/company/stats", get(get_stats))
        .route("/company/approvers", get(list_approvers))
        .route("/company/categories", get(list_categories))
}

/// Request body for updating the company.
#[derive(Debug, Deserialize)]
pub struct UpdateCompanyRequest {
    /// New name.
    pub name: Option<String>,
    /// New base currency code.
    pub currency: Option<String>,
    /// New country.
    pub country: Option<String>,
}

/// GET `/company` - The caller's company.
async fn get_company(State(state): State<AppState>, auth: AuthUser) -> Response {
    match CompanyRepository::new((*state.db).clone())
        .find(auth.company_id())
        .await
    {
        Ok(company) => Json(company).into_response(),
        Err(e) => repository_error_response(&e),
    }
}

/// PUT `/company` - Update name, currency or country. Admins only.
async fn update_company(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdateCompanyRequest>,
) -> Response {
    if let Err(response) = auth.require_admin() {
        return response;
    }

    let currency = match payload.currency.as_deref().map(CurrencyCode::parse).transpose() {
        Ok(currency) => currency,
        Err(message) => return validation_error(message),
    };

    let input = UpdateCompanyInput {
        name: payload.name,
        currency,
        country: payload.country,
    };

    match CompanyRepository::new((*state.db).clone())
        .update(auth.company_id(), input)
        .await
    {
        Ok(company) => Json(company).into_response(),
        Err(e) => repository_error_response(&e),
    }
}

/// GET `/company/stats` - User and expense counts. Admins only.
async fn get_stats(State(state): State<AppState>, auth: AuthUser) -> Response {
    if let Err(response) = auth.require_admin() {
        return response;
    }

    match CompanyRepository::new((*state.db).clone())
        .stats(auth.company_id())
        .await
    {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => repository_error_response(&e),
    }
}

/// GET `/company/approvers` - Users who can hold a flow step. Admins only.
async fn list_approvers(State(state): State<AppState>, auth: AuthUser) -> Response {
    if let Err(response) = auth.require_admin() {
        return response;
    }

    match UserRepository::new((*state.db).clone())
        .list_approvers(auth.company_id())
        .await
    {
        Ok(users) => Json(json!({ "data": users })).into_response(),
        Err(e) => repository_error_response(&e),
    }
}

/// GET `/company/categories` - Default and previously used categories.
async fn list_categories(State(state): State<AppState>, auth: AuthUser) -> Response {
    match CompanyRepository::new((*state.db).clone())
        .categories(auth.company_id())
        .await
    {
        Ok(categories) => Json(json!({ "data": categories })).into_response(),
        Err(e) => repository_error_response(&e),
    }
}
