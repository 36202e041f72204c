//! API route definitions.

use std::str::FromStr;

use axum::{Router, middleware, response::Response};
use rust_decimal::Decimal;

use crate::{AppState, error::validation_error, middleware::auth::auth_middleware};

pub mod approval_flows;
pub mod approval_rules;
pub mod approvals;
pub mod company;
pub mod expenses;
pub mod health;
pub mod users;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(expenses::routes())
        .merge(approvals::routes())
        .merge(company::routes())
        .merge(approval_flows::routes())
        .merge(approval_rules::routes())
        .merge(users::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new().merge(health::routes()).merge(protected_routes)
}

/// Parses an optional decimal string field. Amounts travel as strings.
pub(crate) fn parse_decimal(field: &str, value: Option<&str>) -> Result<Option<Decimal>, Response> {
    match value.map(str::trim) {
        Some(s) if !s.is_empty() => Decimal::from_str(s)
            .map(Some)
            .map_err(|_| validation_error(format!("{field} must be a decimal number"))),
        _ => Ok(None),
    }
}
