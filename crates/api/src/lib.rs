//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication middleware
//! - Error-to-response mapping

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use reimburse_core::currency::CurrencyConverter;
use reimburse_db::{ApprovalRepository, ExpenseRepository};
use reimburse_shared::{JwtService, ManagerFlagLocation};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Converter into company base currencies.
    pub converter: Arc<CurrencyConverter>,
    /// Whose flag gates routing to the submitter's manager.
    pub manager_flag: ManagerFlagLocation,
}

impl AppState {
    /// Expense repository configured with this state's converter and routing settings.
    #[must_use]
    pub fn expenses(&self) -> ExpenseRepository {
        ExpenseRepository::new((*self.db).clone())
            .with_converter(Arc::clone(&self.converter))
            .with_manager_flag(self.manager_flag)
    }

    /// Approval repository configured with this state's routing settings.
    #[must_use]
    pub fn approvals(&self) -> ApprovalRepository {
        ApprovalRepository::new((*self.db).clone()).with_manager_flag(self.manager_flag)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
