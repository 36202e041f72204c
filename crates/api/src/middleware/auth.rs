//! Authentication middleware for protected routes.
//!
//! Token issuance happens elsewhere; this boundary only validates bearer
//! tokens and turns their claims into the acting user.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use reimburse_core::approval::{Actor, UserRole};
use reimburse_shared::{Claims, JwtError};
use serde_json::json;
use uuid::Uuid;

use crate::AppState;
use crate::error::forbidden;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Authentication middleware that validates JWT tokens.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates the token using the JWT service
/// 3. Stores the claims in request extensions for handlers to access
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "missing_token",
                "message": "Authorization header with Bearer token is required"
            })),
        )
            .into_response();
    };

    match state.jwt_service.validate_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            let (error, message) = match e {
                JwtError::Expired => ("token_expired", "Token has expired"),
                _ => ("invalid_token", "Invalid or malformed token"),
            };

            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": error, "message": message })),
            )
                .into_response()
        }
    }
}

/// Extractor for the authenticated user.
///
/// Rejects requests whose claims carry an unknown role.
#[derive(Debug, Clone)]
pub struct AuthUser {
    claims: Claims,
    role: UserRole,
}

impl AuthUser {
    /// Returns the user ID from the claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.claims.user_id()
    }

    /// Returns the company ID from the claims.
    #[must_use]
    pub const fn company_id(&self) -> Uuid {
        self.claims.company_id()
    }

    /// Returns the user's role.
    #[must_use]
    pub const fn role(&self) -> UserRole {
        self.role
    }

    /// Returns the acting user as the routing engine sees it.
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.user_id().into(),
            role: self.role,
            company_id: self.company_id().into(),
        }
    }

    /// Returns the inner claims.
    #[must_use]
    pub const fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Passes if the user holds one of `roles`.
    pub fn require_role(&self, roles: &[UserRole]) -> Result<(), Response> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(forbidden("Insufficient role for this operation"))
        }
    }

    /// Passes for admins only.
    pub fn require_admin(&self) -> Result<(), Response> {
        self.require_role(&[UserRole::Admin])
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let unauthorized = |message: &str| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "unauthorized",
                    "message": message
                })),
            )
        };

        let claims = parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or_else(|| unauthorized("Authentication required"))?;
        let role =
            UserRole::parse(&claims.role).ok_or_else(|| unauthorized("Unknown role in token"))?;

        Ok(Self { claims, role })
    }
}
