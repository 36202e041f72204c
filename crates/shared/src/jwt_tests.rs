//! Unit tests for JWT functionality.

use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use crate::auth::Claims;
use crate::jwt::{JwtConfig, JwtError, JwtService};

fn create_test_service() -> JwtService {
    JwtService::new(JwtConfig {
        secret: "test-secret-key-for-testing".to_string(),
        access_token_expires_minutes: 15,
    })
}

#[test]
fn test_claims_new_sets_correct_fields() {
    let user_id = Uuid::new_v4();
    let company_id = Uuid::new_v4();
    let expires_at = Utc::now() + Duration::hours(1);

    let claims = Claims::new(user_id, company_id, "manager", expires_at);

    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.user_id(), user_id);
    assert_eq!(claims.company_id(), company_id);
    assert_eq!(claims.role, "manager");
    assert!(claims.iat <= Utc::now().timestamp());
    assert_eq!(claims.exp, expires_at.timestamp());
}

#[test]
fn test_generate_and_validate_token() {
    let service = create_test_service();
    let user_id = Uuid::new_v4();
    let company_id = Uuid::new_v4();

    let token = service
        .generate_access_token(user_id, company_id, "admin")
        .unwrap();
    let claims = service.validate_token(&token).unwrap();

    assert_eq!(claims.user_id(), user_id);
    assert_eq!(claims.company_id(), company_id);
    assert_eq!(claims.role, "admin");
}

#[test]
fn test_invalid_token() {
    let service = create_test_service();
    let result = service.validate_token("invalid.token.here");
    assert!(matches!(result, Err(JwtError::DecodingError(_))));
}

#[test]
fn test_token_signed_with_other_secret_is_rejected() {
    let other = JwtService::new(JwtConfig {
        secret: "another-secret".to_string(),
        access_token_expires_minutes: 15,
    });
    let token = other
        .generate_access_token(Uuid::new_v4(), Uuid::new_v4(), "employee")
        .unwrap();

    assert!(create_test_service().validate_token(&token).is_err());
}

#[test]
fn test_expired_token() {
    let claims = Claims::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        "employee",
        Utc::now() - Duration::hours(2),
    );
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"test-secret-key-for-testing"),
    )
    .unwrap();

    let result = create_test_service().validate_token(&token);
    assert!(matches!(result, Err(JwtError::Expired)));
}

#[test]
fn test_debug_hides_keys() {
    let rendered = format!("{:?}", create_test_service());
    assert!(rendered.contains("[hidden]"));
    assert!(!rendered.contains("test-secret-key-for-testing"));
}
