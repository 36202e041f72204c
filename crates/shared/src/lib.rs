//! Shared types, errors, and configuration for Reimburse.
//!
//! This crate provides common types used across all other crates:
//! - Currency codes
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Configuration management
//! - JWT claims and validation for the identity boundary

pub mod auth;
pub mod config;
pub mod jwt;
pub mod types;

#[cfg(test)]
mod jwt_tests;

pub use auth::Claims;
pub use config::{AppConfig, LogFormat, ManagerFlagLocation};
pub use jwt::{JwtConfig, JwtError, JwtService};
