//! Shared types, errors, and configuration for Verity.
//!
//! This crate provides common types used across all other crates:
//! - Fixed-precision money types with banker's rounding
//! - The SHA-256 journal hash type backing the audit chain
//! - Typed IDs for type-safe entity references
//! - Canonical error codes and the error response shape
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{ErrorCode, ErrorResponse};
