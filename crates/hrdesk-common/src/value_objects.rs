//! Value Objects - Identifiers shared across the HR desk
//!
//! Identifiers are opaque strings issued by the identity and directory
//! services. They are validated once at the boundary and compared by value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// User identifier (Value Object)
///
/// # Invariants
/// - Must be non-empty
/// - Max 64 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create new user ID with validation
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        validate_id(&id).map_err(DomainError::InvalidUserId)?;
        Ok(Self(id))
    }

    /// Get inner value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Organization (tenant) identifier (Value Object)
///
/// # Invariants
/// - Must be non-empty
/// - Max 64 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(String);

impl OrgId {
    /// Create new organization ID with validation
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        validate_id(&id).map_err(DomainError::InvalidOrgId)?;
        Ok(Self(id))
    }

    /// Get inner value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_id(id: &str) -> Result<(), String> {
    if id.trim().is_empty() {
        return Err("cannot be empty".into());
    }
    if id.len() > 64 {
        return Err("max 64 characters".into());
    }
    Ok(())
}

/// Domain errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Malformed user identifier
    #[error("invalid user ID: {0}")]
    InvalidUserId(String),

    /// Malformed organization identifier
    #[error("invalid organization ID: {0}")]
    InvalidOrgId(String),
}
