//! Error types for the Huddle collaboration engine.

use serde::Serialize;
use thiserror::Error;

use crate::access::ChannelRole;

/// A shared error type for the entire engine.
///
/// The first seven variants form the caller-facing taxonomy: they are the
/// terminal result of a request. `ExternalSink` raised during notification
/// fan-out is always recovered locally (logged, never surfaced); it only
/// reaches the caller when the external call *is* the primary effect, such
/// as plan generation. `DataAccess` and `Config` cover the ambient
/// storage/configuration layers.
#[derive(Error, Debug, Clone, Serialize)]
pub enum HuddleError {
    /// Entity id did not resolve.
    #[error("Entity not found: {entity} '{id}'")]
    NotFound { entity: &'static str, id: String },

    /// Caller lacks channel membership.
    #[error("Access denied: not a channel member")]
    AccessDenied,

    /// Caller is a member but lacks the specific admin privilege.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Role hierarchy check failed.
    #[error("Insufficient role: requires at least '{required}', caller is '{actual}'")]
    InsufficientRole {
        required: ChannelRole,
        actual: ChannelRole,
    },

    /// Semantically disallowed operation (removing the admin, duplicate invite).
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Status value outside the enumerated set.
    #[error("Invalid task status: '{0}'")]
    InvalidStatus(String),

    /// Role value outside the enumerated set.
    #[error("Invalid role: '{0}'")]
    InvalidRole(String),

    /// Bot/AI/live-transport call failed or timed out.
    #[error("External sink '{sink}' failed: {message}")]
    ExternalSink {
        sink: &'static str,
        message: String,
    },

    /// Data access error (repository/storage layer).
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HuddleError {
    /// Creates a NotFound error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates a Forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Creates an InvalidOperation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }

    /// Creates an ExternalSink error.
    pub fn external_sink(sink: &'static str, message: impl Into<String>) -> Self {
        Self::ExternalSink {
            sink,
            message: message.into(),
        }
    }

    /// Creates a DataAccess error.
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }
}

/// Result type alias using HuddleError.
pub type Result<T> = std::result::Result<T, HuddleError>;
