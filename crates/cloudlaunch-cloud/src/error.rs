//! Cloud provider error types

use thiserror::Error;

/// Cloud provider errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CloudError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Resource already exists: {0}")]
    ResourceAlreadyExists(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The provider does not offer the requested capability.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The instance reached a terminal error state while being waited on.
    #[error("Instance failed: {0}")]
    InstanceFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

impl CloudError {
    /// Whether the provider refused to hand out a new resource, as opposed to
    /// failing to process the request.
    pub fn is_allocation_refused(&self) -> bool {
        matches!(self, CloudError::Unsupported(_) | CloudError::QuotaExceeded(_))
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
