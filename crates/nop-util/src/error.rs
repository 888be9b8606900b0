//! Error types for nop-provider

use thiserror::Error;

use crate::ResourceName;

/// Core error type for nop-provider operations
#[derive(Debug, Error)]
pub enum NopError {
    /// The managed object handed to the provider is not a NopResource
    #[error("managed resource is not a NopResource custom resource (got kind {kind})")]
    NotNopResource { kind: String },

    #[error("Resource not found: {0}")]
    ResourceNotFound(ResourceName),

    #[error("Resource already registered: {0}")]
    ResourceAlreadyRegistered(ResourceName),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NopError {
    pub fn not_nop_resource(kind: impl Into<String>) -> Self {
        Self::NotNopResource { kind: kind.into() }
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, NopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_nop_resource_message_names_kind() {
        let err = NopError::not_nop_resource("Bucket");
        assert_eq!(
            err.to_string(),
            "managed resource is not a NopResource custom resource (got kind Bucket)"
        );
    }
}
