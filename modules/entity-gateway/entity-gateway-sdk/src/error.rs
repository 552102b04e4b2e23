//! Externally visible error surface of the entity gateway.

use http::StatusCode;
use serde::{Deserialize, Serialize};

/// Sub-status carried by every gateway failure.
///
/// This enumeration is closed: internal failure kinds (duplicate key,
/// incomplete key, unknown claim, ...) are folded into one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubStatusCode {
    BadRequest,
    EntityNotFound,
    Forbidden,
    NotSupported,
    ConfigurationError,
    DatabaseOperationFailed,
}

impl SubStatusCode {
    /// HTTP status paired with this sub-status.
    #[must_use]
    pub fn status(self) -> StatusCode {
        match self {
            Self::BadRequest | Self::ConfigurationError => StatusCode::BAD_REQUEST,
            Self::EntityNotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotSupported => StatusCode::NOT_IMPLEMENTED,
            Self::DatabaseOperationFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A failure as surfaced to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct GatewayError {
    status: StatusCode,
    sub_status: SubStatusCode,
    message: String,
}

impl GatewayError {
    #[must_use]
    pub fn new(sub_status: SubStatusCode, message: impl Into<String>) -> Self {
        Self {
            status: sub_status.status(),
            sub_status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(SubStatusCode::BadRequest, message)
    }

    #[must_use]
    pub fn entity_not_found(message: impl Into<String>) -> Self {
        Self::new(SubStatusCode::EntityNotFound, message)
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(SubStatusCode::Forbidden, message)
    }

    #[must_use]
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new(SubStatusCode::NotSupported, message)
    }

    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(SubStatusCode::ConfigurationError, message)
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[inline]
    #[must_use]
    pub fn sub_status(&self) -> SubStatusCode {
        self.sub_status
    }

    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// JSON error payload for REST/GraphQL responses.
    #[must_use]
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.sub_status,
                "message": self.message,
                "status": self.status.as_u16(),
            }
        })
    }
}

/// Metadata Store lookup failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("entity '{0}' is not configured")]
    EntityNotFound(String),
}

impl From<MetadataError> for GatewayError {
    fn from(e: MetadataError) -> Self {
        match e {
            MetadataError::EntityNotFound(_) => Self::entity_not_found(e.to_string()),
        }
    }
}
