//! Pipeline errors and their mapping onto the external error surface.

use entity_gateway_sdk::{GatewayError, MetadataError, Operation, SubStatusCode};
use tablegate_security::RoleError;
use thiserror::Error;

use super::authorization::AuthorizationError;
use super::parser::ParseError;
use super::relationships::RelationshipError;
use super::validator::ValidationError;

/// Request shape problems found outside the parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("HTTP method '{0}' is not supported")]
    UnsupportedMethod(String),

    #[error("entity '{entity}' is not exposed over {transport}")]
    NotExposed {
        entity: String,
        transport: &'static str,
    },

    #[error("{0} must not address a single item")]
    KeyNotAllowed(Operation),

    #[error("{0} requires a primary key")]
    KeyRequired(Operation),

    #[error("{0} requires a request body")]
    MissingBody(Operation),

    #[error("request body must be a JSON object")]
    BodyNotObject,

    #[error("query options are only allowed on reads")]
    QueryOptionsNotAllowed,

    #[error("$first and $orderby only apply to collection reads")]
    PagingOnItem,

    #[error("invalid page size {0}")]
    InvalidPageSize(i64),
}

/// Error from any pipeline stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("request addressing is malformed: {0}")]
    Parse(#[from] ParseError),

    #[error("primary key is invalid: {0}")]
    Validation(#[from] ValidationError),

    #[error("authorization failed: {0}")]
    Authorization(#[from] AuthorizationError),

    #[error("relationship resolution failed: {0}")]
    Relationship(#[from] RelationshipError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("role resolution failed: {0}")]
    Role(#[from] RoleError),

    #[error(transparent)]
    Request(#[from] RequestError),
}

impl PipelineError {
    /// External category of this error.
    #[must_use]
    pub fn sub_status(&self) -> SubStatusCode {
        match self {
            Self::Parse(ParseError::UnsupportedParameter(_))
            | Self::Request(RequestError::UnsupportedMethod(_)) => SubStatusCode::NotSupported,
            Self::Metadata(_) | Self::Request(RequestError::NotExposed { .. }) => {
                SubStatusCode::EntityNotFound
            }
            Self::Authorization(AuthorizationError::Denied { .. }) | Self::Role(_) => {
                SubStatusCode::Forbidden
            }
            Self::Parse(_)
            | Self::Validation(_)
            | Self::Authorization(_)
            | Self::Relationship(RelationshipError::UnknownRelationship { .. })
            | Self::Request(_) => SubStatusCode::BadRequest,
            Self::Relationship(_) => SubStatusCode::ConfigurationError,
        }
    }
}

impl From<PipelineError> for GatewayError {
    fn from(e: PipelineError) -> Self {
        match e.sub_status() {
            // Key validation details stay internal.
            SubStatusCode::BadRequest if matches!(e, PipelineError::Validation(_)) => {
                GatewayError::bad_request(
                    "The request is invalid since the primary key route does not match the entity's primary key",
                )
            }
            SubStatusCode::BadRequest => GatewayError::bad_request(e.to_string()),
            // So do the role's permissions and the caller's claims.
            SubStatusCode::Forbidden => GatewayError::forbidden(
                "Authorization failure: the caller is not permitted to perform this action",
            ),
            SubStatusCode::ConfigurationError => {
                GatewayError::configuration("The entity's relationship metadata is invalid")
            }
            SubStatusCode::EntityNotFound => GatewayError::entity_not_found(e.to_string()),
            SubStatusCode::NotSupported => GatewayError::not_supported(e.to_string()),
            sub_status @ SubStatusCode::DatabaseOperationFailed => {
                GatewayError::new(sub_status, e.to_string())
            }
        }
    }
}

/// Log `e` at a level matching its category and convert it.
pub(crate) fn log_and_convert(op: &str, e: PipelineError) -> GatewayError {
    match e.sub_status() {
        SubStatusCode::ConfigurationError | SubStatusCode::DatabaseOperationFailed => {
            tracing::error!(operation = op, error = %e, "entity gateway request failed");
        }
        SubStatusCode::Forbidden => {
            tracing::info!(operation = op, error = %e, "entity gateway request denied");
        }
        SubStatusCode::BadRequest | SubStatusCode::EntityNotFound | SubStatusCode::NotSupported => {
            tracing::debug!(operation = op, error = %e, "entity gateway request rejected");
        }
    }
    e.into()
}
