//! Capability traits of the entity gateway.

use std::sync::Arc;

use async_trait::async_trait;
use tablegate_security::SecurityContext;

use crate::error::{GatewayError, MetadataError};
use crate::models::{EntityMetadata, TableDefinition};
use crate::plan::QueryPlan;
use crate::request::{GraphQLRequest, RestRequest};

/// Read-only Metadata Store.
///
/// Loaded once and shared by every request. Production and test
/// implementations are interchangeable.
pub trait MetadataProvider: Send + Sync {
    /// Look up an entity by its configured name.
    ///
    /// # Errors
    ///
    /// [`MetadataError::EntityNotFound`] if the entity is not configured.
    fn entity(&self, name: &str) -> Result<Arc<EntityMetadata>, MetadataError>;

    /// Look up an entity by its REST route segment.
    ///
    /// # Errors
    ///
    /// [`MetadataError::EntityNotFound`] if no entity is exposed under `path`.
    fn entity_for_rest_path(&self, path: &str) -> Result<Arc<EntityMetadata>, MetadataError>;

    /// # Errors
    ///
    /// [`MetadataError::EntityNotFound`] if the entity is not configured.
    fn table_definition(&self, name: &str) -> Result<Arc<TableDefinition>, MetadataError> {
        self.entity(name).map(|e| Arc::clone(&e.table))
    }
}

/// Public API of the entity gateway, registered for the transport layers.
///
/// ```ignore
/// let gateway = hub.get::<dyn EntityGatewayClient>()?;
///
/// let plan = gateway.plan_rest(&ctx, RestRequest::get("Book/id/1")).await?;
/// ```
#[async_trait]
pub trait EntityGatewayClient: Send + Sync {
    /// Validate, authorize and plan a REST request.
    ///
    /// # Errors
    ///
    /// - `BadRequest` for malformed addressing, invalid keys or fields
    /// - `EntityNotFound` for unknown or unexposed entities
    /// - `Forbidden` when the caller's role is not permitted
    /// - `NotSupported` for unsupported methods
    /// - `ConfigurationError` for broken relationship metadata
    async fn plan_rest(
        &self,
        ctx: &SecurityContext,
        request: RestRequest,
    ) -> Result<QueryPlan, GatewayError>;

    /// Validate, authorize and plan a GraphQL field.
    ///
    /// # Errors
    ///
    /// Same categories as [`EntityGatewayClient::plan_rest`].
    async fn plan_graphql(
        &self,
        ctx: &SecurityContext,
        request: GraphQLRequest,
    ) -> Result<QueryPlan, GatewayError>;
}
