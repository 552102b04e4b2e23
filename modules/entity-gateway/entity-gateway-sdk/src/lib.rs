#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Entity Gateway SDK
//!
//! This crate provides the public contract of the `entity_gateway` module:
//!
//! - [`EntityGatewayClient`] - Public API trait for transports
//! - [`MetadataProvider`] - Metadata Store capability consumed by the pipeline
//! - [`TableDefinition`], [`Relationship`] - Table metadata
//! - [`EntityPermissions`], [`Operation`] - Role/action permission model
//! - [`PolicyExpression`] - Parsed `policy.database` claims predicate
//! - [`QueryPlan`], [`Predicate`] - Provider-agnostic pipeline output
//! - [`GatewayError`], [`SubStatusCode`] - The externally visible error surface
//! - [`config`] - Runtime configuration model (entities, permissions, relationships)
//!
//! ## Usage
//!
//! ```ignore
//! use entity_gateway_sdk::{EntityGatewayClient, RestRequest};
//!
//! let plan = gateway
//!     .plan_rest(&ctx, RestRequest::get("Book/id/1"))
//!     .await?;
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod permissions;
pub mod plan;
pub mod policy;
pub mod predicate;
pub mod request;

pub use api::{EntityGatewayClient, MetadataProvider};
pub use error::{GatewayError, MetadataError, SubStatusCode};
pub use models::{
    Cardinality, ColumnDefinition, ColumnType, DatabaseObject, EntityMetadata,
    ForeignKeyDefinition, Relationship, RelationshipJoin, RestSettings, TableDefinition,
};
pub use permissions::{
    ActionPermission, EntityAction, EntityPermissions, FieldRules, FieldSelector, Operation,
    RolePermission,
};
pub use plan::{Assignment, ColumnEquality, JoinHop, JoinSpec, OrderBy, QueryPlan, SortDirection};
pub use policy::{PolicyExpr, PolicyExpression, PolicyOperand, PolicyParseError};
pub use predicate::{ColumnRef, CompareOp, Operand, Predicate};
pub use request::{GraphQLRequest, RestRequest};
