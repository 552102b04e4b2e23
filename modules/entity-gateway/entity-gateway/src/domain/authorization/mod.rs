//! Authorization evaluator.
//!
//! Decides whether a role may perform an operation on an entity and, when
//! it may, which columns it sees and which row predicate applies.

pub mod fields;
pub mod policy;

use entity_gateway_sdk::{
    ActionPermission, EntityMetadata, Operation, PolicyExpression, Predicate, RolePermission,
    TableDefinition,
};
use tablegate_security::Claims;
use thiserror::Error;

pub use fields::{check_mutation_fields, check_order_fields, project_fields};

/// What a permitted caller may do.
#[derive(Debug, Clone, PartialEq)]
pub struct Permit {
    /// Role whose entry granted access, spelled as configured.
    pub role: String,
    /// Permitted columns, in table declaration order.
    pub fields: Vec<String>,
    /// Row predicate with claims already substituted.
    pub policy: Option<Predicate>,
}

impl Permit {
    #[must_use]
    pub fn allows(&self, column: &str) -> bool {
        self.fields.iter().any(|f| f == column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DenyReason {
    #[error("no permission entry for '{operation}'")]
    NoPermission { operation: Operation },

    #[error("claim '{0}' required by the policy is missing")]
    MissingClaim(String),

    #[error("claim '{0}' required by the policy is not a scalar")]
    NonScalarClaim(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthorizationDecision {
    Permitted(Permit),
    Denied(DenyReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error("role '{role}' may not {operation} entity '{entity}': {reason}")]
    Denied {
        entity: String,
        role: String,
        operation: Operation,
        reason: DenyReason,
    },

    #[error("field '{0}' does not exist")]
    UnknownField(String),

    #[error("field '{0}' is not accessible to the role")]
    FieldNotPermitted(String),
}

/// Evaluate `role`'s permission for `operation` on `entity`.
///
/// A role without an entry on the entity is denied; there is no fallback to
/// `authenticated` or `anonymous`. The entry covers `operation` only through
/// an action of the same kind or the `*` wildcard, so upserts need their own
/// grant.
#[must_use]
pub fn evaluate(
    entity: &EntityMetadata,
    role: &str,
    operation: Operation,
    claims: &Claims,
) -> AuthorizationDecision {
    let denied = DenyReason::NoPermission { operation };

    let Some(role_permission) = entity.permissions.for_role(role) else {
        return AuthorizationDecision::Denied(denied);
    };
    let Some(grant) = grant(role_permission, operation, &entity.table) else {
        return AuthorizationDecision::Denied(denied);
    };

    let policy = match grant.policy.map(|p| policy::substitute(p.expr(), claims)) {
        None => None,
        Some(Ok(predicate)) => Some(predicate),
        Some(Err(reason)) => return AuthorizationDecision::Denied(reason),
    };

    AuthorizationDecision::Permitted(Permit {
        role: role_permission.role.clone(),
        fields: grant.fields,
        policy,
    })
}

/// Like [`evaluate`], with a denial turned into an error.
///
/// # Errors
///
/// [`AuthorizationError::Denied`] when the decision is negative.
pub fn authorize(
    entity: &EntityMetadata,
    role: &str,
    operation: Operation,
    claims: &Claims,
) -> Result<Permit, AuthorizationError> {
    match evaluate(entity, role, operation, claims) {
        AuthorizationDecision::Permitted(permit) => Ok(permit),
        AuthorizationDecision::Denied(reason) => Err(AuthorizationError::Denied {
            entity: entity.name.clone(),
            role: role.to_owned(),
            operation,
            reason,
        }),
    }
}

struct Grant<'a> {
    fields: Vec<String>,
    policy: Option<&'a PolicyExpression>,
}

fn grant<'a>(
    role: &'a RolePermission,
    operation: Operation,
    table: &TableDefinition,
) -> Option<Grant<'a>> {
    role.action(operation.action()).map(|entry| single_grant(entry, table))
}

fn single_grant<'a>(entry: &'a ActionPermission, table: &TableDefinition) -> Grant<'a> {
    Grant {
        fields: entry.fields.project(table.column_names()),
        policy: entry.policy.as_ref(),
    }
}
