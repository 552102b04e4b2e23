//! Per-request caller identity and claims.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::roles::{self, RoleError};

/// Claims carried by the caller's validated token, keyed by claim name.
pub type Claims = HashMap<String, serde_json::Value>;

/// Identity of the caller for a single request.
///
/// Built by the (external) authentication layer and handed to the pipeline
/// read-only. An anonymous context has no roles and no claims.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityContext {
    authenticated: bool,
    assigned_roles: Vec<String>,
    requested_role: Option<String>,
    claims: Claims,
}

impl SecurityContext {
    #[must_use]
    pub fn builder() -> SecurityContextBuilder {
        SecurityContextBuilder::default()
    }

    /// Unauthenticated caller.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Roles the identity provider assigned to the caller.
    #[inline]
    #[must_use]
    pub fn assigned_roles(&self) -> &[String] {
        &self.assigned_roles
    }

    /// Role the client asked to act as (e.g. from a role header).
    #[inline]
    #[must_use]
    pub fn requested_role(&self) -> Option<&str> {
        self.requested_role.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&serde_json::Value> {
        self.claims.get(name)
    }

    /// Resolve the role this request is evaluated under.
    ///
    /// # Errors
    ///
    /// - [`RoleError::NotAuthenticated`] if an anonymous caller asks for a non-anonymous role
    /// - [`RoleError::NotAssigned`] if the requested role is not assigned to the caller
    pub fn effective_role(&self) -> Result<String, RoleError> {
        roles::resolve_effective_role(self)
    }
}

/// Builder for [`SecurityContext`].
#[derive(Debug, Default)]
pub struct SecurityContextBuilder {
    inner: SecurityContext,
}

impl SecurityContextBuilder {
    #[must_use]
    pub fn authenticated(mut self, authenticated: bool) -> Self {
        self.inner.authenticated = authenticated;
        self
    }

    #[must_use]
    pub fn assigned_roles(mut self, roles: Vec<String>) -> Self {
        self.inner.assigned_roles = roles;
        self
    }

    #[must_use]
    pub fn requested_role(mut self, role: impl Into<String>) -> Self {
        self.inner.requested_role = Some(role.into());
        self
    }

    #[must_use]
    pub fn claim(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.inner.claims.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn claims(mut self, claims: Claims) -> Self {
        self.inner.claims = claims;
        self
    }

    #[must_use]
    pub fn build(self) -> SecurityContext {
        self.inner
    }
}
