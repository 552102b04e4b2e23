//! System roles and effective-role resolution.

use crate::context::SecurityContext;

/// Role of every unauthenticated caller.
pub const ANONYMOUS: &str = "anonymous";

/// Role of every authenticated caller that did not ask for a specific role.
pub const AUTHENTICATED: &str = "authenticated";

/// Role resolution failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleError {
    #[error("role '{0}' requires an authenticated caller")]
    NotAuthenticated(String),

    #[error("role '{0}' is not assigned to the caller")]
    NotAssigned(String),
}

pub(crate) fn resolve_effective_role(ctx: &SecurityContext) -> Result<String, RoleError> {
    let Some(requested) = ctx.requested_role() else {
        let role = if ctx.is_authenticated() {
            AUTHENTICATED
        } else {
            ANONYMOUS
        };
        return Ok(role.to_owned());
    };

    if requested.eq_ignore_ascii_case(ANONYMOUS) {
        return Ok(ANONYMOUS.to_owned());
    }
    if !ctx.is_authenticated() {
        return Err(RoleError::NotAuthenticated(requested.to_owned()));
    }
    if requested.eq_ignore_ascii_case(AUTHENTICATED) {
        return Ok(AUTHENTICATED.to_owned());
    }

    ctx.assigned_roles()
        .iter()
        .find(|r| r.eq_ignore_ascii_case(requested))
        .cloned()
        .ok_or_else(|| RoleError::NotAssigned(requested.to_owned()))
}
