//! Claim substitution: turns a parsed database policy into a row predicate.

use entity_gateway_sdk::{ColumnRef, Operand, PolicyExpr, PolicyOperand, Predicate};
use serde_json::Value;
use tablegate_security::Claims;

use super::DenyReason;

/// Replace `@claims.*` with the caller's claim values and `@item.*` with
/// unqualified column references.
///
/// # Errors
///
/// [`DenyReason::MissingClaim`] or [`DenyReason::NonScalarClaim`] when a
/// referenced claim cannot be substituted.
pub fn substitute(expr: &PolicyExpr, claims: &Claims) -> Result<Predicate, DenyReason> {
    Ok(match expr {
        PolicyExpr::Compare { left, op, right } => Predicate::Compare {
            left: operand(left, claims)?,
            op: *op,
            right: operand(right, claims)?,
        },
        PolicyExpr::And(l, r) => {
            Predicate::And(vec![substitute(l, claims)?, substitute(r, claims)?])
        }
        PolicyExpr::Or(l, r) => Predicate::Or(vec![substitute(l, claims)?, substitute(r, claims)?]),
        PolicyExpr::Not(inner) => Predicate::Not(Box::new(substitute(inner, claims)?)),
    })
}

fn operand(operand: &PolicyOperand, claims: &Claims) -> Result<Operand, DenyReason> {
    match operand {
        PolicyOperand::Item(field) => Ok(Operand::Column(ColumnRef::unqualified(field.as_str()))),
        PolicyOperand::Literal(value) => Ok(Operand::Value(value.clone())),
        PolicyOperand::Claim(name) => match claims.get(name) {
            None => Err(DenyReason::MissingClaim(name.clone())),
            Some(Value::Array(_) | Value::Object(_)) => {
                Err(DenyReason::NonScalarClaim(name.clone()))
            }
            Some(value) => Ok(Operand::Value(value.clone())),
        },
    }
}
