//! Column-level checks against a granted permit.

use entity_gateway_sdk::TableDefinition;
use serde_json::{Map, Value};

use super::{AuthorizationError, Permit};

/// Columns to return for a read.
///
/// Without an explicit selection every permitted column is returned.
/// Explicitly selected columns the role may not read are dropped.
///
/// # Errors
///
/// [`AuthorizationError::UnknownField`] when a selected column does not exist.
pub fn project_fields(
    permit: &Permit,
    table: &TableDefinition,
    requested: Option<&[String]>,
) -> Result<Vec<String>, AuthorizationError> {
    let Some(requested) = requested else {
        return Ok(permit.fields.clone());
    };

    let mut selected: Vec<String> = Vec::with_capacity(requested.len());
    for field in requested {
        if !table.has_column(field) {
            return Err(AuthorizationError::UnknownField(field.clone()));
        }
        if permit.allows(field) && !selected.contains(field) {
            selected.push(field.clone());
        }
    }
    Ok(selected)
}

/// Every column written by a mutation must exist and be permitted.
///
/// # Errors
///
/// [`AuthorizationError::UnknownField`] or [`AuthorizationError::FieldNotPermitted`].
pub fn check_mutation_fields(
    permit: &Permit,
    table: &TableDefinition,
    values: &Map<String, Value>,
) -> Result<(), AuthorizationError> {
    for field in values.keys() {
        if !table.has_column(field) {
            return Err(AuthorizationError::UnknownField(field.clone()));
        }
        if !permit.allows(field) {
            return Err(AuthorizationError::FieldNotPermitted(field.clone()));
        }
    }
    Ok(())
}

/// Ordering is only allowed on readable columns.
///
/// # Errors
///
/// [`AuthorizationError::UnknownField`] or [`AuthorizationError::FieldNotPermitted`].
pub fn check_order_fields<'a>(
    permit: &Permit,
    table: &TableDefinition,
    columns: impl IntoIterator<Item = &'a str>,
) -> Result<(), AuthorizationError> {
    for column in columns {
        if !table.has_column(column) {
            return Err(AuthorizationError::UnknownField(column.to_owned()));
        }
        if !permit.allows(column) {
            return Err(AuthorizationError::FieldNotPermitted(column.to_owned()));
        }
    }
    Ok(())
}
