//! Primary key validation for single-item requests.

use std::collections::HashSet;

use entity_gateway_sdk::TableDefinition;
use thiserror::Error;

use super::context::{KeyPair, RequestContext};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("primary key column '{0}' is given more than once")]
    DuplicateKey(String),

    #[error("'{0}' is not a primary key column")]
    UnknownKeyColumn(String),

    #[error("primary key is incomplete, missing: {}", .0.join(", "))]
    IncompleteKey(Vec<String>),

    #[error("primary key is followed by extraneous columns: {}", .0.join(", "))]
    ExtraneousColumns(Vec<String>),
}

/// A key that names every primary key column exactly once.
///
/// Pairs are ordered by the table's primary key declaration, not by the
/// order the caller used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedKey {
    pairs: Vec<KeyPair>,
}

impl ValidatedKey {
    #[inline]
    #[must_use]
    pub fn pairs(&self) -> &[KeyPair] {
        &self.pairs
    }

    #[must_use]
    pub fn into_pairs(self) -> Vec<KeyPair> {
        self.pairs
    }
}

/// Check the context's key pairs against the table's primary key.
///
/// Checks run in a fixed order: duplicates first (in request order), then
/// extraneous columns after a complete key, then unknown columns, then
/// missing key columns.
///
/// # Errors
///
/// The first [`ValidationError`] found.
pub fn validate(
    context: &RequestContext,
    table: &TableDefinition,
) -> Result<ValidatedKey, ValidationError> {
    validate_pairs(&context.primary_key_predicates, table)
}

/// # Errors
///
/// See [`validate`].
pub fn validate_pairs(
    pairs: &[KeyPair],
    table: &TableDefinition,
) -> Result<ValidatedKey, ValidationError> {
    let mut seen = HashSet::with_capacity(pairs.len());
    for pair in pairs {
        if !seen.insert(pair.column.as_str()) {
            return Err(ValidationError::DuplicateKey(pair.column.clone()));
        }
    }

    let extraneous: Vec<String> = pairs
        .iter()
        .filter(|p| !table.is_primary_key(&p.column))
        .map(|p| p.column.clone())
        .collect();
    let missing: Vec<String> = table
        .primary_key
        .iter()
        .filter(|k| !seen.contains(k.as_str()))
        .cloned()
        .collect();

    if missing.is_empty() && !extraneous.is_empty() {
        return Err(ValidationError::ExtraneousColumns(extraneous));
    }
    if let Some(unknown) = extraneous.into_iter().next() {
        return Err(ValidationError::UnknownKeyColumn(unknown));
    }
    if !missing.is_empty() {
        return Err(ValidationError::IncompleteKey(missing));
    }

    let ordered = table
        .primary_key
        .iter()
        .filter_map(|k| pairs.iter().find(|p| &p.column == k))
        .cloned()
        .collect();
    Ok(ValidatedKey { pairs: ordered })
}
