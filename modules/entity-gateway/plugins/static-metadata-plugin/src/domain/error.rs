use entity_gateway_sdk::{EntityAction, PolicyParseError};
use thiserror::Error;

/// Metadata that cannot be served. Raised once, at load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("table '{0}' is declared more than once")]
    DuplicateTable(String),

    #[error("table '{table}' declares column '{column}' more than once")]
    DuplicateColumn { table: String, column: String },

    #[error("{context}: '{column}' is not a column of '{table}'")]
    UnknownColumn {
        context: String,
        table: String,
        column: String,
    },

    #[error("table '{table}': foreign key to '{references}' has mismatched column lists")]
    ForeignKeyMismatch { table: String, references: String },

    #[error("entity '{entity}': source '{object}' is not in the schema")]
    UnknownSource { entity: String, object: String },

    #[error("entity '{0}' has no primary key; declare one or configure key-fields")]
    MissingPrimaryKey(String),

    #[error("entities '{first}' and '{second}' share REST path '{path}'")]
    DuplicateRestPath {
        path: String,
        first: String,
        second: String,
    },

    #[error("entity '{entity}': role '{role}' lists action '{action}' more than once")]
    DuplicateAction {
        entity: String,
        role: String,
        action: EntityAction,
    },

    #[error("entity '{entity}': role '{role}' is configured more than once")]
    DuplicateRole { entity: String, role: String },

    #[error("entity '{entity}': role '{role}' sets a database policy on '{action}'")]
    PolicyNotAllowed {
        entity: String,
        role: String,
        action: EntityAction,
    },

    #[error("entity '{entity}': role '{role}': {source}")]
    InvalidPolicy {
        entity: String,
        role: String,
        source: PolicyParseError,
    },

    #[error("entity '{entity}': relationship '{relationship}' targets unknown entity '{target}'")]
    UnknownTarget {
        entity: String,
        relationship: String,
        target: String,
    },

    #[error("entity '{entity}': relationship '{relationship}': {reason}")]
    InvalidRelationship {
        entity: String,
        relationship: String,
        reason: String,
    },
}
