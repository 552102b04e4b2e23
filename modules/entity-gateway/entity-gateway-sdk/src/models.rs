//! Table metadata held by the Metadata Store.
//!
//! Everything here is immutable after load and shared (behind `Arc`) by all
//! concurrent requests. The pipeline only reads it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::permissions::EntityPermissions;

/// A database object (table or view), optionally schema-qualified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseObject {
    pub schema: Option<String>,
    pub name: String,
}

impl DatabaseObject {
    #[must_use]
    pub fn new(schema: Option<String>, name: impl Into<String>) -> Self {
        Self {
            schema,
            name: name.into(),
        }
    }

    /// Parse `schema.name` or a bare `name`.
    #[must_use]
    pub fn parse(qualified: &str) -> Self {
        match qualified.split_once('.') {
            Some((schema, name)) => Self::new(Some(schema.to_owned()), name),
            None => Self::new(None, qualified),
        }
    }
}

impl fmt::Display for DatabaseObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Logical column type, used by the executor to coerce opaque request values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    String,
    Int,
    Long,
    Float,
    Decimal,
    Bool,
    DateTime,
    Uuid,
    Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub has_default: bool,
    pub auto_generated: bool,
}

/// A declared foreign key on the owning table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDefinition {
    pub referencing_columns: Vec<String>,
    pub referenced_object: DatabaseObject,
    pub referenced_columns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    One,
    Many,
}

/// How a relationship reaches its target.
///
/// A linking relationship never carries direct source/target fields: the
/// join always goes through the linking object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipJoin {
    /// `source.source_fields[i] = target.target_fields[i]`. Empty lists are
    /// inferred from declared foreign keys.
    Direct {
        source_fields: Vec<String>,
        target_fields: Vec<String>,
    },
    /// Many-to-many through a junction table.
    Linking {
        object: DatabaseObject,
        /// Linking columns referencing the source.
        source_fields: Vec<String>,
        /// Linking columns referencing the target.
        target_fields: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub cardinality: Cardinality,
    pub target_entity: String,
    pub join: RelationshipJoin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub source: DatabaseObject,
    /// Key columns in declaration order.
    pub primary_key: Vec<String>,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDefinition>,
    #[serde(default)]
    pub relationships: BTreeMap<String, Relationship>,
}

impl TableDefinition {
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    #[must_use]
    pub fn is_primary_key(&self, name: &str) -> bool {
        self.primary_key.iter().any(|k| k == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    #[must_use]
    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.get(name)
    }
}

/// REST exposure of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestSettings {
    pub enabled: bool,
    /// Route segment; the entity name when not configured.
    pub path: String,
}

/// Everything the pipeline needs to know about one configured entity.
#[derive(Debug, Clone)]
pub struct EntityMetadata {
    pub name: String,
    pub table: Arc<TableDefinition>,
    pub permissions: EntityPermissions,
    pub rest: RestSettings,
    pub graphql_enabled: bool,
}
