//! Runtime configuration model.
//!
//! This is the shape of a loaded entity configuration file. Loading and
//! schema validation of the file itself happen outside the pipeline; the
//! Metadata Store resolves this model against the database schema.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::models::Cardinality;
use crate::permissions::EntityAction;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub entities: BTreeMap<String, EntityConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityConfig {
    pub source: SourceConfig,
    #[serde(default)]
    pub rest: RestConfig,
    #[serde(default)]
    pub graphql: GraphQLConfig,
    #[serde(default)]
    pub permissions: Vec<PermissionConfig>,
    #[serde(default)]
    pub relationships: BTreeMap<String, RelationshipConfig>,
}

/// `source: "dbo.books"` or `source: { object: "dbo.books", key-fields: [...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SourceConfig {
    Object(String),
    Detailed(SourceDetails),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceDetails {
    pub object: String,
    /// Overrides the table's declared primary key (e.g. for views).
    #[serde(rename = "key-fields", default)]
    pub key_fields: Option<Vec<String>>,
}

impl SourceConfig {
    #[must_use]
    pub fn object(&self) -> &str {
        match self {
            Self::Object(object) => object,
            Self::Detailed(details) => &details.object,
        }
    }

    #[must_use]
    pub fn key_fields(&self) -> Option<&[String]> {
        match self {
            Self::Object(_) => None,
            Self::Detailed(details) => details.key_fields.as_deref(),
        }
    }
}

/// `rest: false` or `rest: { enabled: true, path: "/books" }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RestConfig {
    Enabled(bool),
    Detailed(RestDetails),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RestDetails {
    #[serde(default = "enabled")]
    pub enabled: bool,
    pub path: Option<String>,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self::Enabled(true)
    }
}

impl RestConfig {
    #[must_use]
    pub fn enabled(&self) -> bool {
        match self {
            Self::Enabled(enabled) => *enabled,
            Self::Detailed(details) => details.enabled,
        }
    }

    /// Configured route segment without surrounding slashes.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Enabled(_) => None,
            Self::Detailed(details) => details.path.as_deref().map(|p| p.trim_matches('/')),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GraphQLConfig {
    Enabled(bool),
    Detailed(GraphQLDetails),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphQLDetails {
    #[serde(default = "enabled")]
    pub enabled: bool,
}

impl Default for GraphQLConfig {
    fn default() -> Self {
        Self::Enabled(true)
    }
}

impl GraphQLConfig {
    #[must_use]
    pub fn enabled(&self) -> bool {
        match self {
            Self::Enabled(enabled) => *enabled,
            Self::Detailed(details) => details.enabled,
        }
    }
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionConfig {
    pub role: String,
    pub actions: Vec<ActionConfig>,
}

/// A bare verb (`read`, `*`) or an object with fields and policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ActionConfig {
    Bare(EntityAction),
    Detailed(ActionDetails),
}

impl ActionConfig {
    #[must_use]
    pub fn action(&self) -> EntityAction {
        match self {
            Self::Bare(action) => *action,
            Self::Detailed(details) => details.action,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionDetails {
    pub action: EntityAction,
    #[serde(default)]
    pub fields: Option<FieldsConfig>,
    #[serde(default)]
    pub policy: Option<PolicyConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldsConfig {
    /// Missing means every column.
    pub include: Option<Vec<String>>,
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    pub database: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationshipConfig {
    pub cardinality: Cardinality,
    #[serde(rename = "target.entity")]
    pub target_entity: String,
    #[serde(rename = "source.fields", default)]
    pub source_fields: Vec<String>,
    #[serde(rename = "target.fields", default)]
    pub target_fields: Vec<String>,
    #[serde(rename = "linking.object", default)]
    pub linking_object: Option<String>,
    #[serde(rename = "linking.source.fields", default)]
    pub linking_source_fields: Vec<String>,
    #[serde(rename = "linking.target.fields", default)]
    pub linking_target_fields: Vec<String>,
}
