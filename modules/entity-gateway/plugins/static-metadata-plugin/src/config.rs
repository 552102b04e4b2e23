use entity_gateway_sdk::ColumnType;
use entity_gateway_sdk::config::RuntimeConfig;
use serde::Deserialize;

/// Plugin configuration: a database schema snapshot plus the runtime
/// entity configuration resolved against it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticMetadataPluginConfig {
    /// Tables and views, as the database describes them.
    pub schema: Vec<TableSchemaConfig>,

    /// Entities exposed by the gateway.
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableSchemaConfig {
    /// `schema.name` or `name`.
    pub object: String,

    pub columns: Vec<ColumnSchemaConfig>,

    #[serde(default)]
    pub primary_key: Vec<String>,

    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeySchemaConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnSchemaConfig {
    pub name: String,

    #[serde(rename = "type")]
    pub column_type: ColumnType,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default)]
    pub has_default: bool,

    #[serde(default)]
    pub auto_generated: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForeignKeySchemaConfig {
    pub columns: Vec<String>,

    /// Referenced table, `schema.name` or `name`.
    pub references: String,

    pub referenced_columns: Vec<String>,
}
