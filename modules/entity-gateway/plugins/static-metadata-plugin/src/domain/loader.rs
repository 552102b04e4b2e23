//! Resolves the runtime configuration against the schema snapshot.
//!
//! Everything a request could trip over later is checked here, once:
//! column names in keys, field rules, policies and relationships.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use entity_gateway_sdk::config::{
    ActionConfig, EntityConfig, PermissionConfig, RelationshipConfig,
};
use entity_gateway_sdk::{
    ActionPermission, ColumnDefinition, DatabaseObject, EntityAction, EntityMetadata,
    EntityPermissions, FieldRules, FieldSelector, ForeignKeyDefinition, PolicyExpression,
    Relationship, RelationshipJoin, RestSettings, RolePermission, TableDefinition,
};

use super::error::LoadError;
use crate::config::{StaticMetadataPluginConfig, TableSchemaConfig};

/// Build every configured entity.
///
/// # Errors
///
/// The first [`LoadError`] found, in entity name order.
pub fn load_entities(
    cfg: &StaticMetadataPluginConfig,
) -> Result<BTreeMap<String, EntityMetadata>, LoadError> {
    let schema = load_schema(&cfg.schema)?;
    let entities = &cfg.runtime.entities;

    let mut tables: BTreeMap<&str, TableDefinition> = BTreeMap::new();
    for (name, entity) in entities {
        tables.insert(name.as_str(), entity_table(name, entity, &schema)?);
    }

    let mut loaded = BTreeMap::new();
    for (name, entity) in entities {
        let mut relationships = BTreeMap::new();
        for (rel_name, rel) in &entity.relationships {
            let relationship = relationship(name, rel_name, rel, &tables)?;
            relationships.insert(rel_name.clone(), relationship);
        }

        let Some(mut table) = tables.get(name.as_str()).cloned() else {
            continue;
        };
        table.relationships = relationships;

        let permissions = permissions(name, &entity.permissions, &table)?;
        loaded.insert(
            name.clone(),
            EntityMetadata {
                name: name.clone(),
                rest: RestSettings {
                    enabled: entity.rest.enabled(),
                    path: entity.rest.path().unwrap_or(name).to_owned(),
                },
                graphql_enabled: entity.graphql.enabled(),
                table: Arc::new(table),
                permissions,
            },
        );
    }
    Ok(loaded)
}

fn load_schema(
    tables: &[TableSchemaConfig],
) -> Result<HashMap<DatabaseObject, TableDefinition>, LoadError> {
    let mut schema = HashMap::with_capacity(tables.len());
    for table in tables {
        let source = DatabaseObject::parse(&table.object);

        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(table.columns.len());
        for column in &table.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(LoadError::DuplicateColumn {
                    table: table.object.clone(),
                    column: column.name.clone(),
                });
            }
            columns.push(ColumnDefinition {
                name: column.name.clone(),
                column_type: column.column_type,
                nullable: column.nullable,
                has_default: column.has_default,
                auto_generated: column.auto_generated,
            });
        }

        let check = |context: &str, names: &[String]| -> Result<(), LoadError> {
            match names.iter().find(|n| !seen.contains(n.as_str())) {
                Some(column) => Err(LoadError::UnknownColumn {
                    context: context.to_owned(),
                    table: table.object.clone(),
                    column: column.clone(),
                }),
                None => Ok(()),
            }
        };
        check("primary key", &table.primary_key)?;
        for fk in &table.foreign_keys {
            check("foreign key", &fk.columns)?;
            if fk.columns.len() != fk.referenced_columns.len() {
                return Err(LoadError::ForeignKeyMismatch {
                    table: table.object.clone(),
                    references: fk.references.clone(),
                });
            }
        }

        let definition = TableDefinition {
            source: source.clone(),
            primary_key: table.primary_key.clone(),
            columns,
            foreign_keys: table
                .foreign_keys
                .iter()
                .map(|fk| ForeignKeyDefinition {
                    referencing_columns: fk.columns.clone(),
                    referenced_object: DatabaseObject::parse(&fk.references),
                    referenced_columns: fk.referenced_columns.clone(),
                })
                .collect(),
            relationships: BTreeMap::new(),
        };
        if schema.insert(source, definition).is_some() {
            return Err(LoadError::DuplicateTable(table.object.clone()));
        }
    }
    Ok(schema)
}

fn unknown_column(context: &str, table: &TableDefinition, column: &str) -> LoadError {
    LoadError::UnknownColumn {
        context: context.to_owned(),
        table: table.source.to_string(),
        column: column.to_owned(),
    }
}

fn check_columns<'a>(
    context: &str,
    table: &TableDefinition,
    columns: impl IntoIterator<Item = &'a str>,
) -> Result<(), LoadError> {
    match columns.into_iter().find(|c| !table.has_column(c)) {
        Some(column) => Err(unknown_column(context, table, column)),
        None => Ok(()),
    }
}

fn entity_table(
    name: &str,
    entity: &EntityConfig,
    schema: &HashMap<DatabaseObject, TableDefinition>,
) -> Result<TableDefinition, LoadError> {
    let object = DatabaseObject::parse(entity.source.object());
    let mut table = schema
        .get(&object)
        .cloned()
        .ok_or_else(|| LoadError::UnknownSource {
            entity: name.to_owned(),
            object: entity.source.object().to_owned(),
        })?;

    if let Some(key_fields) = entity.source.key_fields() {
        check_columns(
            &format!("entity '{name}' key-fields"),
            &table,
            key_fields.iter().map(String::as_str),
        )?;
        table.primary_key = key_fields.to_vec();
    }
    if table.primary_key.is_empty() {
        return Err(LoadError::MissingPrimaryKey(name.to_owned()));
    }
    Ok(table)
}

fn permissions(
    entity: &str,
    config: &[PermissionConfig],
    table: &TableDefinition,
) -> Result<EntityPermissions, LoadError> {
    let mut roles: Vec<RolePermission> = Vec::with_capacity(config.len());
    for permission in config {
        if roles.iter().any(|r| r.role.eq_ignore_ascii_case(&permission.role)) {
            return Err(LoadError::DuplicateRole {
                entity: entity.to_owned(),
                role: permission.role.clone(),
            });
        }

        let mut actions: Vec<ActionPermission> = Vec::with_capacity(permission.actions.len());
        for action in &permission.actions {
            let resolved = action_permission(entity, &permission.role, action, table)?;
            if actions.iter().any(|a| a.action == resolved.action) {
                return Err(LoadError::DuplicateAction {
                    entity: entity.to_owned(),
                    role: permission.role.clone(),
                    action: resolved.action,
                });
            }
            actions.push(resolved);
        }
        roles.push(RolePermission {
            role: permission.role.clone(),
            actions,
        });
    }
    Ok(EntityPermissions { roles })
}

fn action_permission(
    entity: &str,
    role: &str,
    config: &ActionConfig,
    table: &TableDefinition,
) -> Result<ActionPermission, LoadError> {
    let action = config.action();
    let ActionConfig::Detailed(details) = config else {
        return Ok(ActionPermission {
            action,
            fields: FieldRules::default(),
            policy: None,
        });
    };

    let context = format!("entity '{entity}' role '{role}' fields");
    let fields = match &details.fields {
        None => FieldRules::default(),
        Some(fields) => {
            let include = fields.include.as_deref().unwrap_or(&[]);
            check_columns(&context, table, named(include))?;
            check_columns(&context, table, named(&fields.exclude))?;
            FieldRules {
                include: fields
                    .include
                    .as_deref()
                    .map_or(FieldSelector::All, FieldSelector::from_list),
                exclude: FieldSelector::from_list(&fields.exclude),
            }
        }
    };

    let policy = match details.policy.as_ref().and_then(|p| p.database.as_deref()) {
        None => None,
        Some(_) if matches!(action, EntityAction::Create | EntityAction::All) => {
            return Err(LoadError::PolicyNotAllowed {
                entity: entity.to_owned(),
                role: role.to_owned(),
                action,
            });
        }
        Some(raw) => {
            let policy =
                PolicyExpression::parse(raw).map_err(|source| LoadError::InvalidPolicy {
                    entity: entity.to_owned(),
                    role: role.to_owned(),
                    source,
                })?;
            check_columns(
                &format!("entity '{entity}' role '{role}' policy"),
                table,
                policy.item_fields(),
            )?;
            Some(policy)
        }
    };

    Ok(ActionPermission {
        action,
        fields,
        policy,
    })
}

/// Field names other than the `*` wildcard.
fn named(fields: &[String]) -> impl Iterator<Item = &str> {
    fields.iter().map(String::as_str).filter(|f| *f != "*")
}

fn relationship(
    entity: &str,
    name: &str,
    config: &RelationshipConfig,
    tables: &BTreeMap<&str, TableDefinition>,
) -> Result<Relationship, LoadError> {
    let invalid = |reason: &str| LoadError::InvalidRelationship {
        entity: entity.to_owned(),
        relationship: name.to_owned(),
        reason: reason.to_owned(),
    };

    let (Some(source), Some(target)) = (
        tables.get(entity),
        tables.get(config.target_entity.as_str()),
    ) else {
        return Err(LoadError::UnknownTarget {
            entity: entity.to_owned(),
            relationship: name.to_owned(),
            target: config.target_entity.clone(),
        });
    };

    let context = format!("entity '{entity}' relationship '{name}'");
    check_columns(&context, source, config.source_fields.iter().map(String::as_str))?;
    check_columns(&context, target, config.target_fields.iter().map(String::as_str))?;

    let join = match &config.linking_object {
        None => {
            if !config.linking_source_fields.is_empty() || !config.linking_target_fields.is_empty()
            {
                return Err(invalid("linking fields require a linking object"));
            }
            if config.source_fields.len() != config.target_fields.len() {
                return Err(invalid("source and target field lists differ in length"));
            }
            RelationshipJoin::Direct {
                source_fields: config.source_fields.clone(),
                target_fields: config.target_fields.clone(),
            }
        }
        Some(object) => {
            if !config.source_fields.is_empty() || !config.target_fields.is_empty() {
                return Err(invalid(
                    "a linking relationship joins on primary keys; source/target fields are not allowed",
                ));
            }
            if config.linking_source_fields.len() != source.primary_key.len() {
                return Err(invalid(
                    "linking source fields must match the source primary key",
                ));
            }
            if config.linking_target_fields.len() != target.primary_key.len() {
                return Err(invalid(
                    "linking target fields must match the target primary key",
                ));
            }
            RelationshipJoin::Linking {
                object: DatabaseObject::parse(object),
                source_fields: config.linking_source_fields.clone(),
                target_fields: config.linking_target_fields.clone(),
            }
        }
    };

    Ok(Relationship {
        cardinality: config.cardinality,
        target_entity: config.target_entity.clone(),
        join,
    })
}
