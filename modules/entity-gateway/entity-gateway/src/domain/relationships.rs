//! Relationship resolver: turns a configured relationship into join hops.

use std::sync::Arc;

use entity_gateway_sdk::{
    Cardinality, ColumnEquality, ColumnRef, DatabaseObject, EntityMetadata, ForeignKeyDefinition,
    JoinHop, JoinSpec, MetadataError, MetadataProvider, Relationship, RelationshipJoin,
    TableDefinition,
};
use thiserror::Error;

use super::context::AliasGenerator;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelationshipError {
    #[error("entity '{entity}' has no relationship '{relationship}'")]
    UnknownRelationship { entity: String, relationship: String },

    #[error("relationship '{relationship}' targets unknown entity '{target}'")]
    UnknownTarget { relationship: String, target: String },

    #[error("relationship '{relationship}': no foreign key between '{from}' and '{to}'")]
    NoForeignKey {
        relationship: String,
        from: String,
        to: String,
    },

    #[error(
        "relationship '{relationship}': several foreign keys between '{from}' and '{to}', fields must be configured"
    )]
    AmbiguousForeignKey {
        relationship: String,
        from: String,
        to: String,
    },

    #[error("relationship '{relationship}': join field lists have different lengths")]
    FieldCountMismatch { relationship: String },
}

/// A resolved join, before the target has been authorized.
#[derive(Debug, Clone)]
pub struct ResolvedJoin {
    pub spec: JoinSpec,
    pub target: Arc<EntityMetadata>,
}

pub struct RelationshipResolver<'a> {
    metadata: &'a dyn MetadataProvider,
}

impl<'a> RelationshipResolver<'a> {
    #[must_use]
    pub fn new(metadata: &'a dyn MetadataProvider) -> Self {
        Self { metadata }
    }

    /// Resolve relationship `name` of `source` (aliased `source_alias`).
    ///
    /// Direct relationships with no configured fields are inferred from the
    /// single foreign key between the two tables. Linking relationships join
    /// through the linking object on both tables' primary keys; their aliases
    /// are allocated linking first.
    ///
    /// # Errors
    ///
    /// [`RelationshipError`] when the target is unknown or the join columns
    /// cannot be determined.
    pub fn resolve(
        &self,
        name: &str,
        source: &EntityMetadata,
        source_alias: &str,
        aliases: &mut AliasGenerator,
    ) -> Result<ResolvedJoin, RelationshipError> {
        let relationship =
            source
                .table
                .relationship(name)
                .ok_or_else(|| RelationshipError::UnknownRelationship {
                    entity: source.name.clone(),
                    relationship: name.to_owned(),
                })?;

        let target = self
            .metadata
            .entity(&relationship.target_entity)
            .map_err(|_: MetadataError| RelationshipError::UnknownTarget {
                relationship: name.to_owned(),
                target: relationship.target_entity.clone(),
            })?;

        let hops = match &relationship.join {
            RelationshipJoin::Direct {
                source_fields,
                target_fields,
            } => {
                let (source_fields, target_fields) = if source_fields.is_empty() {
                    infer_fields(name, relationship, &source.table, &target.table)?
                } else {
                    (source_fields.clone(), target_fields.clone())
                };
                let alias = aliases.next_alias();
                let on = equalities(name, source_alias, &source_fields, &alias, &target_fields)?;
                vec![JoinHop {
                    object: target.table.source.clone(),
                    alias,
                    on,
                    projected: true,
                }]
            }
            RelationshipJoin::Linking {
                object,
                source_fields,
                target_fields,
            } => {
                let linking_alias = aliases.next_alias();
                let target_alias = aliases.next_alias();
                vec![
                    JoinHop {
                        object: object.clone(),
                        on: equalities(
                            name,
                            source_alias,
                            &source.table.primary_key,
                            &linking_alias,
                            source_fields,
                        )?,
                        alias: linking_alias.clone(),
                        projected: false,
                    },
                    JoinHop {
                        object: target.table.source.clone(),
                        on: equalities(
                            name,
                            &linking_alias,
                            target_fields,
                            &target_alias,
                            &target.table.primary_key,
                        )?,
                        alias: target_alias,
                        projected: true,
                    },
                ]
            }
        };

        Ok(ResolvedJoin {
            spec: JoinSpec {
                relationship: name.to_owned(),
                target_entity: target.name.clone(),
                cardinality: relationship.cardinality,
                hops,
                projection: Vec::new(),
                predicates: Vec::new(),
            },
            target,
        })
    }
}

fn equalities(
    relationship: &str,
    left_alias: &str,
    left: &[String],
    right_alias: &str,
    right: &[String],
) -> Result<Vec<ColumnEquality>, RelationshipError> {
    if left.is_empty() || left.len() != right.len() {
        return Err(RelationshipError::FieldCountMismatch {
            relationship: relationship.to_owned(),
        });
    }
    Ok(left
        .iter()
        .zip(right)
        .map(|(l, r)| ColumnEquality {
            left: ColumnRef::qualified(left_alias, l.as_str()),
            right: ColumnRef::qualified(right_alias, r.as_str()),
        })
        .collect())
}

type FieldPair = (Vec<String>, Vec<String>);

/// Find `(source_fields, target_fields)` from declared foreign keys.
///
/// A self-referencing table declares the key once; cardinality picks the
/// direction (`One` follows the key, `Many` walks it backwards).
fn infer_fields(
    name: &str,
    relationship: &Relationship,
    source: &TableDefinition,
    target: &TableDefinition,
) -> Result<FieldPair, RelationshipError> {
    let forward = references(source, &target.source).map(|fk| {
        (
            fk.referencing_columns.clone(),
            fk.referenced_columns.clone(),
        )
    });
    let backward = references(target, &source.source).map(|fk| {
        (
            fk.referenced_columns.clone(),
            fk.referencing_columns.clone(),
        )
    });

    let candidates: Vec<FieldPair> = if source.source == target.source {
        match relationship.cardinality {
            Cardinality::One => forward.collect(),
            Cardinality::Many => backward.collect(),
        }
    } else {
        forward.chain(backward).collect()
    };

    let mut candidates = candidates.into_iter();
    match (candidates.next(), candidates.next()) {
        (Some(fields), None) => Ok(fields),
        (None, _) => Err(RelationshipError::NoForeignKey {
            relationship: name.to_owned(),
            from: source.source.to_string(),
            to: target.source.to_string(),
        }),
        (Some(_), Some(_)) => Err(RelationshipError::AmbiguousForeignKey {
            relationship: name.to_owned(),
            from: source.source.to_string(),
            to: target.source.to_string(),
        }),
    }
}

fn references<'t>(
    table: &'t TableDefinition,
    object: &'t DatabaseObject,
) -> impl Iterator<Item = &'t ForeignKeyDefinition> {
    table
        .foreign_keys
        .iter()
        .filter(move |fk| &fk.referenced_object == object)
}
