#![allow(clippy::unwrap_used, clippy::expect_used)]

//! In-memory metadata fixtures. Every call builds a fresh store.
//!
//! | entity    | table              | notes                                   |
//! |-----------|--------------------|-----------------------------------------|
//! | Book      | dbo.books          | role matrix, owner policy, relationships |
//! | Stock     | dbo.stocks         | composite key                           |
//! | Publisher | dbo.publishers     | broken relationships                    |
//! | Author    | dbo.authors        | readable by `authenticated` only        |
//! | Review    | dbo.reviews        | references books                        |
//! | Employee  | dbo.employees      | self reference                          |
//! | Secret    | dbo.secrets        | not exposed                             |

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use entity_gateway_sdk::{
    ActionPermission, Cardinality, ColumnDefinition, ColumnType, DatabaseObject, EntityAction,
    EntityMetadata, EntityPermissions, FieldRules, FieldSelector, ForeignKeyDefinition,
    MetadataError, MetadataProvider, PolicyExpression, Relationship, RelationshipJoin,
    RestSettings, RolePermission, TableDefinition,
};
use serde_json::json;
use tablegate_security::{Claims, SecurityContext};

pub struct InMemoryMetadata {
    entities: HashMap<String, Arc<EntityMetadata>>,
}

impl MetadataProvider for InMemoryMetadata {
    fn entity(&self, name: &str) -> Result<Arc<EntityMetadata>, MetadataError> {
        self.entities
            .get(name)
            .cloned()
            .ok_or_else(|| MetadataError::EntityNotFound(name.to_owned()))
    }

    fn entity_for_rest_path(&self, path: &str) -> Result<Arc<EntityMetadata>, MetadataError> {
        self.entities
            .values()
            .find(|e| e.rest.path == path)
            .cloned()
            .ok_or_else(|| MetadataError::EntityNotFound(path.to_owned()))
    }
}

pub fn fixture_metadata() -> Arc<InMemoryMetadata> {
    let entities = [
        book_entity(),
        stock_entity(),
        publisher_entity(),
        author_entity(),
        review_entity(),
        employee_entity(),
        secret_entity(),
    ]
    .into_iter()
    .map(|e| (e.name.clone(), Arc::new(e)))
    .collect();
    Arc::new(InMemoryMetadata { entities })
}

pub fn claims(sub: &str) -> Claims {
    Claims::from([("sub".to_owned(), json!(sub))])
}

pub fn role_context(role: &str, sub: &str) -> SecurityContext {
    SecurityContext::builder()
        .authenticated(true)
        .assigned_roles(vec![role.to_owned()])
        .requested_role(role)
        .claim("sub", sub)
        .build()
}

fn column(name: &str, column_type: ColumnType) -> ColumnDefinition {
    ColumnDefinition {
        name: name.to_owned(),
        column_type,
        nullable: false,
        has_default: false,
        auto_generated: false,
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_owned()).collect()
}

fn fk(columns: &[&str], object: &str, referenced: &[&str]) -> ForeignKeyDefinition {
    ForeignKeyDefinition {
        referencing_columns: names(columns),
        referenced_object: DatabaseObject::parse(object),
        referenced_columns: names(referenced),
    }
}

fn direct(cardinality: Cardinality, target: &str) -> Relationship {
    Relationship {
        cardinality,
        target_entity: target.to_owned(),
        join: RelationshipJoin::Direct {
            source_fields: Vec::new(),
            target_fields: Vec::new(),
        },
    }
}

fn allow(action: EntityAction, include: &[&str], exclude: &[&str], policy: Option<&str>) -> ActionPermission {
    ActionPermission {
        action,
        fields: FieldRules {
            include: FieldSelector::from_list(include),
            exclude: FieldSelector::from_list(exclude),
        },
        policy: policy.map(|p| PolicyExpression::parse(p).unwrap()),
    }
}

fn role(name: &str, actions: Vec<ActionPermission>) -> RolePermission {
    RolePermission {
        role: name.to_owned(),
        actions,
    }
}

fn entity(name: &str, table: TableDefinition, roles: Vec<RolePermission>) -> EntityMetadata {
    EntityMetadata {
        name: name.to_owned(),
        table: Arc::new(table),
        permissions: EntityPermissions { roles },
        rest: RestSettings {
            enabled: true,
            path: name.to_owned(),
        },
        graphql_enabled: true,
    }
}

pub fn book_table() -> TableDefinition {
    let mut relationships = BTreeMap::new();
    relationships.insert("publisher".to_owned(), direct(Cardinality::One, "Publisher"));
    relationships.insert("reviews".to_owned(), direct(Cardinality::Many, "Review"));
    relationships.insert(
        "authors".to_owned(),
        Relationship {
            cardinality: Cardinality::Many,
            target_entity: "Author".to_owned(),
            join: RelationshipJoin::Linking {
                object: DatabaseObject::parse("dbo.book_author"),
                source_fields: names(&["book_id"]),
                target_fields: names(&["author_id"]),
            },
        },
    );

    TableDefinition {
        source: DatabaseObject::parse("dbo.books"),
        primary_key: names(&["id"]),
        columns: vec![
            ColumnDefinition {
                auto_generated: true,
                ..column("id", ColumnType::Int)
            },
            column("title", ColumnType::String),
            column("year", ColumnType::Int),
            column("publisher_id", ColumnType::Int),
            column("owner", ColumnType::String),
        ],
        foreign_keys: vec![fk(&["publisher_id"], "dbo.publishers", &["id"])],
        relationships,
    }
}

/// Roles on `Book`:
///
/// - `anonymous`: read, `owner` hidden
/// - `authenticated`: read everything
/// - `author`: read/update/delete own rows, update limited to `title`/`year`
/// - `editor`: everything
/// - `importer`: create and update, no `id`; update also no `year`
/// - `curator`: incremental upsert of `id`, `title` and `year` only
pub fn book_entity() -> EntityMetadata {
    let own = Some("@item.owner eq @claims.sub");
    entity(
        "Book",
        book_table(),
        vec![
            role("anonymous", vec![allow(EntityAction::Read, &["*"], &["owner"], None)]),
            role("authenticated", vec![allow(EntityAction::Read, &["*"], &[], None)]),
            role(
                "author",
                vec![
                    allow(EntityAction::Read, &["*"], &[], own),
                    allow(EntityAction::Update, &["title", "year"], &[], own),
                    allow(EntityAction::Delete, &["*"], &[], own),
                ],
            ),
            role("editor", vec![allow(EntityAction::All, &["*"], &[], None)]),
            role(
                "importer",
                vec![
                    allow(EntityAction::Create, &["*"], &["id"], None),
                    allow(EntityAction::Update, &["*"], &["id", "year"], None),
                ],
            ),
            role(
                "curator",
                vec![allow(
                    EntityAction::UpsertIncremental,
                    &["id", "title", "year"],
                    &[],
                    None,
                )],
            ),
        ],
    )
}

pub fn composite_table() -> TableDefinition {
    TableDefinition {
        source: DatabaseObject::parse("dbo.stocks"),
        primary_key: names(&["categoryid", "pieceid"]),
        columns: vec![
            column("categoryid", ColumnType::Int),
            column("pieceid", ColumnType::Int),
            column("name", ColumnType::String),
            column("pieces_available", ColumnType::Int),
        ],
        foreign_keys: Vec::new(),
        relationships: BTreeMap::new(),
    }
}

/// Shelf slots keyed by warehouse, aisle and bin.
pub fn triple_key_table() -> TableDefinition {
    TableDefinition {
        source: DatabaseObject::parse("dbo.shelf_slots"),
        primary_key: names(&["warehouse", "aisle", "bin"]),
        columns: vec![
            column("warehouse", ColumnType::String),
            column("aisle", ColumnType::Int),
            column("bin", ColumnType::Int),
            column("capacity", ColumnType::Int),
        ],
        foreign_keys: Vec::new(),
        relationships: BTreeMap::new(),
    }
}

pub fn stock_entity() -> EntityMetadata {
    entity(
        "Stock",
        composite_table(),
        vec![role("anonymous", vec![allow(EntityAction::All, &["*"], &[], None)])],
    )
}

fn publisher_entity() -> EntityMetadata {
    let mut relationships = BTreeMap::new();
    relationships.insert("sponsor".to_owned(), direct(Cardinality::One, "Author"));
    relationships.insert("owner".to_owned(), direct(Cardinality::One, "Company"));

    let table = TableDefinition {
        source: DatabaseObject::parse("dbo.publishers"),
        primary_key: names(&["id"]),
        columns: vec![column("id", ColumnType::Int), column("name", ColumnType::String)],
        foreign_keys: Vec::new(),
        relationships,
    };
    entity(
        "Publisher",
        table,
        vec![role("anonymous", vec![allow(EntityAction::Read, &["*"], &[], None)])],
    )
}

fn author_entity() -> EntityMetadata {
    let table = TableDefinition {
        source: DatabaseObject::parse("dbo.authors"),
        primary_key: names(&["id"]),
        columns: vec![column("id", ColumnType::Int), column("name", ColumnType::String)],
        foreign_keys: Vec::new(),
        relationships: BTreeMap::new(),
    };
    entity(
        "Author",
        table,
        vec![role("authenticated", vec![allow(EntityAction::Read, &["*"], &[], None)])],
    )
}

fn review_entity() -> EntityMetadata {
    let table = TableDefinition {
        source: DatabaseObject::parse("dbo.reviews"),
        primary_key: names(&["id"]),
        columns: vec![
            column("id", ColumnType::Int),
            column("book_id", ColumnType::Int),
            column("content", ColumnType::String),
        ],
        foreign_keys: vec![fk(&["book_id"], "dbo.books", &["id"])],
        relationships: BTreeMap::new(),
    };
    entity(
        "Review",
        table,
        vec![role("anonymous", vec![allow(EntityAction::Read, &["id", "content"], &[], None)])],
    )
}

fn employee_entity() -> EntityMetadata {
    let mut relationships = BTreeMap::new();
    relationships.insert("manager".to_owned(), direct(Cardinality::One, "Employee"));
    relationships.insert("reports".to_owned(), direct(Cardinality::Many, "Employee"));

    let table = TableDefinition {
        source: DatabaseObject::parse("dbo.employees"),
        primary_key: names(&["id"]),
        columns: vec![
            column("id", ColumnType::Int),
            column("name", ColumnType::String),
            column("manager_id", ColumnType::Int),
        ],
        foreign_keys: vec![fk(&["manager_id"], "dbo.employees", &["id"])],
        relationships,
    };
    entity(
        "Employee",
        table,
        vec![role("anonymous", vec![allow(EntityAction::Read, &["*"], &[], None)])],
    )
}

fn secret_entity() -> EntityMetadata {
    let table = TableDefinition {
        source: DatabaseObject::parse("dbo.secrets"),
        primary_key: names(&["id"]),
        columns: vec![column("id", ColumnType::Int)],
        foreign_keys: Vec::new(),
        relationships: BTreeMap::new(),
    };
    let mut secret = entity(
        "Secret",
        table,
        vec![role("anonymous", vec![allow(EntityAction::Read, &["*"], &[], None)])],
    );
    secret.rest.enabled = false;
    secret.graphql_enabled = false;
    secret
}
