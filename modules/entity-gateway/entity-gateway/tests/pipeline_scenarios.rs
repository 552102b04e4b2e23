#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end planning against metadata loaded by the static plugin.

use std::sync::Arc;

use entity_gateway::{EntityGatewayLocalClient, PipelineConfig, RequestPipeline};
use entity_gateway_sdk::{
    ColumnRef, CompareOp, EntityGatewayClient, GatewayError, GraphQLRequest, Operand, Operation,
    Predicate, QueryPlan, RestRequest, SortDirection, SubStatusCode,
};
use http::{Method, StatusCode};
use serde_json::json;
use static_metadata_plugin::StaticMetadataPlugin;
use tablegate_security::SecurityContext;

const CONFIG: &str = r#"
schema:
  - object: dbo.books
    columns:
      - { name: id, type: int, auto_generated: true }
      - { name: title, type: string }
      - { name: year, type: int, nullable: true }
      - { name: publisher_id, type: int }
      - { name: owner, type: string }
    primary_key: [id]
    foreign_keys:
      - { columns: [publisher_id], references: dbo.publishers, referenced_columns: [id] }
  - object: dbo.publishers
    columns:
      - { name: id, type: int }
      - { name: name, type: string }
    primary_key: [id]
  - object: dbo.authors
    columns:
      - { name: id, type: int }
      - { name: name, type: string }
    primary_key: [id]
  - object: dbo.book_author
    columns:
      - { name: book_id, type: int }
      - { name: author_id, type: int }
    primary_key: [book_id, author_id]
  - object: dbo.stocks
    columns:
      - { name: categoryid, type: int }
      - { name: pieceid, type: int }
      - { name: name, type: string }
    primary_key: [categoryid, pieceid]
  - object: dbo.audit
    columns:
      - { name: id, type: int }
    primary_key: [id]
runtime:
  entities:
    Book:
      source: dbo.books
      rest: { path: /books }
      permissions:
        - role: anonymous
          actions:
            - action: read
              fields: { include: ["*"], exclude: [owner] }
        - role: author
          actions:
            - action: read
              policy: { database: "@item.owner eq @claims.sub" }
            - action: upsert_incremental
              fields: { include: [title, year] }
              policy: { database: "@item.owner eq @claims.sub" }
        - role: importer
          actions:
            - action: create
              fields: { exclude: [id] }
            - action: update
              fields: { exclude: [id, year] }
        - role: curator
          actions:
            - action: upsert
              fields: { exclude: [year] }
        - role: reader
          actions: [read]
      relationships:
        publisher:
          cardinality: one
          target.entity: Publisher
        authors:
          cardinality: many
          target.entity: Author
          linking.object: dbo.book_author
          linking.source.fields: [book_id]
          linking.target.fields: [author_id]
    Publisher:
      source: dbo.publishers
      permissions:
        - role: anonymous
          actions: [read]
        - role: reader
          actions: [read]
    Author:
      source: dbo.authors
      permissions:
        - role: authenticated
          actions: [read]
        - role: reader
          actions: [read]
    Stock:
      source: dbo.stocks
      permissions:
        - role: anonymous
          actions: ["*"]
    Audit:
      source: dbo.audit
      rest: false
      permissions:
        - role: anonymous
          actions: [read]
"#;

fn pipeline() -> RequestPipeline {
    let plugin = StaticMetadataPlugin::default();
    let metadata = plugin.init_from_yaml(CONFIG).unwrap();
    RequestPipeline::new(metadata, PipelineConfig::default())
}

fn client() -> EntityGatewayLocalClient {
    EntityGatewayLocalClient::new(Arc::new(pipeline()))
}

fn user(role: &str, sub: &str) -> SecurityContext {
    SecurityContext::builder()
        .authenticated(true)
        .assigned_roles(vec![role.to_owned()])
        .requested_role(role)
        .claim("sub", sub)
        .build()
}

fn key(column: &str, value: &str) -> Predicate {
    Predicate::column_eq(ColumnRef::qualified("table0", column), json!(value))
}

fn owner_is(sub: &str) -> Predicate {
    Predicate::Compare {
        left: Operand::Column(ColumnRef::qualified("table0", "owner")),
        op: CompareOp::Eq,
        right: Operand::Value(json!(sub)),
    }
}

fn columns(plan: &QueryPlan) -> Vec<&str> {
    plan.projection.iter().map(|c| c.column.as_str()).collect()
}

async fn rest_error(ctx: &SecurityContext, request: RestRequest) -> GatewayError {
    client().plan_rest(ctx, request).await.unwrap_err()
}

#[test]
fn single_key_read_by_rest_path() {
    let plan = pipeline()
        .plan_rest(&SecurityContext::anonymous(), &RestRequest::get("/books/id/1"))
        .unwrap();

    assert_eq!(plan.entity, "Book");
    assert_eq!(plan.operation, Operation::Read);
    assert_eq!(plan.source.to_string(), "dbo.books");
    assert!(!plan.is_list);
    assert_eq!(plan.predicates, [key("id", "1")]);
    assert_eq!(columns(&plan), ["id", "title", "year", "publisher_id"]);
}

#[test]
fn composite_key_order_follows_declaration() {
    let pipeline = pipeline();
    let anonymous = SecurityContext::anonymous();

    let forward = pipeline
        .plan_rest(&anonymous, &RestRequest::get("/Stock/categoryid/1/pieceid/2"))
        .unwrap();
    let reversed = pipeline
        .plan_rest(&anonymous, &RestRequest::get("/Stock/pieceid/2/categoryid/1"))
        .unwrap();

    assert_eq!(forward.predicates, [key("categoryid", "1"), key("pieceid", "2")]);
    assert_eq!(forward.predicates, reversed.predicates);
}

#[test]
fn key_values_are_percent_decoded() {
    let plan = pipeline()
        .plan_rest(
            &SecurityContext::anonymous(),
            &RestRequest::get("/Stock/categoryid/a%2Fb/pieceid/2"),
        )
        .unwrap();
    assert_eq!(plan.predicates[0], key("categoryid", "a/b"));
}

#[tokio::test]
async fn malformed_keys_are_bad_requests() {
    let anonymous = SecurityContext::anonymous();
    for path in [
        "/Stock/categoryid/1/categoryid/2",
        "/Stock/categoryid/1",
        "/Stock/categoryid/1/pieceid/2/name/x",
        "/Stock/categoryid/1/pieceid",
        "/books/title/x",
    ] {
        let err = rest_error(&anonymous, RestRequest::get(path)).await;
        assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(err.sub_status(), SubStatusCode::BadRequest, "{path}");
    }
}

#[tokio::test]
async fn anonymous_delete_is_forbidden() {
    let err = rest_error(
        &SecurityContext::anonymous(),
        RestRequest::new(Method::DELETE, "/books/id/1"),
    )
    .await;
    assert_eq!(err.status(), StatusCode::FORBIDDEN);
    assert!(!err.message().contains("anonymous"));
}

#[tokio::test]
async fn unassigned_role_is_forbidden() {
    let ctx = SecurityContext::builder()
        .authenticated(true)
        .assigned_roles(vec!["reader".to_owned()])
        .requested_role("author")
        .build();
    let err = rest_error(&ctx, RestRequest::get("/books/id/1")).await;
    assert_eq!(err.sub_status(), SubStatusCode::Forbidden);
}

#[tokio::test]
async fn roles_without_entries_do_not_fall_back() {
    let authenticated = SecurityContext::builder().authenticated(true).build();
    let err = rest_error(&authenticated, RestRequest::get("/books/id/1")).await;
    assert_eq!(err.sub_status(), SubStatusCode::Forbidden);

    let err = rest_error(&user("reader", "u-3"), RestRequest::get("/Stock")).await;
    assert_eq!(err.sub_status(), SubStatusCode::Forbidden);
}

#[test]
fn policy_claims_are_substituted() {
    let plan = pipeline()
        .plan_rest(&user("author", "u-42"), &RestRequest::get("/books"))
        .unwrap();

    assert!(plan.is_list);
    assert_eq!(plan.predicates, [owner_is("u-42")]);
    assert_eq!(plan.limit, Some(100));
    assert_eq!(plan.order_by[0].column, ColumnRef::qualified("table0", "id"));
    assert_eq!(plan.order_by[0].direction, SortDirection::Asc);
}

#[tokio::test]
async fn missing_claim_is_forbidden() {
    let ctx = SecurityContext::builder()
        .authenticated(true)
        .assigned_roles(vec!["author".to_owned()])
        .requested_role("author")
        .build();
    let err = rest_error(&ctx, RestRequest::get("/books/id/1")).await;
    assert_eq!(err.sub_status(), SubStatusCode::Forbidden);
}

#[test]
fn excluded_columns_are_silently_dropped_from_select() {
    let request = RestRequest::get("/books/id/1").with_query("$select=id,owner");
    let plan = pipeline()
        .plan_rest(&SecurityContext::anonymous(), &request)
        .unwrap();
    assert_eq!(columns(&plan), ["id"]);
}

#[tokio::test]
async fn paging_a_single_item_is_bad_request() {
    for query in ["$first=5", "$orderby=title"] {
        let request = RestRequest::get("/books/id/1").with_query(query);
        let err = rest_error(&SecurityContext::anonymous(), request).await;
        assert_eq!(err.sub_status(), SubStatusCode::BadRequest, "{query}");
    }
}

#[tokio::test]
async fn unknown_selected_column_is_bad_request() {
    let request = RestRequest::get("/books/id/1").with_query("$select=isbn");
    let err = rest_error(&SecurityContext::anonymous(), request).await;
    assert_eq!(err.sub_status(), SubStatusCode::BadRequest);
}

#[test]
fn patch_with_policy_targets_own_rows() {
    let request = RestRequest::new(Method::PATCH, "/books/id/7").with_body(json!({"title": "Dune"}));
    let plan = pipeline().plan_rest(&user("author", "u-1"), &request).unwrap();

    assert_eq!(plan.operation, Operation::UpsertIncremental);
    assert_eq!(plan.predicates, [key("id", "7"), owner_is("u-1")]);
    assert_eq!(plan.assignments.len(), 1);
    assert_eq!(plan.assignments[0].column, "title");
    assert_eq!(plan.assignments[0].value, json!("Dune"));
    assert_eq!(columns(&plan), ["title", "year"]);
}

#[tokio::test]
async fn create_and_update_do_not_grant_upsert() {
    let put =
        RestRequest::new(Method::PUT, "/books/id/9").with_body(json!({"title": "Emma", "owner": "u-2"}));
    let err = rest_error(&user("importer", "u-2"), put).await;
    assert_eq!(err.sub_status(), SubStatusCode::Forbidden);

    let patch = RestRequest::new(Method::PATCH, "/books/id/9").with_body(json!({"title": "Emma"}));
    let err = rest_error(&user("importer", "u-2"), patch).await;
    assert_eq!(err.sub_status(), SubStatusCode::Forbidden);
}

#[test]
fn upsert_is_granted_by_its_own_entry() {
    let request =
        RestRequest::new(Method::PUT, "/books/id/9").with_body(json!({"title": "Emma", "owner": "u-2"}));
    let plan = pipeline().plan_rest(&user("curator", "u-2"), &request).unwrap();

    assert_eq!(plan.operation, Operation::Upsert);
    assert_eq!(plan.predicates, [key("id", "9")]);
    assert_eq!(columns(&plan), ["id", "title", "publisher_id", "owner"]);
}

#[tokio::test]
async fn upsert_body_outside_permitted_fields_is_bad_request() {
    let request =
        RestRequest::new(Method::PUT, "/books/id/9").with_body(json!({"title": "Emma", "year": 1815}));
    let err = rest_error(&user("curator", "u-2"), request).await;
    assert_eq!(err.sub_status(), SubStatusCode::BadRequest);
}

#[test]
fn create_without_key_route() {
    let request = RestRequest::new(Method::POST, "/books").with_body(json!({"title": "Emma", "year": 1815}));
    let plan = pipeline().plan_rest(&user("importer", "u-2"), &request).unwrap();

    assert_eq!(plan.operation, Operation::Create);
    assert!(!plan.is_list);
    assert!(plan.predicates.is_empty());
    assert_eq!(plan.assignments.len(), 2);
}

#[tokio::test]
async fn create_with_key_route_is_bad_request() {
    let request = RestRequest::new(Method::POST, "/books/id/1").with_body(json!({"title": "Emma"}));
    let err = rest_error(&user("importer", "u-2"), request).await;
    assert_eq!(err.sub_status(), SubStatusCode::BadRequest);
}

#[test]
fn linking_relationship_yields_two_hops() {
    let request = GraphQLRequest {
        entity: "Book".to_owned(),
        operation: Operation::Read,
        is_list: false,
        key_arguments: vec![("id".to_owned(), json!(3))],
        selection: vec!["title".to_owned()],
        related: vec!["authors".to_owned(), "publisher".to_owned()],
        first: None,
        input: None,
    };
    let plan = pipeline()
        .plan_graphql(&user("reader", "u-3"), &request)
        .unwrap();

    assert_eq!(plan.predicates, [key("id", "3")]);
    assert_eq!(columns(&plan), ["title"]);

    let authors = &plan.joins[0];
    assert_eq!(authors.hops.len(), 2);
    assert_eq!(authors.hops[0].alias, "table1");
    assert!(!authors.hops[0].projected);
    assert_eq!(authors.hops[1].alias, "table2");
    assert_eq!(authors.target_alias(), Some("table2"));

    let publisher = &plan.joins[1];
    assert_eq!(publisher.target_alias(), Some("table3"));
    assert_eq!(
        publisher.hops[0].on[0].left,
        ColumnRef::qualified("table0", "publisher_id")
    );
    assert_eq!(
        publisher.hops[0].on[0].right,
        ColumnRef::qualified("table3", "id")
    );
}

#[tokio::test]
async fn related_entity_needs_read_permission() {
    let request = GraphQLRequest {
        entity: "Book".to_owned(),
        operation: Operation::Read,
        is_list: true,
        key_arguments: Vec::new(),
        selection: Vec::new(),
        related: vec!["authors".to_owned()],
        first: None,
        input: None,
    };
    let err = client()
        .plan_graphql(&SecurityContext::anonymous(), request)
        .await
        .unwrap_err();
    assert_eq!(err.sub_status(), SubStatusCode::Forbidden);
}

#[tokio::test]
async fn disabled_rest_entity_is_not_found() {
    let err = rest_error(&SecurityContext::anonymous(), RestRequest::get("/Audit/id/1")).await;
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
    assert_eq!(err.to_payload()["error"]["code"], "EntityNotFound");
}

#[tokio::test]
async fn unsupported_method_and_parameter() {
    let anonymous = SecurityContext::anonymous();

    let err = rest_error(&anonymous, RestRequest::new(Method::OPTIONS, "/books")).await;
    assert_eq!(err.status(), StatusCode::NOT_IMPLEMENTED);

    let err = rest_error(
        &anonymous,
        RestRequest::get("/books").with_query("$filter=id%20eq%201"),
    )
    .await;
    assert_eq!(err.sub_status(), SubStatusCode::NotSupported);
}

#[test]
fn page_size_bounds() {
    let pipeline = pipeline();
    let anonymous = SecurityContext::anonymous();

    let all = pipeline
        .plan_rest(&anonymous, &RestRequest::get("/books").with_query("$first=-1"))
        .unwrap();
    assert_eq!(all.limit, Some(100_000));

    let zero = pipeline.plan_rest(&anonymous, &RestRequest::get("/books").with_query("$first=0"));
    assert_eq!(zero.unwrap_err().sub_status(), SubStatusCode::BadRequest);
}

#[test]
fn plans_serialize_for_diffing() {
    let plan = pipeline()
        .plan_rest(&SecurityContext::anonymous(), &RestRequest::get("/books/id/1"))
        .unwrap();
    let value = serde_json::to_value(&plan).unwrap();
    assert_eq!(value["entity"], "Book");
    assert_eq!(value["alias"], "table0");
    assert_eq!(value["is_list"], false);
}
