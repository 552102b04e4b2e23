//! Query plan builder.
//!
//! Pure assembly: every input has already been parsed, validated and
//! authorized, so building a plan cannot fail.

use entity_gateway_sdk::{
    Assignment, ColumnRef, EntityMetadata, JoinSpec, Operation, OrderBy, Predicate, QueryPlan,
    SortDirection,
};
use serde_json::Value;

use super::context::RequestContext;
use super::validator::ValidatedKey;

/// Which rows the plan addresses. Creates use `Collection`: they carry no
/// key predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySelection {
    Collection,
    Item(ValidatedKey),
}

/// Inputs that come from stages after the request context.
#[derive(Debug)]
pub struct PlanInputs {
    pub key: KeySelection,
    pub alias: String,
    pub joins: Vec<JoinSpec>,
    pub limit: Option<u32>,
}

/// Assemble the plan.
///
/// Predicates are the key equalities (in primary key order) followed by the
/// role's policy. Collection reads are ordered by the requested columns and
/// then by any primary key column not already ordered on, so paging is
/// stable.
#[must_use]
pub fn build_query_plan(
    context: &RequestContext,
    entity: &EntityMetadata,
    inputs: PlanInputs,
) -> QueryPlan {
    let PlanInputs {
        key,
        alias,
        joins,
        limit,
    } = inputs;
    let is_list = context.is_list;

    let mut predicates: Vec<Predicate> = match key {
        KeySelection::Collection => Vec::new(),
        KeySelection::Item(key) => key
            .into_pairs()
            .into_iter()
            .map(|pair| {
                Predicate::column_eq(
                    ColumnRef::qualified(alias.as_str(), pair.column),
                    Value::String(pair.value),
                )
            })
            .collect(),
    };
    if let Some(policy) = &context.policy_predicate {
        predicates.push(policy.clone().qualified(&alias));
    }

    let projection = if context.operation == Operation::Delete {
        Vec::new()
    } else {
        context
            .fields_to_return
            .iter()
            .map(|f| ColumnRef::qualified(alias.as_str(), f.as_str()))
            .collect()
    };

    let order_by = if is_list && context.operation == Operation::Read {
        stable_order(context, entity, &alias)
    } else {
        Vec::new()
    };

    let assignments = context
        .mutation_values
        .iter()
        .map(|(column, value)| Assignment {
            column: column.clone(),
            value: value.clone(),
        })
        .collect();

    QueryPlan {
        entity: entity.name.clone(),
        operation: context.operation,
        source: entity.table.source.clone(),
        alias,
        is_list,
        predicates,
        projection,
        joins,
        order_by,
        limit,
        assignments,
    }
}

fn stable_order(context: &RequestContext, entity: &EntityMetadata, alias: &str) -> Vec<OrderBy> {
    let mut order_by: Vec<OrderBy> = context
        .order_by
        .iter()
        .map(|o| OrderBy {
            column: ColumnRef::qualified(alias, o.column.as_str()),
            direction: o.direction,
        })
        .collect();

    for key in &entity.table.primary_key {
        if !context.order_by.iter().any(|o| &o.column == key) {
            order_by.push(OrderBy {
                column: ColumnRef::qualified(alias, key.as_str()),
                direction: SortDirection::Asc,
            });
        }
    }
    order_by
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::domain::context::{KeyPair, OrderByRequest};
    use crate::domain::validator::validate_pairs;
    use crate::test_support::{book_entity, stock_entity};
    use serde_json::json;

    fn item(entity: &EntityMetadata, pairs: &[(&str, &str)]) -> KeySelection {
        let pairs: Vec<KeyPair> = pairs.iter().map(|(c, v)| KeyPair::new(*c, *v)).collect();
        KeySelection::Item(validate_pairs(&pairs, &entity.table).unwrap())
    }

    fn inputs(key: KeySelection, limit: Option<u32>) -> PlanInputs {
        PlanInputs {
            key,
            alias: "table0".to_owned(),
            joins: Vec::new(),
            limit,
        }
    }

    #[test]
    fn item_read_has_key_predicates_in_declaration_order() {
        let entity = stock_entity();
        let mut ctx = RequestContext::new("Stock", Operation::Read);
        ctx.is_list = false;
        ctx.fields_to_return = vec!["categoryid".to_owned(), "pieceid".to_owned()];

        let key = item(&entity, &[("pieceid", "2"), ("categoryid", "1")]);
        let plan = build_query_plan(&ctx, &entity, inputs(key, None));

        assert!(!plan.is_list);
        assert_eq!(
            plan.predicates,
            [
                Predicate::column_eq(ColumnRef::qualified("table0", "categoryid"), json!("1")),
                Predicate::column_eq(ColumnRef::qualified("table0", "pieceid"), json!("2")),
            ]
        );
        assert!(plan.order_by.is_empty());
        assert_eq!(plan.limit, None);
    }

    #[test]
    fn policy_is_qualified_and_appended() {
        let entity = book_entity();
        let mut ctx = RequestContext::new("Book", Operation::Read);
        ctx.is_list = false;
        ctx.policy_predicate = Some(Predicate::column_eq(
            ColumnRef::unqualified("owner"),
            json!("u-1"),
        ));

        let plan = build_query_plan(&ctx, &entity, inputs(item(&entity, &[("id", "1")]), None));
        assert_eq!(
            plan.predicates[1],
            Predicate::column_eq(ColumnRef::qualified("table0", "owner"), json!("u-1"))
        );
    }

    #[test]
    fn collection_read_orders_by_request_then_key() {
        let entity = book_entity();
        let mut ctx = RequestContext::new("Book", Operation::Read);
        ctx.order_by = vec![OrderByRequest {
            column: "title".to_owned(),
            direction: SortDirection::Desc,
        }];

        let plan = build_query_plan(&ctx, &entity, inputs(KeySelection::Collection, Some(100)));

        assert!(plan.is_list);
        assert_eq!(plan.limit, Some(100));
        assert_eq!(
            plan.order_by,
            [
                OrderBy {
                    column: ColumnRef::qualified("table0", "title"),
                    direction: SortDirection::Desc,
                },
                OrderBy {
                    column: ColumnRef::qualified("table0", "id"),
                    direction: SortDirection::Asc,
                },
            ]
        );
    }

    #[test]
    fn mutation_carries_assignments() {
        let entity = book_entity();
        let mut ctx = RequestContext::new("Book", Operation::Create);
        ctx.is_list = false;
        ctx.mutation_values = json!({"title": "Dune", "year": 1965})
            .as_object()
            .cloned()
            .unwrap();
        ctx.fields_to_return = vec!["id".to_owned(), "title".to_owned()];

        let plan = build_query_plan(&ctx, &entity, inputs(KeySelection::Collection, None));

        assert_eq!(plan.operation, Operation::Create);
        assert_eq!(plan.assignments.len(), 2);
        assert_eq!(plan.assignments[0].column, "title");
        assert!(plan.order_by.is_empty());
        assert_eq!(plan.projection.len(), 2);
    }

    #[test]
    fn delete_projects_nothing() {
        let entity = book_entity();
        let mut ctx = RequestContext::new("Book", Operation::Delete);
        ctx.is_list = false;
        ctx.fields_to_return = vec!["id".to_owned()];

        let plan = build_query_plan(&ctx, &entity, inputs(item(&entity, &[("id", "7")]), None));
        assert!(plan.projection.is_empty());
        assert_eq!(plan.predicates.len(), 1);
    }
}
