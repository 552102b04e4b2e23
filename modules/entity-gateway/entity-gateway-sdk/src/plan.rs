//! Provider-agnostic query plan: the pipeline's output.
//!
//! The plan carries no dialect-specific text. The external emitter turns it
//! into SQL (or a connector request) and executes it.

use serde::Serialize;

use crate::models::{Cardinality, DatabaseObject};
use crate::permissions::Operation;
use crate::predicate::{ColumnRef, Predicate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBy {
    pub column: ColumnRef,
    pub direction: SortDirection,
}

/// `left = right` join condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnEquality {
    pub left: ColumnRef,
    pub right: ColumnRef,
}

/// One relation joined into the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinHop {
    pub object: DatabaseObject,
    pub alias: String,
    pub on: Vec<ColumnEquality>,
    /// Linking objects are intermediate and never projected.
    pub projected: bool,
}

/// Join plan for one declared relationship.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinSpec {
    pub relationship: String,
    pub target_entity: String,
    pub cardinality: Cardinality,
    /// One hop for direct joins, two for linking-object joins.
    pub hops: Vec<JoinHop>,
    /// Target columns the caller may read.
    pub projection: Vec<ColumnRef>,
    /// Target-side row filters (the target entity's read policy).
    pub predicates: Vec<Predicate>,
}

impl JoinSpec {
    /// Alias of the target relation (the last hop).
    #[must_use]
    pub fn target_alias(&self) -> Option<&str> {
        self.hops.last().map(|h| h.alias.as_str())
    }
}

/// Column value bound by a write operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub column: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    pub entity: String,
    pub operation: Operation,
    pub source: DatabaseObject,
    pub alias: String,
    pub is_list: bool,
    /// ANDed row filters: key equalities, then the policy predicate.
    pub predicates: Vec<Predicate>,
    pub projection: Vec<ColumnRef>,
    pub joins: Vec<JoinSpec>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u32>,
    pub assignments: Vec<Assignment>,
}
