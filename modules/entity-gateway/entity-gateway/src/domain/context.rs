//! Per-request working state shared by the pipeline stages.

use entity_gateway_sdk::{Operation, Predicate, SortDirection};
use serde_json::{Map, Value};

use super::parser::{self, ParseError, QueryOptions};

/// One `(column, value)` pair addressed by the caller.
///
/// Values stay raw strings until the plan builder turns them into
/// predicate literals; type coercion belongs to the SQL generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub column: String,
    pub value: String,
}

impl KeyPair {
    #[must_use]
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// A requested ordering, still unvalidated against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByRequest {
    pub column: String,
    pub direction: SortDirection,
}

/// Hands out `table0`, `table1`, ... in allocation order.
#[derive(Debug, Default)]
pub struct AliasGenerator {
    next: usize,
}

impl AliasGenerator {
    pub fn next_alias(&mut self) -> String {
        let alias = format!("table{}", self.next);
        self.next += 1;
        alias
    }
}

/// Mutable request state, owned by one pipeline run.
#[derive(Debug)]
pub struct RequestContext {
    pub entity_name: String,
    pub operation: Operation,
    pub is_list: bool,
    /// Key pairs in request order; duplicates are kept for the validator.
    pub primary_key_predicates: Vec<KeyPair>,
    /// `None` selects every permitted column.
    pub requested_fields: Option<Vec<String>>,
    /// Filled by the authorization stage.
    pub fields_to_return: Vec<String>,
    pub mutation_values: Map<String, Value>,
    /// Filled by the authorization stage, unqualified.
    pub policy_predicate: Option<Predicate>,
    pub first: Option<i64>,
    pub order_by: Vec<OrderByRequest>,
    pub related: Vec<String>,
    pub aliases: AliasGenerator,
}

impl RequestContext {
    #[must_use]
    pub fn new(entity_name: impl Into<String>, operation: Operation) -> Self {
        Self {
            entity_name: entity_name.into(),
            operation,
            is_list: true,
            primary_key_predicates: Vec::new(),
            requested_fields: None,
            fields_to_return: Vec::new(),
            mutation_values: Map::new(),
            policy_predicate: None,
            first: None,
            order_by: Vec::new(),
            related: Vec::new(),
            aliases: AliasGenerator::default(),
        }
    }

    /// Parse a REST key route and append its pairs.
    ///
    /// # Errors
    ///
    /// See [`parser::parse_primary_key_route`].
    pub fn append_primary_key_route(&mut self, route: &str) -> Result<(), ParseError> {
        let pairs = parser::parse_primary_key_route(route)?;
        self.primary_key_predicates.extend(pairs);
        Ok(())
    }

    pub fn apply_query_options(&mut self, options: QueryOptions) {
        if options.select.is_some() {
            self.requested_fields = options.select;
        }
        if options.first.is_some() {
            self.first = options.first;
        }
        self.order_by.extend(options.order_by);
    }
}
