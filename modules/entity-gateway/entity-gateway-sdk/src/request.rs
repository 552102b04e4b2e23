//! Inbound requests as handed over by the transport layer.

use http::Method;
use serde::{Deserialize, Serialize};

use crate::permissions::Operation;

/// A REST request after routing: method, path below the API prefix, raw query.
#[derive(Debug, Clone)]
pub struct RestRequest {
    pub method: Method,
    /// `{entity-path}[/{col}/{val}...]`
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    pub body: Option<serde_json::Value>,
}

impl RestRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            body: None,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A GraphQL field resolved to an entity operation by the schema front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLRequest {
    pub entity: String,
    pub operation: Operation,
    pub is_list: bool,
    /// Primary key arguments (`book_by_pk(id: 1)`), in argument order.
    #[serde(default)]
    pub key_arguments: Vec<(String, serde_json::Value)>,
    /// Selected scalar fields; empty selects every readable field.
    #[serde(default)]
    pub selection: Vec<String>,
    /// Selected relationship fields.
    #[serde(default)]
    pub related: Vec<String>,
    #[serde(default)]
    pub first: Option<i64>,
    /// Mutation `item` input object.
    #[serde(default)]
    pub input: Option<serde_json::Value>,
}
