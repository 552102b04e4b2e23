//! Request addressing parser.
//!
//! Turns REST paths, query strings and GraphQL arguments into [`KeyPair`]s
//! and [`QueryOptions`]. No metadata is consulted here.

use std::collections::HashSet;

use entity_gateway_sdk::{Operation, SortDirection};
use http::Method;
use serde_json::Value;
use thiserror::Error;

use super::context::{KeyPair, OrderByRequest};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("primary key route '{0}' must alternate column names and values")]
    OddSegmentCount(String),

    #[error("primary key route '{0}' contains an empty column name")]
    EmptyColumn(String),

    #[error("segment '{0}' is not valid percent-encoded UTF-8")]
    InvalidEncoding(String),

    #[error("key argument '{0}' must be a non-null scalar")]
    NonScalarArgument(String),

    #[error("request path is empty")]
    EmptyPath,

    #[error("malformed query string: {0}")]
    QueryString(String),

    #[error("query parameter '{0}' is not recognized")]
    UnknownParameter(String),

    #[error("query parameter '{0}' is not supported")]
    UnsupportedParameter(String),

    #[error("query parameter '{0}' is given more than once")]
    DuplicateParameter(String),

    #[error("invalid value '{value}' for query parameter '{parameter}'")]
    InvalidParameter { parameter: String, value: String },
}

/// Options parsed from a REST query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub select: Option<Vec<String>>,
    pub first: Option<i64>,
    pub order_by: Vec<OrderByRequest>,
}

impl QueryOptions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.select.is_none() && self.first.is_none() && self.order_by.is_empty()
    }
}

/// Parse `col1/val1/col2/val2/...` into key pairs, in request order.
///
/// The empty route yields no pairs. Duplicate columns are kept; rejecting
/// them is the validator's job.
///
/// # Errors
///
/// - [`ParseError::OddSegmentCount`] if a column has no value
/// - [`ParseError::EmptyColumn`] for an empty column segment
/// - [`ParseError::InvalidEncoding`] for undecodable segments
pub fn parse_primary_key_route(route: &str) -> Result<Vec<KeyPair>, ParseError> {
    if route.is_empty() {
        return Ok(Vec::new());
    }

    let segments: Vec<&str> = route.split('/').collect();
    if segments.len() % 2 != 0 {
        return Err(ParseError::OddSegmentCount(route.to_owned()));
    }

    segments
        .chunks_exact(2)
        .map(|pair| {
            let column = decode(pair[0])?;
            if column.is_empty() {
                return Err(ParseError::EmptyColumn(route.to_owned()));
            }
            Ok(KeyPair::new(column, decode(pair[1])?))
        })
        .collect()
}

fn decode(segment: &str) -> Result<String, ParseError> {
    urlencoding::decode(segment)
        .map(std::borrow::Cow::into_owned)
        .map_err(|_| ParseError::InvalidEncoding(segment.to_owned()))
}

/// Convert GraphQL key arguments into key pairs, in argument order.
///
/// # Errors
///
/// [`ParseError::NonScalarArgument`] for null, list or object values.
pub fn parse_arguments(arguments: &[(String, Value)]) -> Result<Vec<KeyPair>, ParseError> {
    arguments
        .iter()
        .map(|(name, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null | Value::Array(_) | Value::Object(_) => {
                    return Err(ParseError::NonScalarArgument(name.clone()));
                }
            };
            Ok(KeyPair::new(name.clone(), value))
        })
        .collect()
}

/// Split `/{entity}/{key route}` into the entity segment and the route.
///
/// # Errors
///
/// [`ParseError::EmptyPath`] when no entity segment is present.
pub fn parse_resource_path(path: &str) -> Result<(&str, &str), ParseError> {
    let path = path.trim_start_matches('/');
    let (entity, route) = path.split_once('/').unwrap_or((path, ""));
    if entity.is_empty() {
        return Err(ParseError::EmptyPath);
    }
    Ok((entity, route))
}

/// Parse the `$`-prefixed options of a REST query string.
///
/// Parameters without a `$` prefix are left for the caller and ignored.
///
/// # Errors
///
/// Any [`ParseError`] query variant for malformed, repeated, unknown or
/// unsupported parameters.
pub fn parse_query_string(query: &str) -> Result<QueryOptions, ParseError> {
    let query = query.trim_start_matches('?');
    let params: Vec<(String, String)> =
        serde_urlencoded::from_str(query).map_err(|e| ParseError::QueryString(e.to_string()))?;

    let mut seen = HashSet::new();
    let mut options = QueryOptions::default();

    for (name, value) in params {
        if !name.starts_with('$') {
            continue;
        }
        if !seen.insert(name.to_ascii_lowercase()) {
            return Err(ParseError::DuplicateParameter(name));
        }

        match name.to_ascii_lowercase().as_str() {
            "$select" => options.select = Some(parse_select(&name, &value)?),
            "$first" => options.first = Some(parse_first(&name, &value)?),
            "$orderby" => options.order_by = parse_order_by(&name, &value)?,
            "$filter" | "$after" => return Err(ParseError::UnsupportedParameter(name)),
            _ => return Err(ParseError::UnknownParameter(name)),
        }
    }

    Ok(options)
}

fn invalid(parameter: &str, value: &str) -> ParseError {
    ParseError::InvalidParameter {
        parameter: parameter.to_owned(),
        value: value.to_owned(),
    }
}

fn parse_select(name: &str, value: &str) -> Result<Vec<String>, ParseError> {
    let fields: Vec<String> = value.split(',').map(|f| f.trim().to_owned()).collect();
    if fields.iter().any(String::is_empty) {
        return Err(invalid(name, value));
    }
    Ok(fields)
}

fn parse_first(name: &str, value: &str) -> Result<i64, ParseError> {
    value.trim().parse().map_err(|_| invalid(name, value))
}

fn parse_order_by(name: &str, value: &str) -> Result<Vec<OrderByRequest>, ParseError> {
    value
        .split(',')
        .map(|item| {
            let mut parts = item.split_whitespace();
            let column = parts.next().ok_or_else(|| invalid(name, value))?;
            let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
                None | Some("asc") => SortDirection::Asc,
                Some("desc") => SortDirection::Desc,
                Some(_) => return Err(invalid(name, value)),
            };
            if parts.next().is_some() {
                return Err(invalid(name, value));
            }
            Ok(OrderByRequest {
                column: column.to_owned(),
                direction,
            })
        })
        .collect()
}

/// Map an HTTP method to the operation it requests.
///
/// `POST` creates, `PUT` replaces (upsert) and `PATCH` merges
/// (incremental upsert). `None` for every other method.
#[must_use]
pub fn operation_for_method(method: &Method) -> Option<Operation> {
    match method.as_str() {
        "GET" => Some(Operation::Read),
        "POST" => Some(Operation::Create),
        "PUT" => Some(Operation::Upsert),
        "PATCH" => Some(Operation::UpsertIncremental),
        "DELETE" => Some(Operation::Delete),
        _ => None,
    }
}
