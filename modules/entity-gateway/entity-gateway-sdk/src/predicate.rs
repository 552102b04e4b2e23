//! Provider-agnostic predicate fragments handed to the SQL emitter.

use serde::{Deserialize, Serialize};

/// A column, optionally qualified with the alias of the relation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub alias: Option<String>,
    pub column: String,
}

impl ColumnRef {
    #[must_use]
    pub fn unqualified(column: impl Into<String>) -> Self {
        Self {
            alias: None,
            column: column.into(),
        }
    }

    #[must_use]
    pub fn qualified(alias: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            column: column.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Column(ColumnRef),
    /// Opaque value, coerced by the executor using the column type.
    Value(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Compare {
        left: Operand,
        op: CompareOp,
        right: Operand,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    /// `alias.column = value`
    #[must_use]
    pub fn column_eq(column: ColumnRef, value: serde_json::Value) -> Self {
        Self::Compare {
            left: Operand::Column(column),
            op: CompareOp::Eq,
            right: Operand::Value(value),
        }
    }

    /// Qualify every unqualified column reference with `alias`.
    #[must_use]
    pub fn qualified(self, alias: &str) -> Self {
        match self {
            Self::Compare { left, op, right } => Self::Compare {
                left: left.qualified(alias),
                op,
                right: right.qualified(alias),
            },
            Self::And(parts) => Self::And(parts.into_iter().map(|p| p.qualified(alias)).collect()),
            Self::Or(parts) => Self::Or(parts.into_iter().map(|p| p.qualified(alias)).collect()),
            Self::Not(inner) => Self::Not(Box::new(inner.qualified(alias))),
        }
    }
}

impl Operand {
    fn qualified(self, alias: &str) -> Self {
        match self {
            Self::Column(ColumnRef { alias: None, column }) => {
                Self::Column(ColumnRef::qualified(alias, column))
            }
            other => other,
        }
    }
}
