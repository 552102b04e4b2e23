//! Database policy expressions (`policy.database`).
//!
//! Grammar (OData-style, case-sensitive keywords):
//!
//! ```text
//! expression := or
//! or         := and ("or" and)*
//! and        := unary ("and" unary)*
//! unary      := "not" unary | "(" expression ")" | comparison
//! comparison := operand ("eq" | "ne" | "gt" | "ge" | "lt" | "le") operand
//! operand    := "@claims." name | "@item." name | 'string' | number | true | false | null
//! ```
//!
//! Expressions are parsed once, at configuration load. Claim substitution
//! happens per request in the authorization evaluator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::predicate::CompareOp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PolicyOperand {
    /// `@claims.<name>`: replaced by the caller's claim value.
    Claim(String),
    /// `@item.<field>`: a column of the addressed entity.
    Item(String),
    Literal(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PolicyExpr {
    Compare {
        left: PolicyOperand,
        op: CompareOp,
        right: PolicyOperand,
    },
    And(Box<PolicyExpr>, Box<PolicyExpr>),
    Or(Box<PolicyExpr>, Box<PolicyExpr>),
    Not(Box<PolicyExpr>),
}

impl PolicyExpr {
    fn visit_operands<'a>(&'a self, f: &mut impl FnMut(&'a PolicyOperand)) {
        match self {
            Self::Compare { left, right, .. } => {
                f(left);
                f(right);
            }
            Self::And(l, r) | Self::Or(l, r) => {
                l.visit_operands(f);
                r.visit_operands(f);
            }
            Self::Not(inner) => inner.visit_operands(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid policy expression '{expression}': {message}")]
pub struct PolicyParseError {
    pub expression: String,
    pub message: String,
}

/// A parsed `policy.database` expression together with its source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PolicyExpression {
    raw: String,
    expr: PolicyExpr,
}

impl PolicyExpression {
    /// Parse an expression.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyParseError`] when the text does not match the grammar.
    pub fn parse(raw: &str) -> Result<Self, PolicyParseError> {
        let expr = grammar::expression(raw).map_err(|e| PolicyParseError {
            expression: raw.to_owned(),
            message: format!("expected {} at {}", e.expected, e.location),
        })?;
        Ok(Self {
            raw: raw.to_owned(),
            expr,
        })
    }

    #[inline]
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[inline]
    #[must_use]
    pub fn expr(&self) -> &PolicyExpr {
        &self.expr
    }

    /// Item fields referenced through `@item.<field>`.
    #[must_use]
    pub fn item_fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.expr.visit_operands(&mut |op| {
            if let PolicyOperand::Item(name) = op {
                out.push(name.as_str());
            }
        });
        out
    }

    /// Claims referenced through `@claims.<name>`.
    #[must_use]
    pub fn claims(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.expr.visit_operands(&mut |op| {
            if let PolicyOperand::Claim(name) = op {
                out.push(name.as_str());
            }
        });
        out
    }
}

impl FromStr for PolicyExpression {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PolicyExpression {
    type Error = PolicyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PolicyExpression> for String {
    fn from(value: PolicyExpression) -> Self {
        value.raw
    }
}

impl fmt::Display for PolicyExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn number_value(text: &str) -> Option<serde_json::Value> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(serde_json::Value::from(i));
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(serde_json::Value::Number)
}

type Join = fn(Box<PolicyExpr>, Box<PolicyExpr>) -> PolicyExpr;

fn fold(first: PolicyExpr, rest: Vec<PolicyExpr>, join: Join) -> PolicyExpr {
    rest.into_iter()
        .fold(first, |acc, next| join(Box::new(acc), Box::new(next)))
}

peg::parser! {
    grammar grammar() for str {
        rule _() = quiet!{[' ' | '\t' | '\r' | '\n']*}

        rule ident_char() = ['a'..='z' | 'A'..='Z' | '0'..='9' | '_']

        rule kw_or() = "or" !ident_char()
        rule kw_and() = "and" !ident_char()
        rule kw_not() = "not" !ident_char()

        pub rule expression() -> PolicyExpr = _ e:or() _ { e }

        rule or() -> PolicyExpr
            = first:and() rest:(_ kw_or() _ r:and() { r })* { fold(first, rest, PolicyExpr::Or) }

        rule and() -> PolicyExpr
            = first:unary() rest:(_ kw_and() _ r:unary() { r })* { fold(first, rest, PolicyExpr::And) }

        rule unary() -> PolicyExpr
            = kw_not() _ e:unary() { PolicyExpr::Not(Box::new(e)) }
            / "(" _ e:or() _ ")" { e }
            / comparison()

        rule comparison() -> PolicyExpr
            = left:operand() _ op:compare_op() _ right:operand() { PolicyExpr::Compare { left, op, right } }

        rule compare_op() -> CompareOp
            = "eq" !ident_char() { CompareOp::Eq }
            / "ne" !ident_char() { CompareOp::Ne }
            / "gt" !ident_char() { CompareOp::Gt }
            / "ge" !ident_char() { CompareOp::Ge }
            / "lt" !ident_char() { CompareOp::Lt }
            / "le" !ident_char() { CompareOp::Le }
            / expected!("comparison operator")

        rule operand() -> PolicyOperand
            = "@claims." n:name() { PolicyOperand::Claim(n.to_owned()) }
            / "@item." n:name() { PolicyOperand::Item(n.to_owned()) }
            / s:string() { PolicyOperand::Literal(serde_json::Value::String(s)) }
            / n:number() { PolicyOperand::Literal(n) }
            / "true" !ident_char() { PolicyOperand::Literal(serde_json::Value::Bool(true)) }
            / "false" !ident_char() { PolicyOperand::Literal(serde_json::Value::Bool(false)) }
            / "null" !ident_char() { PolicyOperand::Literal(serde_json::Value::Null) }
            / expected!("operand")

        rule name() -> &'input str
            = $(['a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '.' | ':' | '/' | '-']+)

        rule string() -> String
            = "'" chars:("''" { '\'' } / c:[^ '\''] { c })* "'" { chars.into_iter().collect() }

        rule number() -> serde_json::Value
            = n:$("-"? ['0'..='9']+ ("." ['0'..='9']+)?) {? number_value(n).ok_or("number") }
    }
}
