//! Predicate evaluation against in-memory rows.
//!
//! `RowFilter` gives [`MemoryStore`](super::MemoryStore) the same semantics an
//! SQL store applies to the predicate text: a comparison involving NULL is
//! never true, `LIKE` ignores ASCII case and honours the `\` escape, and every
//! leaf on a kind slot only matches rows of that kind.

use std::cmp::Ordering;

use rolodex_proto::predicate::{KIND_COLUMN, LIKE_ESCAPE};
use rolodex_proto::{CombineOp, Expr, MatchOp, Operand, Value};

use super::Row;
use crate::error::Error;

/// Evaluates predicate trees against rows.
pub struct RowFilter;

impl RowFilter {
    /// Evaluate a predicate against a row.
    ///
    /// Returns `true` if the row matches, `false` otherwise. Operands that do
    /// not fit their operator are reported as invalid predicates.
    pub fn evaluate(expr: &Expr, row: &Row) -> Result<bool, Error> {
        match expr {
            Expr::Combine { lhs, op, rhs } => match op {
                CombineOp::And => Ok(Self::evaluate(lhs, row)? && Self::evaluate(rhs, row)?),
                CombineOp::Or => Ok(Self::evaluate(lhs, row)? || Self::evaluate(rhs, row)?),
            },
            Expr::Match { field, op, operand } => {
                if let Some(kind) = &field.kind {
                    if row.get_str(KIND_COLUMN) != Some(kind.tag()) {
                        return Ok(false);
                    }
                }
                Self::evaluate_leaf(row.get(field.column), *op, operand)
            }
        }
    }

    fn evaluate_leaf(value: &Value, op: MatchOp, operand: &Operand) -> Result<bool, Error> {
        match (op, operand) {
            (MatchOp::IsNull, _) => Ok(value.is_null()),
            (MatchOp::IsNotNull, _) => Ok(!value.is_null()),
            _ if value.is_null() => Ok(false),
            (MatchOp::In, Operand::List(list)) => {
                Ok(list.iter().any(|v| Self::values_equal(value, v)))
            }
            (MatchOp::NotIn, Operand::List(list)) => {
                Ok(!list.iter().any(|v| Self::values_equal(value, v)))
            }
            (MatchOp::Like, Operand::Pattern(p)) => {
                Ok(Self::like_match(&text_of(value), &p.text()))
            }
            (MatchOp::NotLike, Operand::Pattern(p)) => {
                Ok(!Self::like_match(&text_of(value), &p.text()))
            }
            (_, Operand::Scalar(v)) if v.is_null() => Ok(false),
            (MatchOp::Equal, Operand::Scalar(v)) => Ok(Self::values_equal(value, v)),
            (MatchOp::NotEqual, Operand::Scalar(v)) => Ok(!Self::values_equal(value, v)),
            (MatchOp::GreaterThan, Operand::Scalar(v)) => {
                Ok(Self::ordering(value, v).is_some_and(Ordering::is_gt))
            }
            (MatchOp::GreaterThanOrEqual, Operand::Scalar(v)) => {
                Ok(Self::ordering(value, v).is_some_and(Ordering::is_ge))
            }
            (MatchOp::LessThan, Operand::Scalar(v)) => {
                Ok(Self::ordering(value, v).is_some_and(Ordering::is_lt))
            }
            (MatchOp::LessThanOrEqual, Operand::Scalar(v)) => {
                Ok(Self::ordering(value, v).is_some_and(Ordering::is_le))
            }
            (op, operand) => Err(rolodex_proto::Error::InvalidPredicate(format!(
                "{} cannot take {:?}",
                op.as_sql(),
                operand
            ))
            .into()),
        }
    }

    /// Check if two values are equal, comparing numbers across variants.
    pub fn values_equal(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            _ => Self::ordering(a, b) == Some(Ordering::Equal),
        }
    }

    /// Compare two values, returning their ordering if comparable.
    pub fn ordering(a: &Value, b: &Value) -> Option<Ordering> {
        match (a, b) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
            (Value::Float64(_), _) | (_, Value::Float64(_)) => {
                a.as_f64()?.partial_cmp(&b.as_f64()?)
            }
            _ => Some(a.as_i64()?.cmp(&b.as_i64()?)),
        }
    }

    /// Match a string against an SQL `LIKE` pattern, ignoring ASCII case.
    ///
    /// - `%` matches zero or more characters
    /// - `_` matches exactly one character
    /// - `\` makes the next pattern character literal
    pub fn like_match(value: &str, pattern: &str) -> bool {
        let value: Vec<char> = value.chars().collect();
        let pattern: Vec<char> = pattern.chars().collect();
        Self::like_match_at(&value, &pattern)
    }

    fn like_match_at(value: &[char], pattern: &[char]) -> bool {
        match pattern.split_first() {
            None => value.is_empty(),
            Some(('%', rest)) => {
                // Collapse runs of `%`, then try every split point.
                let rest = trim_leading_percent(rest);
                if rest.is_empty() {
                    return true;
                }
                (0..=value.len()).any(|skip| Self::like_match_at(&value[skip..], rest))
            }
            Some(('_', rest)) => !value.is_empty() && Self::like_match_at(&value[1..], rest),
            Some((&c, rest)) => {
                let (literal, rest) = match (c, rest.split_first()) {
                    (LIKE_ESCAPE, Some((&escaped, after))) => (escaped, after),
                    _ => (c, rest),
                };
                match value.split_first() {
                    Some((&v, value_rest)) if v.eq_ignore_ascii_case(&literal) => {
                        Self::like_match_at(value_rest, rest)
                    }
                    _ => false,
                }
            }
        }
    }
}

fn trim_leading_percent(mut pattern: &[char]) -> &[char] {
    while let Some(('%', rest)) = pattern.split_first() {
        pattern = rest;
    }
    pattern
}

/// Text a value is matched as by `LIKE`.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        other => other.to_sql(),
    }
}
