//! The backing store collaborator.
//!
//! The resolver and assembler never join relations themselves. They issue
//! single-relation queries through [`ContactsStore`] and stitch the results
//! together in memory.

pub mod filter;
pub mod memory;

use std::collections::BTreeSet;
use std::fmt;

use rolodex_proto::{Expr, OrderSpec, Pagination, Relation, Value};

use crate::error::Error;

pub use filter::RowFilter;
pub use memory::MemoryStore;

/// Deduplicated, ordered set of row identifiers.
pub type IdSet = BTreeSet<i64>;

/// Rows returned by a store query.
pub type RowStream<'a> = Box<dyn Iterator<Item = Result<Row, Error>> + 'a>;

/// One row: column names paired with values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<(String, Value)>,
}

static NULL: Value = Value::Null;

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.values.iter_mut().find(|(name, _)| name == column) {
            Some((_, v)) => *v = value,
            None => self.values.push((column.to_string(), value)),
        }
    }

    /// Value of `column`, or null when the column is absent.
    pub fn get(&self, column: &str) -> &Value {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
            .unwrap_or(&NULL)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.iter().any(|(name, _)| name == column)
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).as_i64()
    }

    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).as_str()
    }

    pub fn get_bool(&self, column: &str) -> Option<bool> {
        self.get(column).as_bool()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, v)| (name.as_str(), v))
    }

    /// Keep only `columns`. An empty list keeps everything.
    pub fn project(&self, columns: &[&str]) -> Row {
        if columns.is_empty() {
            return self.clone();
        }
        Row {
            values: self
                .values
                .iter()
                .filter(|(name, _)| columns.contains(&name.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Copy `other`'s columns over this row.
    pub fn merge(&mut self, other: &Row) {
        for (name, value) in other.iter() {
            self.set(name, value.clone());
        }
    }
}

impl<S: Into<String>, V: Into<Value>> FromIterator<(S, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        Row {
            values: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}

/// `ORDER BY ... LIMIT ... OFFSET ...` part of a query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SortClause {
    pub order: Vec<OrderSpec>,
    pub pagination: Option<Pagination>,
}

impl SortClause {
    pub fn new(order: Vec<OrderSpec>, pagination: Option<Pagination>) -> Self {
        Self { order, pagination }
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty() && self.pagination.is_none()
    }
}

impl fmt::Display for SortClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        if !self.order.is_empty() {
            f.write_str("ORDER BY ")?;
            for (i, spec) in self.order.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", spec)?;
            }
            sep = " ";
        }
        if let Some(p) = &self.pagination {
            write!(f, "{}LIMIT {} OFFSET {}", sep, p.limit, p.offset)?;
        }
        Ok(())
    }
}

/// A single-relation read.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreQuery {
    pub relation: Relation,
    /// Columns to return. Empty means every column.
    pub columns: Vec<&'static str>,
    /// Row filter. Its `Display` is the predicate text.
    pub selection: Option<Expr>,
    pub sort: SortClause,
}

impl StoreQuery {
    pub fn new(relation: Relation) -> Self {
        Self {
            relation,
            columns: Vec::new(),
            selection: None,
            sort: SortClause::default(),
        }
    }

    pub fn with_columns(mut self, columns: Vec<&'static str>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_selection(mut self, selection: impl Into<Option<Expr>>) -> Self {
        self.selection = selection.into();
        self
    }

    pub fn with_sort(mut self, sort: SortClause) -> Self {
        self.sort = sort;
        self
    }

    /// Predicate text, or the empty string when unfiltered.
    pub fn selection_text(&self) -> String {
        self.selection
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}

/// One write in an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOperation {
    Insert {
        relation: Relation,
        values: Row,
    },
    Update {
        relation: Relation,
        selection: Expr,
        values: Row,
    },
    Delete {
        relation: Relation,
        selection: Expr,
    },
}

/// Result of one operation of a successful batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    /// Rows inserted, updated or deleted.
    pub affected: usize,
    /// Identifier of the inserted row.
    pub inserted_id: Option<i64>,
}

/// Row-oriented provider of the three relations.
pub trait ContactsStore: Send + Sync {
    /// Read rows of one relation. Stores may ignore the pagination part of
    /// the sort clause.
    fn query(&self, query: &StoreQuery) -> Result<RowStream<'_>, Error>;

    /// Native free-text search over contacts, returning contact ids.
    fn search_contact_ids(&self, text: &str) -> Result<IdSet, Error>;

    /// Apply every operation or none. `None` means the batch failed as a
    /// whole.
    fn apply_batch(&self, operations: Vec<BatchOperation>) -> Option<Vec<BatchOutcome>>;
}
