//! Sort order and pagination for the contacts query.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::field::{ContactsField, Field};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

/// One sort key.
///
/// Only contacts fields can be sorted on. Attribute slots hold values of
/// different kinds under the same column, so ordering by them is meaningless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    /// Field to order by.
    pub field: ContactsField,
    /// Sort direction.
    pub direction: OrderDirection,
    /// Compare with `COLLATE NOCASE`.
    pub ignore_case: bool,
}

impl OrderSpec {
    /// Create an ascending order spec.
    pub fn asc(field: ContactsField) -> Self {
        Self {
            field,
            direction: OrderDirection::Asc,
            ignore_case: false,
        }
    }

    /// Create a descending order spec.
    pub fn desc(field: ContactsField) -> Self {
        Self {
            field,
            direction: OrderDirection::Desc,
            ignore_case: false,
        }
    }

    pub fn ignoring_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field.column())?;
        if self.ignore_case {
            f.write_str(" COLLATE NOCASE")?;
        }
        match self.direction {
            OrderDirection::Asc => f.write_str(" ASC"),
            OrderDirection::Desc => f.write_str(" DESC"),
        }
    }
}

/// Pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of results to return.
    pub limit: usize,
    /// Number of results to skip.
    pub offset: usize,
}

impl Pagination {
    /// Create pagination with limit and offset.
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    /// Create pagination with just a limit.
    pub fn limit(limit: usize) -> Self {
        Self { limit, offset: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::contacts;

    #[test]
    fn test_order_display() {
        assert_eq!(OrderSpec::asc(contacts::ID).to_string(), "_id ASC");
        assert_eq!(
            OrderSpec::desc(contacts::DISPLAY_NAME_PRIMARY)
                .ignoring_case()
                .to_string(),
            "display_name COLLATE NOCASE DESC"
        );
    }

    #[test]
    fn test_pagination() {
        assert_eq!(Pagination::limit(10), Pagination::new(10, 0));
    }
}
