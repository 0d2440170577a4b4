//! Limit and offset handling.

use rolodex_proto::Pagination;

use crate::error::Error;

/// Validate caller-supplied limit and offset.
///
/// `limit` must be positive and `offset` must not be negative. Both are
/// checked before the store is touched.
pub fn checked(limit: i64, offset: i64) -> Result<Pagination, Error> {
    if limit <= 0 {
        return Err(Error::InvalidArgument(format!(
            "limit must be positive, got {}",
            limit
        )));
    }
    if offset < 0 {
        return Err(Error::InvalidArgument(format!(
            "offset must not be negative, got {}",
            offset
        )));
    }
    Ok(Pagination::new(limit as usize, offset as usize))
}

/// Apply pagination to rows. Returns true if the limit cut rows off.
pub fn apply_pagination<T>(rows: &mut Vec<T>, pagination: &Pagination) -> bool {
    let offset = pagination.offset;
    let limit = pagination.limit;

    if offset > 0 {
        if offset >= rows.len() {
            rows.clear();
            return false;
        }
        rows.drain(0..offset);
    }

    if limit < rows.len() {
        rows.truncate(limit);
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_rejects_bad_arguments() {
        assert!(matches!(checked(0, 0), Err(Error::InvalidArgument(_))));
        assert!(matches!(checked(-5, 0), Err(Error::InvalidArgument(_))));
        assert!(matches!(checked(10, -1), Err(Error::InvalidArgument(_))));
        assert_eq!(checked(10, 20).unwrap(), Pagination::new(10, 20));
    }

    #[test]
    fn test_apply_pagination() {
        let mut rows: Vec<i32> = (0..15).collect();
        assert!(apply_pagination(&mut rows, &Pagination::new(10, 0)));
        assert_eq!(rows, (0..10).collect::<Vec<_>>());

        let mut rows: Vec<i32> = (0..15).collect();
        assert!(!apply_pagination(&mut rows, &Pagination::new(10, 10)));
        assert_eq!(rows, (10..15).collect::<Vec<_>>());

        let mut rows: Vec<i32> = (0..3).collect();
        assert!(!apply_pagination(&mut rows, &Pagination::new(10, 3)));
        assert!(rows.is_empty());
    }
}
