//! Query engine.
//!
//! A read runs in two strictly ordered phases. [`IdResolver`] turns the
//! caller's predicates into a set of candidate contact ids, querying one
//! relation at a time. [`QueryExecutor`] then reads the paginated contacts,
//! their raw contacts and attribute rows, and [`ContactsMapper`] folds them
//! into the typed result graph.

mod executor;
mod include;
mod mapper;
pub mod pagination;
mod registry;
mod resolver;

pub use executor::{ContactsQuery, QueryExecutor, QueryResult};
pub use include::{Include, Includes};
pub use mapper::{assemble, ContactsMapper};
pub use registry::{CountRestriction, CustomKindHandler, DataRow, Fold, KindRegistry};
pub use resolver::{id_restriction, Candidates, IdResolver, Selection};

use rolodex_proto::{Expr, Relation};
use tracing::trace;

use crate::error::Error;
use crate::store::{ContactsStore, Row, StoreQuery};

/// Cooperative cancellation: polled between stages and between rows.
pub type CancelCheck<'a> = &'a dyn Fn() -> bool;

/// Issue one store query and collect its rows.
///
/// The selection must only name columns of the queried relation. The
/// predicate text is logged redacted.
pub(crate) fn read(
    store: &dyn ContactsStore,
    query: &StoreQuery,
    mask: char,
) -> Result<Vec<Row>, Error> {
    if let Some(selection) = &query.selection {
        check_relation(selection, query.relation)?;
        trace!(
            relation = %query.relation,
            columns = query.columns.len(),
            predicate = %selection.redacted(mask),
            sort = %query.sort,
            "store query"
        );
    } else {
        trace!(
            relation = %query.relation,
            columns = query.columns.len(),
            sort = %query.sort,
            "store query"
        );
    }
    store.query(query)?.collect()
}

fn check_relation(selection: &Expr, relation: Relation) -> Result<(), Error> {
    match selection.fields().into_iter().find(|f| f.relation != relation) {
        Some(field) => Err(Error::Invariant(format!(
            "column {} of {} sent to {}",
            field.column, field.relation, relation
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolodex_proto::fields::{contacts, email};
    use rolodex_proto::Field;

    use crate::store::MemoryStore;

    #[test]
    fn test_read_rejects_foreign_columns() {
        let store = MemoryStore::new();
        let query = StoreQuery::new(Relation::Contacts)
            .with_selection(email::ADDRESS.equal_to("a@b.c").into_expr());
        assert!(matches!(read(&store, &query, '*'), Err(Error::Invariant(_))));
        assert_eq!(store.query_count(), 0);

        let query = StoreQuery::new(Relation::Contacts)
            .with_selection(contacts::ID.equal_to(1).into_expr());
        assert!(read(&store, &query, '*').unwrap().is_empty());
    }
}
