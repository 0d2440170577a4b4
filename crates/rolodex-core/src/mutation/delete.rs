//! Deletion of contacts and raw contacts.

use std::collections::BTreeMap;

use rolodex_proto::fields::{contacts, raw_contacts};
use rolodex_proto::{Field, Relation};
use tracing::{debug, warn};

use crate::security::Permissions;
use crate::store::{BatchOperation, ContactsStore};

/// Per-id outcome of a delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteResult {
    pub results: BTreeMap<i64, bool>,
}

impl DeleteResult {
    fn failed(ids: &[i64]) -> Self {
        Self {
            results: ids.iter().map(|id| (*id, false)).collect(),
        }
    }

    /// True if at least one id was requested and every one was deleted.
    pub fn is_successful(&self) -> bool {
        !self.results.is_empty() && self.results.values().all(|ok| *ok)
    }

    pub fn is_successful_for(&self, id: i64) -> bool {
        self.results.get(&id).copied().unwrap_or(false)
    }
}

/// Deletes rows in one atomic batch.
pub struct Delete<'a> {
    store: &'a dyn ContactsStore,
    permissions: &'a dyn Permissions,
}

impl<'a> Delete<'a> {
    pub fn new(store: &'a dyn ContactsStore, permissions: &'a dyn Permissions) -> Self {
        Self { store, permissions }
    }

    /// Delete raw contacts. A contact left without raw contacts is removed
    /// by the store.
    pub fn raw_contacts(&self, ids: &[i64]) -> DeleteResult {
        self.execute(Relation::RawContacts, ids, |id| {
            raw_contacts::ID.equal_to(id).into_expr()
        })
    }

    /// Delete contacts together with their raw contacts.
    pub fn contacts(&self, ids: &[i64]) -> DeleteResult {
        self.execute(Relation::Contacts, ids, |id| contacts::ID.equal_to(id).into_expr())
    }

    fn execute(
        &self,
        relation: Relation,
        ids: &[i64],
        selection: impl Fn(i64) -> rolodex_proto::Expr,
    ) -> DeleteResult {
        if ids.is_empty() || !self.permissions.can_write() {
            return DeleteResult::failed(ids);
        }

        let operations = ids
            .iter()
            .map(|id| BatchOperation::Delete {
                relation,
                selection: selection(*id),
            })
            .collect();

        match self.store.apply_batch(operations) {
            Some(outcomes) => {
                let results: BTreeMap<i64, bool> = ids
                    .iter()
                    .zip(outcomes.iter())
                    .map(|(id, outcome)| (*id, outcome.affected > 0))
                    .collect();
                debug!(
                    relation = %relation,
                    requested = ids.len(),
                    deleted = results.values().filter(|ok| **ok).count(),
                    "delete applied"
                );
                DeleteResult { results }
            }
            None => {
                warn!(relation = %relation, requested = ids.len(), "delete batch failed");
                DeleteResult::failed(ids)
            }
        }
    }
}
