//! Predicate splitting and candidate id resolution.
//!
//! Attribute predicates are evaluated against the attribute relation and
//! produce contact ids. A single attribute row has exactly one kind, so a
//! conjunction over several kinds can never match one row: such nodes are
//! split and their halves combined as id sets instead.
//!
//! Stage order:
//!
//! 1. free-text search
//! 2. attribute predicate, unioned with its raw contacts and contacts
//!    translations when blanks are included
//! 3. raw contacts predicate, restricted to the candidates so far
//! 4. contacts predicate, restricted the same way

use std::collections::BTreeSet;

use rolodex_proto::fields::{contacts, data, raw_contacts};
use rolodex_proto::{
    where_or, CombineOp, ContactsField, DataField, Expr, Field, Kind, Predicate, RawContactsField,
    Relation,
};
use tracing::debug;

use super::{read, CancelCheck};
use crate::config::QueryConfig;
use crate::error::Error;
use crate::store::{ContactsStore, IdSet, StoreQuery};

/// Predicates for each field family, plus optional free-text search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub data: Option<Predicate<DataField>>,
    pub raw_contacts: Option<Predicate<RawContactsField>>,
    pub contacts: Option<Predicate<ContactsField>>,
    pub search: Option<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(mut self, predicate: impl Into<Option<Predicate<DataField>>>) -> Self {
        self.data = predicate.into();
        self
    }

    pub fn with_raw_contacts(
        mut self,
        predicate: impl Into<Option<Predicate<RawContactsField>>>,
    ) -> Self {
        self.raw_contacts = predicate.into();
        self
    }

    pub fn with_contacts(mut self, predicate: impl Into<Option<Predicate<ContactsField>>>) -> Self {
        self.contacts = predicate.into();
        self
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    fn search_text(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// True when nothing restricts the result.
    pub fn is_unrestricted(&self) -> bool {
        self.data.is_none()
            && self.raw_contacts.is_none()
            && self.contacts.is_none()
            && self.search_text().is_none()
    }
}

/// Outcome of resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidates {
    /// No predicate was supplied: every contact qualifies.
    All,
    /// Only these contact ids qualify.
    Only(IdSet),
}

impl Candidates {
    pub fn is_empty(&self) -> bool {
        matches!(self, Candidates::Only(ids) if ids.is_empty())
    }

    pub fn ids(&self) -> Option<&IdSet> {
        match self {
            Candidates::All => None,
            Candidates::Only(ids) => Some(ids),
        }
    }

    fn empty() -> Self {
        Candidates::Only(IdSet::new())
    }
}

/// `field IN (...)` over `ids`, split into lists of at most `chunk` ids
/// joined with OR. `None` for an empty set.
pub fn id_restriction<F: Field>(field: &F, ids: &IdSet, chunk: usize) -> Option<Predicate<F>> {
    let ids: Vec<i64> = ids.iter().copied().collect();
    where_or(ids.chunks(chunk.max(1)), |c| field.is_in(c.iter().copied()))
}

/// Resolves a [`Selection`] into candidate contact ids.
pub struct IdResolver<'a> {
    store: &'a dyn ContactsStore,
    config: &'a QueryConfig,
}

impl<'a> IdResolver<'a> {
    pub fn new(store: &'a dyn ContactsStore, config: &'a QueryConfig) -> Self {
        Self { store, config }
    }

    /// Run every stage in order. Cancellation at any point yields an empty
    /// candidate set, never a partial one.
    pub fn resolve(
        &self,
        selection: &Selection,
        cancel: CancelCheck<'_>,
    ) -> Result<Candidates, Error> {
        let candidates = self.stages(selection, cancel)?;
        match candidates {
            Some(candidates) if !cancel() => Ok(candidates),
            _ => {
                debug!("resolution cancelled");
                Ok(Candidates::empty())
            }
        }
    }

    /// `None` when cancelled.
    fn stages(
        &self,
        selection: &Selection,
        cancel: CancelCheck<'_>,
    ) -> Result<Option<Candidates>, Error> {
        let mut candidates = Candidates::All;

        if cancel() {
            return Ok(None);
        }
        if let Some(text) = selection.search_text() {
            let ids = self.store.search_contact_ids(text)?;
            debug!(stage = "search", ids = ids.len(), "resolved candidates");
            if ids.is_empty() {
                return Ok(Some(Candidates::empty()));
            }
            candidates = Candidates::Only(ids);
        }

        if let Some(predicate) = &selection.data {
            if cancel() {
                return Ok(None);
            }
            let Some(ids) = self.data_contact_ids(predicate, cancel)? else {
                return Ok(None);
            };
            debug!(stage = "data", ids = ids.len(), "resolved candidates");
            candidates = intersect(candidates, ids);
            if candidates.is_empty() {
                return Ok(Some(candidates));
            }
        }

        if let Some(predicate) = &selection.raw_contacts {
            if cancel() {
                return Ok(None);
            }
            let ids = self.restrict(&raw_contacts::CONTACT_ID, predicate, &candidates)?;
            debug!(stage = "raw_contacts", ids = ids.len(), "resolved candidates");
            candidates = Candidates::Only(ids);
            if candidates.is_empty() {
                return Ok(Some(candidates));
            }
        }

        if let Some(predicate) = &selection.contacts {
            if cancel() {
                return Ok(None);
            }
            let ids = self.restrict(&contacts::ID, predicate, &candidates)?;
            debug!(stage = "contacts", ids = ids.len(), "resolved candidates");
            candidates = Candidates::Only(ids);
        }

        Ok(Some(candidates))
    }

    /// Contacts matching an attribute predicate. With blanks included, also
    /// contacts whose raw contacts or contact columns alone satisfy the
    /// translatable part of the predicate. `None` when cancelled.
    fn data_contact_ids(
        &self,
        predicate: &Predicate<DataField>,
        cancel: CancelCheck<'_>,
    ) -> Result<Option<IdSet>, Error> {
        let Some(mut ids) = self.contact_ids_matching(predicate.expr(), cancel)? else {
            return Ok(None);
        };
        if !self.config.include_blanks {
            return Ok(Some(ids));
        }

        if let Some(raw) = predicate.in_raw_contacts_table() {
            if cancel() {
                return Ok(None);
            }
            let blanks = self.ids(
                Relation::RawContacts,
                raw_contacts::CONTACT_ID.column(),
                raw.and(raw_contacts::CONTACT_ID.is_not_null()).into_expr(),
            )?;
            debug!(stage = "raw_contacts_blanks", ids = blanks.len(), "resolved candidates");
            ids.extend(blanks);
        }
        if let Some(contact) = predicate.in_contacts_table() {
            if cancel() {
                return Ok(None);
            }
            let blanks = self.ids(Relation::Contacts, contacts::ID.column(), contact.into_expr())?;
            debug!(stage = "contacts_blanks", ids = blanks.len(), "resolved candidates");
            ids.extend(blanks);
        }
        Ok(Some(ids))
    }

    /// Evaluate an attribute predicate tree, sending every subtree that can
    /// match a single row as one query. `None` when cancelled.
    fn contact_ids_matching(
        &self,
        expr: &Expr,
        cancel: CancelCheck<'_>,
    ) -> Result<Option<IdSet>, Error> {
        if cancel() {
            return Ok(None);
        }
        match expr {
            Expr::Combine { lhs, op, rhs } if row_kinds(expr).is_none() => {
                let Some(left) = self.contact_ids_matching(lhs, cancel)? else {
                    return Ok(None);
                };
                if *op == CombineOp::And && left.is_empty() {
                    return Ok(Some(left));
                }
                let Some(mut right) = self.contact_ids_matching(rhs, cancel)? else {
                    return Ok(None);
                };
                Ok(Some(match op {
                    CombineOp::And => left.intersection(&right).copied().collect(),
                    CombineOp::Or => {
                        right.extend(left);
                        right
                    }
                }))
            }
            _ => self
                .ids(Relation::Data, data::CONTACT_ID.column(), expr.clone())
                .map(Some),
        }
    }

    /// Contact ids of rows matching `predicate`, among the candidates.
    fn restrict<F: Field>(
        &self,
        contact_id: &F,
        predicate: &Predicate<F>,
        candidates: &Candidates,
    ) -> Result<IdSet, Error> {
        let scoped = match candidates {
            Candidates::All => predicate.clone(),
            Candidates::Only(ids) => predicate
                .clone()
                .and(id_restriction(contact_id, ids, self.config.max_in_clause_ids)),
        };
        let scoped = scoped.and(contact_id.is_not_null());
        self.ids(F::RELATION, contact_id.column(), scoped.into_expr())
    }

    fn ids(
        &self,
        relation: Relation,
        column: &'static str,
        selection: Expr,
    ) -> Result<IdSet, Error> {
        let query = StoreQuery::new(relation)
            .with_columns(vec![column])
            .with_selection(selection);
        let rows = read(self.store, &query, self.config.mask_char)?;
        Ok(rows.iter().filter_map(|r| r.get_i64(column)).collect())
    }
}

fn intersect(candidates: Candidates, ids: IdSet) -> Candidates {
    match candidates {
        Candidates::All => Candidates::Only(ids),
        Candidates::Only(current) => {
            Candidates::Only(current.intersection(&ids).copied().collect())
        }
    }
}

/// Kinds a single row would need to satisfy `expr`, or `None` when no single
/// row can (a conjunction over more than one kind).
fn row_kinds(expr: &Expr) -> Option<BTreeSet<Kind>> {
    match expr {
        Expr::Match { field, .. } => Some(field.kind.iter().cloned().collect()),
        Expr::Combine { lhs, op, rhs } => {
            let mut kinds = row_kinds(lhs)?;
            kinds.extend(row_kinds(rhs)?);
            match op {
                CombineOp::And if kinds.len() > 1 => None,
                _ => Some(kinds),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use rolodex_proto::fields::{email, name, phone};
    use rolodex_proto::{Kind, Slot};

    use crate::entity::Account;
    use crate::store::MemoryStore;

    fn never() -> bool {
        false
    }

    /// Contacts 1 and 2 have emails, contact 3 is blank, contact 4 has a
    /// phone only.
    fn fixture() -> MemoryStore {
        let store = MemoryStore::new();
        let gmail = Account::new("me@gmail.com", "com.google");
        let work = Account::new("me@work.io", "io.work");
        let r1 = store.insert_raw_contact(Some(&gmail));
        store
            .insert_data(r1, &Kind::Email, &[(Slot::Data1, "ann@x.io".into())])
            .unwrap();
        store
            .insert_data(r1, &Kind::Name, &[(Slot::Data2, "Ann".into())])
            .unwrap();
        let r2 = store.insert_raw_contact(Some(&work));
        store
            .insert_data(r2, &Kind::Email, &[(Slot::Data1, "bob@x.io".into())])
            .unwrap();
        store.insert_raw_contact(Some(&gmail));
        let r4 = store.insert_raw_contact(None);
        store
            .insert_data(r4, &Kind::Phone, &[(Slot::Data1, "555-0104".into())])
            .unwrap();
        store
    }

    fn resolve(store: &MemoryStore, config: &QueryConfig, selection: &Selection) -> Candidates {
        IdResolver::new(store, config).resolve(selection, &never).unwrap()
    }

    #[test]
    fn test_unrestricted() {
        let store = fixture();
        let config = QueryConfig::default();
        assert_eq!(resolve(&store, &config, &Selection::new()), Candidates::All);
        assert!(Selection::new().with_search("  ").is_unrestricted());
        assert_eq!(store.query_count(), 0);
    }

    #[test]
    fn test_data_predicate() {
        let store = fixture();
        let config = QueryConfig::default();
        let selection = Selection::new().with_data(email::ADDRESS.ends_with("@x.io"));
        assert_eq!(
            resolve(&store, &config, &selection),
            Candidates::Only(IdSet::from([1, 2]))
        );
    }

    #[test]
    fn test_cross_kind_and_is_split() {
        let store = fixture();
        let config = QueryConfig::default();
        let predicate = email::ADDRESS
            .starts_with("ann")
            .and(name::GIVEN_NAME.equal_to("Ann"));
        let selection = Selection::new().with_data(predicate);
        assert_eq!(resolve(&store, &config, &selection), Candidates::Only(IdSet::from([1])));
        assert_eq!(store.query_count(), 2);
    }

    #[test]
    fn test_cross_kind_and_short_circuits() {
        let store = fixture();
        let config = QueryConfig::default();
        let predicate = email::ADDRESS
            .equal_to("nobody@x.io")
            .and(phone::NUMBER.is_not_null());
        let selection = Selection::new().with_data(predicate);
        assert!(resolve(&store, &config, &selection).is_empty());
        assert_eq!(store.query_count(), 1);
    }

    #[test]
    fn test_single_kind_or_is_one_query() {
        let store = fixture();
        let config = QueryConfig::default();
        let predicate = email::ADDRESS
            .starts_with("ann")
            .or(phone::NUMBER.starts_with("555"));
        let selection = Selection::new().with_data(predicate);
        assert_eq!(
            resolve(&store, &config, &selection),
            Candidates::Only(IdSet::from([1, 4]))
        );
        assert_eq!(store.query_count(), 1);
    }

    #[test]
    fn test_union_then_restrict() {
        let store = fixture();
        let data_predicate = email::ADDRESS
            .ends_with("@x.io")
            .or(data::ACCOUNT_NAME.equal_to("me@gmail.com"));

        // blanks excluded: contact 3 has no attribute rows
        let excluded = QueryConfig::default();
        let selection = Selection::new().with_data(data_predicate.clone());
        assert_eq!(
            resolve(&store, &excluded, &selection),
            Candidates::Only(IdSet::from([1, 2]))
        );

        let included = QueryConfig::default().with_include_blanks(true);
        assert_eq!(
            resolve(&store, &included, &selection),
            Candidates::Only(IdSet::from([1, 2, 3]))
        );

        let selection =
            selection.with_raw_contacts(raw_contacts::ACCOUNT_NAME.equal_to("me@gmail.com"));
        assert_eq!(
            resolve(&store, &included, &selection),
            Candidates::Only(IdSet::from([1, 3]))
        );
    }

    #[test]
    fn test_raw_contacts_predicate_replaces() {
        let store = fixture();
        let config = QueryConfig::default();
        let selection = Selection::new()
            .with_raw_contacts(raw_contacts::ACCOUNT_TYPE.equal_to("com.google"));
        assert_eq!(
            resolve(&store, &config, &selection),
            Candidates::Only(IdSet::from([1, 3]))
        );
    }

    #[test]
    fn test_search_intersects() {
        let store = fixture();
        let config = QueryConfig::default();
        let selection = Selection::new()
            .with_search("x.io")
            .with_data(email::ADDRESS.starts_with("bob"));
        assert_eq!(resolve(&store, &config, &selection), Candidates::Only(IdSet::from([2])));

        store.clear_journal();
        let selection = Selection::new().with_search("zzz").with_data(email::ADDRESS.is_not_null());
        assert!(resolve(&store, &config, &selection).is_empty());
        assert_eq!(store.query_count(), 0);
    }

    #[test]
    fn test_contacts_predicate_restricts() {
        let store = fixture();
        let config = QueryConfig::default();
        let selection = Selection::new()
            .with_data(email::ADDRESS.is_not_null())
            .with_contacts(contacts::DISPLAY_NAME_PRIMARY.equal_to("Ann"));
        assert_eq!(resolve(&store, &config, &selection), Candidates::Only(IdSet::from([1])));
    }

    #[test]
    fn test_id_restriction_chunks() {
        let ids: IdSet = (1..=5).collect();
        let predicate = id_restriction(&contacts::ID, &ids, 2).unwrap();
        assert_eq!(
            predicate.to_string(),
            "(_id IN (1, 2)) OR ((_id IN (3, 4)) OR (_id IN (5)))"
        );
        assert!(id_restriction(&contacts::ID, &IdSet::new(), 2).is_none());
    }

    #[test]
    fn test_chunked_restriction_matches_all() {
        let store = fixture();
        let config = QueryConfig::default().with_max_in_clause_ids(1);
        let selection = Selection::new()
            .with_data(email::ADDRESS.is_not_null())
            .with_raw_contacts(raw_contacts::ID.is_not_null());
        assert_eq!(
            resolve(&store, &config, &selection),
            Candidates::Only(IdSet::from([1, 2]))
        );
    }

    #[test]
    fn test_cancel_before_first_stage() {
        let store = fixture();
        let config = QueryConfig::default();
        let selection = Selection::new().with_data(email::ADDRESS.is_not_null());
        let result = IdResolver::new(&store, &config)
            .resolve(&selection, &|| true)
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(store.query_count(), 0);
    }

    #[test]
    fn test_cancel_mid_tree_yields_empty() {
        let store = fixture();
        let config = QueryConfig::default();
        let predicate = email::ADDRESS
            .starts_with("ann")
            .and(name::GIVEN_NAME.equal_to("Ann"))
            .or(phone::NUMBER.starts_with("555"));
        let selection = Selection::new().with_data(predicate);
        assert_eq!(
            resolve(&store, &config, &selection),
            Candidates::Only(IdSet::from([1, 4]))
        );

        for stop_at in 1..=12 {
            let polls = Cell::new(0);
            let cancel = || {
                polls.set(polls.get() + 1);
                polls.get() >= stop_at
            };
            let result = IdResolver::new(&store, &config)
                .resolve(&selection, &cancel)
                .unwrap();
            if polls.get() >= stop_at {
                assert!(result.is_empty(), "partial candidates at poll {}", stop_at);
            } else {
                assert_eq!(result, Candidates::Only(IdSet::from([1, 4])));
            }
        }
    }

    #[test]
    fn test_store_failure_propagates() {
        let store = fixture();
        store.set_available(false);
        let config = QueryConfig::default();
        let selection = Selection::new().with_data(email::ADDRESS.is_not_null());
        assert!(matches!(
            IdResolver::new(&store, &config).resolve(&selection, &never),
            Err(Error::Store(_))
        ));
    }
}
