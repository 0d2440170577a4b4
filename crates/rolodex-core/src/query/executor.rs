//! Query executor.
//!
//! Resolves candidate ids, reads the contacts page, then reads raw contacts
//! and attribute rows scoped to the contacts that survived pagination.

use rolodex_proto::fields::{contacts, data, raw_contacts};
use rolodex_proto::{
    ContactsField, DataField, Field, OrderSpec, Pagination, Predicate, RawContactsField, Relation,
};
use tracing::{debug, warn};

use super::include::{Include, Includes};
use super::mapper::{assemble, non_blank_contact_ids};
use super::pagination::{apply_pagination, checked};
use super::registry::KindRegistry;
use super::resolver::{id_restriction, Candidates, IdResolver, Selection};
use super::{read, CancelCheck};
use crate::config::QueryConfig;
use crate::entity::Contact;
use crate::error::Error;
use crate::store::{ContactsStore, IdSet, Row, SortClause, StoreQuery};

/// A contacts read: what to match, what to populate, and in which order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactsQuery {
    pub selection: Selection,
    pub includes: Includes,
    /// Contacts columns only. Defaults to ascending contact id.
    pub order: Vec<OrderSpec>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ContactsQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn where_data(mut self, predicate: impl Into<Option<Predicate<DataField>>>) -> Self {
        self.selection.data = predicate.into();
        self
    }

    pub fn where_raw_contacts(
        mut self,
        predicate: impl Into<Option<Predicate<RawContactsField>>>,
    ) -> Self {
        self.selection.raw_contacts = predicate.into();
        self
    }

    pub fn where_contacts(
        mut self,
        predicate: impl Into<Option<Predicate<ContactsField>>>,
    ) -> Self {
        self.selection.contacts = predicate.into();
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.selection.search = Some(text.into());
        self
    }

    pub fn include(mut self, include: Include<DataField>) -> Self {
        self.includes.data = include;
        self
    }

    pub fn include_raw_contacts(mut self, include: Include<RawContactsField>) -> Self {
        self.includes.raw_contacts = include;
        self
    }

    pub fn order_by(mut self, order: OrderSpec) -> Self {
        self.order.push(order);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    fn pagination(&self) -> Result<Option<Pagination>, Error> {
        match (self.limit, self.offset) {
            (None, None) => Ok(None),
            (limit, offset) => checked(limit.unwrap_or(i64::MAX), offset.unwrap_or(0)).map(Some),
        }
    }
}

/// Contacts of a read, and whether the store returned more than the limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub contacts: Vec<Contact>,
    /// The store ignored the limit. When offset and limit are forced the
    /// contacts were paginated in memory.
    pub limit_breached: bool,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

/// Runs [`ContactsQuery`]s against a store.
pub struct QueryExecutor<'a> {
    store: &'a dyn ContactsStore,
    registry: &'a KindRegistry,
    config: &'a QueryConfig,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(
        store: &'a dyn ContactsStore,
        registry: &'a KindRegistry,
        config: &'a QueryConfig,
    ) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    /// Execute a query. Limit and offset are validated before the store is
    /// touched.
    pub fn execute(
        &self,
        query: &ContactsQuery,
        cancel: CancelCheck<'_>,
    ) -> Result<QueryResult, Error> {
        let pagination = query.pagination()?;

        let mut candidates =
            IdResolver::new(self.store, self.config).resolve(&query.selection, cancel)?;
        if candidates.is_empty() || cancel() {
            return Ok(QueryResult::empty());
        }
        if !self.config.include_blanks {
            candidates = self.without_blanks(&query.includes.data, &candidates)?;
            if candidates.is_empty() || cancel() {
                return Ok(QueryResult::empty());
            }
        }

        let (contact_rows, limit_breached) = self.read_contacts(query, &candidates, pagination)?;
        if contact_rows.is_empty() || cancel() {
            return Ok(QueryResult {
                contacts: Vec::new(),
                limit_breached,
            });
        }

        let ids: IdSet = contact_rows
            .iter()
            .filter_map(|r| r.get_i64(contacts::ID.column()))
            .collect();
        let raw_contact_rows = self.read_children(
            Relation::RawContacts,
            &raw_contacts::CONTACT_ID,
            query.includes.raw_contacts.columns(),
            Some(&ids),
        )?;
        if cancel() {
            return Ok(QueryResult::empty());
        }
        let mut data_rows = self.read_children(
            Relation::Data,
            &data::CONTACT_ID,
            query.includes.data.columns(),
            Some(&ids),
        )?;
        data_rows.sort_by_key(|r| r.get_i64(data::ID.column()));

        debug!(
            contacts = contact_rows.len(),
            raw_contacts = raw_contact_rows.len(),
            data = data_rows.len(),
            "assembling"
        );
        let contacts = assemble(
            self.registry,
            &query.includes,
            self.config.include_blanks,
            contact_rows.into_iter().map(Ok),
            raw_contact_rows.into_iter().map(Ok),
            data_rows.into_iter().map(Ok),
            cancel,
        )?;

        Ok(QueryResult {
            contacts,
            limit_breached,
        })
    }

    /// Read the contacts page. Returns the rows and whether the store
    /// returned more rows than the limit.
    fn read_contacts(
        &self,
        query: &ContactsQuery,
        candidates: &Candidates,
        pagination: Option<Pagination>,
    ) -> Result<(Vec<Row>, bool), Error> {
        let mut order = query.order.clone();
        if !order.iter().any(|spec| spec.field == contacts::ID) {
            order.push(OrderSpec::asc(contacts::ID));
        }
        let selection = candidates
            .ids()
            .and_then(|ids| id_restriction(&contacts::ID, ids, self.config.max_in_clause_ids))
            .map(Predicate::into_expr);
        let store_query = StoreQuery::new(Relation::Contacts)
            .with_columns(query.includes.contacts().columns())
            .with_selection(selection)
            .with_sort(SortClause::new(order, pagination));

        let mut rows = read(self.store, &store_query, self.config.mask_char)?;

        let mut limit_breached = false;
        if let Some(pagination) = &pagination {
            if rows.len() > pagination.limit {
                limit_breached = true;
                warn!(
                    returned = rows.len(),
                    limit = pagination.limit,
                    forced = self.config.force_offset_and_limit,
                    "store ignored the limit"
                );
                if self.config.force_offset_and_limit {
                    apply_pagination(&mut rows, pagination);
                }
            }
        }
        debug!(stage = "contacts_page", rows = rows.len(), "read contacts");
        Ok((rows, limit_breached))
    }

    /// Narrow the candidates to contacts that assemble with at least one
    /// non-blank raw contact, so blank contacts never take a page slot.
    fn without_blanks(
        &self,
        include: &Include<DataField>,
        candidates: &Candidates,
    ) -> Result<Candidates, Error> {
        let rows = self.read_children(
            Relation::Data,
            &data::CONTACT_ID,
            include.columns(),
            candidates.ids(),
        )?;
        let ids = non_blank_contact_ids(self.registry, include, &rows);
        debug!(stage = "non_blank", ids = ids.len(), "resolved candidates");
        Ok(Candidates::Only(ids))
    }

    /// Rows of `relation` belonging to the given contacts, or to every
    /// contact when `ids` is `None`.
    fn read_children<F: Field>(
        &self,
        relation: Relation,
        contact_id: &F,
        columns: Vec<&'static str>,
        ids: Option<&IdSet>,
    ) -> Result<Vec<Row>, Error> {
        let selection = ids
            .and_then(|ids| id_restriction(contact_id, ids, self.config.max_in_clause_ids))
            .map(Predicate::into_expr);
        let store_query = StoreQuery::new(relation)
            .with_columns(columns)
            .with_selection(selection);
        read(self.store, &store_query, self.config.mask_char)
    }
}
