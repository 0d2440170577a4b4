//! In-memory contacts store.
//!
//! Keeps the three relations as row maps behind a lock and emulates the
//! parts of a real contacts provider the engine relies on: the attribute
//! view joins contact and raw contact columns, contact display names and
//! flags are derived from attribute rows, and removing the last raw contact
//! of a contact removes the contact.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};

use parking_lot::{Mutex, RwLock};
use rolodex_proto::fields::{
    self, contacts, data, email, name, nickname, organization, phone, photo,
};
use rolodex_proto::{Field, Kind, OrderDirection, OrderSpec, Relation, Slot, Value};
use tracing::{trace, warn};

use super::filter::RowFilter;
use super::{BatchOperation, BatchOutcome, ContactsStore, IdSet, Row, RowStream, StoreQuery};
use crate::entity::Account;
use crate::error::Error;
use crate::query::pagination::apply_pagination;

/// Base of the synthetic modification clock, in milliseconds since the epoch.
const CLOCK_BASE_MS: i64 = 1_700_000_000_000;

#[derive(Debug, Clone, Default)]
struct Tables {
    contacts: BTreeMap<i64, Row>,
    raw_contacts: BTreeMap<i64, Row>,
    data: BTreeMap<i64, Row>,
    last_contact_id: i64,
    last_raw_contact_id: i64,
    last_data_id: i64,
    clock: i64,
}

/// Reference [`ContactsStore`] backed by memory.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    honour_pagination: bool,
    available: AtomicBool,
    queries: AtomicUsize,
    journal: Mutex<Vec<String>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            honour_pagination: true,
            available: AtomicBool::new(true),
            queries: AtomicUsize::new(0),
            journal: Mutex::new(Vec::new()),
        }
    }

    /// Ignore `LIMIT`/`OFFSET`, like some providers do.
    pub fn ignoring_pagination(mut self) -> Self {
        self.honour_pagination = false;
        self
    }

    /// Make every read and write fail until re-enabled.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, AtomicOrdering::SeqCst);
    }

    /// Number of queries served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(AtomicOrdering::SeqCst)
    }

    /// `relation: predicate text | sort text` of every query served so far.
    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().clone()
    }

    pub fn clear_journal(&self) {
        self.journal.lock().clear();
        self.queries.store(0, AtomicOrdering::SeqCst);
    }

    pub fn contact_count(&self) -> usize {
        self.tables.read().contacts.len()
    }

    /// Insert a raw contact aggregated into a new contact. Returns the raw
    /// contact id.
    pub fn insert_raw_contact(&self, account: Option<&Account>) -> i64 {
        let mut tables = self.tables.write();
        let contact_id = tables.new_contact();
        tables.new_raw_contact(contact_id, account)
    }

    /// Insert a raw contact aggregated into an existing contact.
    pub fn insert_raw_contact_into(
        &self,
        contact_id: i64,
        account: Option<&Account>,
    ) -> Result<i64, Error> {
        let mut tables = self.tables.write();
        if !tables.contacts.contains_key(&contact_id) {
            return Err(Error::Store(format!("no contact {}", contact_id)));
        }
        Ok(tables.new_raw_contact(contact_id, account))
    }

    /// Insert an attribute row of `kind` for a raw contact.
    pub fn insert_data(
        &self,
        raw_contact_id: i64,
        kind: &Kind,
        values: &[(Slot, Value)],
    ) -> Result<i64, Error> {
        let mut row = Row::new()
            .with(data::RAW_CONTACT_ID.column(), raw_contact_id)
            .with(data::MIMETYPE.column(), kind.tag());
        for (slot, value) in values {
            row.set(slot.column(), value.clone());
        }
        self.tables.write().insert_data(&row)
    }

    /// Mark an attribute row primary within its raw contact, and optionally
    /// within its contact. Other rows of the same kind lose the flags.
    pub fn set_primary(&self, data_id: i64, super_primary: bool) -> Result<(), Error> {
        let mut tables = self.tables.write();
        let row = tables
            .data
            .get(&data_id)
            .ok_or_else(|| Error::Store(format!("no data row {}", data_id)))?;
        let raw_id = row.get_i64(data::RAW_CONTACT_ID.column());
        let kind = row.get(data::MIMETYPE.column()).clone();
        let contact_id = raw_id.and_then(|id| tables.contact_of(id));

        let ids: Vec<i64> = tables.data.keys().copied().collect();
        for id in ids {
            let view = tables.data_view(&tables.data[&id]);
            let same_kind = view.get(data::MIMETYPE.column()) == &kind;
            let same_raw = view.get_i64(data::RAW_CONTACT_ID.column()) == raw_id;
            let same_contact = view.get_i64(data::CONTACT_ID.column()) == contact_id;
            if let Some(row) = tables.data.get_mut(&id) {
                if id == data_id {
                    row.set(data::IS_PRIMARY.column(), true);
                    row.set(data::IS_SUPER_PRIMARY.column(), super_primary);
                } else if same_kind && same_raw {
                    row.set(data::IS_PRIMARY.column(), false);
                    row.set(data::IS_SUPER_PRIMARY.column(), false);
                } else if same_kind && same_contact && super_primary {
                    row.set(data::IS_SUPER_PRIMARY.column(), false);
                }
            }
        }
        Ok(())
    }

    pub fn set_starred(&self, contact_id: i64, starred: bool) -> Result<(), Error> {
        let mut tables = self.tables.write();
        let row = tables
            .contacts
            .get_mut(&contact_id)
            .ok_or_else(|| Error::Store(format!("no contact {}", contact_id)))?;
        row.set(contacts::STARRED.column(), starred);
        Ok(())
    }

    fn check_available(&self) -> Result<(), Error> {
        if self.available.load(AtomicOrdering::SeqCst) {
            Ok(())
        } else {
            Err(Error::Store("store unavailable".into()))
        }
    }
}

impl ContactsStore for MemoryStore {
    fn query(&self, query: &StoreQuery) -> Result<RowStream<'_>, Error> {
        self.check_available()?;
        self.queries.fetch_add(1, AtomicOrdering::SeqCst);
        self.journal.lock().push(format!(
            "{}: {} | {}",
            query.relation,
            query.selection_text(),
            query.sort
        ));

        let tables = self.tables.read();
        let candidates: Vec<Row> = match query.relation {
            Relation::Contacts => tables.contacts.values().cloned().collect(),
            Relation::RawContacts => tables.raw_contacts.values().cloned().collect(),
            Relation::Data => tables.data.values().map(|r| tables.data_view(r)).collect(),
        };
        drop(tables);

        let mut rows = Vec::with_capacity(candidates.len());
        for row in candidates {
            let keep = match &query.selection {
                Some(expr) => RowFilter::evaluate(expr, &row)?,
                None => true,
            };
            if keep {
                rows.push(row);
            }
        }

        sort_rows(&mut rows, &query.sort.order);
        if self.honour_pagination {
            if let Some(pagination) = &query.sort.pagination {
                apply_pagination(&mut rows, pagination);
            }
        }

        trace!(relation = %query.relation, rows = rows.len(), "memory store query");
        let columns = query.columns.clone();
        Ok(Box::new(rows.into_iter().map(move |r| Ok(r.project(&columns)))))
    }

    fn search_contact_ids(&self, text: &str) -> Result<IdSet, Error> {
        self.check_available()?;
        let needle = text.trim().to_lowercase();
        let tables = self.tables.read();
        if needle.is_empty() {
            return Ok(tables.contacts.keys().copied().collect());
        }
        let matches = |value: &Value| {
            value
                .as_str()
                .is_some_and(|s| s.to_lowercase().contains(&needle))
        };

        let mut ids = IdSet::new();
        for row in tables.contacts.values() {
            if matches(row.get(contacts::DISPLAY_NAME_PRIMARY.column())) {
                ids.extend(row.get_i64(contacts::ID.column()));
            }
        }
        for row in tables.data.values() {
            let kind = match row.get_str(data::MIMETYPE.column()) {
                Some(tag) => Kind::from_tag(tag),
                None => continue,
            };
            let hit = fields::for_matching_of_kind(&kind)
                .iter()
                .any(|f| matches(row.get(f.column())));
            if hit {
                let raw_id = row.get_i64(data::RAW_CONTACT_ID.column());
                ids.extend(raw_id.and_then(|id| tables.contact_of(id)));
            }
        }
        Ok(ids)
    }

    fn apply_batch(&self, operations: Vec<BatchOperation>) -> Option<Vec<BatchOutcome>> {
        if self.check_available().is_err() {
            return None;
        }
        let mut tables = self.tables.write();
        let mut working = tables.clone();
        let mut outcomes = Vec::with_capacity(operations.len());
        for operation in &operations {
            match working.apply(operation) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!(error = %e, operations = operations.len(), "batch rejected");
                    return None;
                }
            }
        }
        *tables = working;
        Some(outcomes)
    }
}

/// Sort rows by the order specs, NULLs first.
fn sort_rows(rows: &mut [Row], order: &[OrderSpec]) {
    if order.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for spec in order {
            let column = spec.field.column();
            let cmp = compare_for_sort(a.get(column), b.get(column), spec.ignore_case);
            let cmp = match spec.direction {
                OrderDirection::Asc => cmp,
                OrderDirection::Desc => cmp.reverse(),
            };
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    });
}

fn compare_for_sort(a: &Value, b: &Value, ignore_case: bool) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::String(a), Value::String(b)) if ignore_case => {
            a.to_lowercase().cmp(&b.to_lowercase())
        }
        _ => RowFilter::ordering(a, b).unwrap_or(Ordering::Equal),
    }
}

impl Tables {
    fn tick(&mut self) -> i64 {
        self.clock += 1;
        CLOCK_BASE_MS + self.clock * 1000
    }

    fn contact_of(&self, raw_contact_id: i64) -> Option<i64> {
        self.raw_contacts
            .get(&raw_contact_id)
            .and_then(|r| r.get_i64("contact_id"))
    }

    fn new_contact(&mut self) -> i64 {
        self.last_contact_id += 1;
        let id = self.last_contact_id;
        let row = Row::new()
            .with(contacts::ID.column(), id)
            .with(contacts::LOOKUP_KEY.column(), format!("lk{}", id))
            .with(contacts::STARRED.column(), false);
        self.contacts.insert(id, row);
        id
    }

    fn new_raw_contact(&mut self, contact_id: i64, account: Option<&Account>) -> i64 {
        self.last_raw_contact_id += 1;
        let id = self.last_raw_contact_id;
        let row = Row::new()
            .with("_id", id)
            .with("contact_id", contact_id)
            .with("account_name", account.map(|a| a.name.clone()))
            .with("account_type", account.map(|a| a.account_type.clone()));
        self.raw_contacts.insert(id, row);
        self.refresh_contact(contact_id);
        id
    }

    fn insert_data(&mut self, values: &Row) -> Result<i64, Error> {
        let raw_id = values
            .get_i64(data::RAW_CONTACT_ID.column())
            .ok_or_else(|| Error::Store("attribute row without raw_contact_id".into()))?;
        if !self.raw_contacts.contains_key(&raw_id) {
            return Err(Error::Store(format!("no raw contact {}", raw_id)));
        }
        if values.get_str(data::MIMETYPE.column()).is_none() {
            return Err(Error::Store("attribute row without mimetype".into()));
        }
        self.last_data_id += 1;
        let id = self.last_data_id;
        let mut row = Row::new()
            .with(data::ID.column(), id)
            .with(data::IS_PRIMARY.column(), false)
            .with(data::IS_SUPER_PRIMARY.column(), false);
        row.merge(values);
        row.set(data::ID.column(), id);
        self.data.insert(id, row);
        self.refresh_raw_contact(raw_id);
        Ok(id)
    }

    /// An attribute row joined with its raw contact and contact columns.
    fn data_view(&self, row: &Row) -> Row {
        let mut view = row.clone();
        let raw = row
            .get_i64(data::RAW_CONTACT_ID.column())
            .and_then(|id| self.raw_contacts.get(&id));
        let contact_id = raw.and_then(|r| r.get_i64("contact_id"));
        view.set(data::CONTACT_ID.column(), contact_id);
        if let Some(raw) = raw {
            for column in ["account_name", "account_type"] {
                view.set(column, raw.get(column).clone());
            }
        }
        if let Some(contact) = contact_id.and_then(|id| self.contacts.get(&id)) {
            for field in fields::contacts_columns() {
                if field.column() != data::CONTACT_ID.column() {
                    view.set(field.column(), contact.get(field.column()).clone());
                }
            }
        }
        view
    }

    fn rows_matching(
        &self,
        relation: Relation,
        selection: &rolodex_proto::Expr,
    ) -> Result<Vec<i64>, Error> {
        let mut ids = Vec::new();
        let table = match relation {
            Relation::Contacts => &self.contacts,
            Relation::RawContacts => &self.raw_contacts,
            Relation::Data => &self.data,
        };
        for (id, row) in table {
            let row = match relation {
                Relation::Data => self.data_view(row),
                _ => row.clone(),
            };
            if RowFilter::evaluate(selection, &row)? {
                ids.push(*id);
            }
        }
        Ok(ids)
    }

    fn apply(&mut self, operation: &BatchOperation) -> Result<BatchOutcome, Error> {
        match operation {
            BatchOperation::Insert { relation, values } => {
                let id = match relation {
                    Relation::Data => self.insert_data(values)?,
                    Relation::RawContacts => {
                        let contact_id = match values.get_i64("contact_id") {
                            Some(id) if self.contacts.contains_key(&id) => id,
                            Some(id) => return Err(Error::Store(format!("no contact {}", id))),
                            None => self.new_contact(),
                        };
                        let account = match (
                            values.get_str("account_name"),
                            values.get_str("account_type"),
                        ) {
                            (Some(n), Some(t)) => Some(Account::new(n, t)),
                            _ => None,
                        };
                        self.new_raw_contact(contact_id, account.as_ref())
                    }
                    Relation::Contacts => {
                        return Err(Error::Store("contacts are created by aggregation only".into()))
                    }
                };
                Ok(BatchOutcome {
                    affected: 1,
                    inserted_id: Some(id),
                })
            }
            BatchOperation::Update {
                relation,
                selection,
                values,
            } => {
                let ids = self.rows_matching(*relation, selection)?;
                for id in &ids {
                    let row = match relation {
                        Relation::Contacts => self.contacts.get_mut(id),
                        Relation::RawContacts => self.raw_contacts.get_mut(id),
                        Relation::Data => self.data.get_mut(id),
                    };
                    if let Some(row) = row {
                        for (column, value) in values.iter() {
                            if column == "_id" {
                                return Err(Error::Store("identifiers are immutable".into()));
                            }
                            row.set(column, value.clone());
                        }
                    }
                }
                if *relation == Relation::Data {
                    let raws: Vec<i64> = ids
                        .iter()
                        .filter_map(|id| self.data.get(id))
                        .filter_map(|r| r.get_i64(data::RAW_CONTACT_ID.column()))
                        .collect();
                    for raw in raws {
                        self.refresh_raw_contact(raw);
                    }
                }
                Ok(BatchOutcome {
                    affected: ids.len(),
                    inserted_id: None,
                })
            }
            BatchOperation::Delete {
                relation,
                selection,
            } => {
                let ids = self.rows_matching(*relation, selection)?;
                match relation {
                    Relation::Data => {
                        let mut raws = Vec::new();
                        for id in &ids {
                            if let Some(row) = self.data.remove(id) {
                                raws.extend(row.get_i64(data::RAW_CONTACT_ID.column()));
                            }
                        }
                        for raw in raws {
                            self.refresh_raw_contact(raw);
                        }
                    }
                    Relation::RawContacts => {
                        for id in &ids {
                            self.raw_contacts.remove(id);
                        }
                        self.remove_orphans();
                    }
                    Relation::Contacts => {
                        for id in &ids {
                            self.contacts.remove(id);
                        }
                        self.raw_contacts.retain(|_, r| {
                            r.get_i64("contact_id").is_some_and(|c| !ids.contains(&c))
                        });
                        self.remove_orphans();
                    }
                }
                Ok(BatchOutcome {
                    affected: ids.len(),
                    inserted_id: None,
                })
            }
        }
    }

    /// Drop attribute rows without a raw contact and contacts without raw
    /// contacts, then refresh what is left.
    fn remove_orphans(&mut self) {
        let raws = &self.raw_contacts;
        self.data.retain(|_, r| {
            r.get_i64(data::RAW_CONTACT_ID.column())
                .is_some_and(|id| raws.contains_key(&id))
        });
        let live: IdSet = raws.values().filter_map(|r| r.get_i64("contact_id")).collect();
        self.contacts.retain(|id, _| live.contains(id));
        for id in live {
            self.refresh_contact(id);
        }
    }

    fn data_of(&self, raw_contact_id: i64) -> Vec<&Row> {
        self.data
            .values()
            .filter(|r| r.get_i64(data::RAW_CONTACT_ID.column()) == Some(raw_contact_id))
            .collect()
    }

    /// Recompute a raw contact's display names from its attribute rows.
    fn refresh_raw_contact(&mut self, raw_contact_id: i64) {
        let rows = self.data_of(raw_contact_id);
        let slot = |kind: Kind, field: &rolodex_proto::DataField| -> Option<String> {
            rows.iter()
                .find(|r| r.get_str(data::MIMETYPE.column()) == Some(kind.tag()))
                .and_then(|r| r.get_str(field.column()))
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        };
        let given = slot(Kind::Name, &name::GIVEN_NAME);
        let family = slot(Kind::Name, &name::FAMILY_NAME);
        let structured = match (&given, &family) {
            (Some(g), Some(f)) => Some(format!("{} {}", g, f)),
            (Some(n), None) | (None, Some(n)) => Some(n.clone()),
            (None, None) => None,
        };
        let primary = slot(Kind::Name, &name::DISPLAY_NAME)
            .or(structured)
            .or_else(|| slot(Kind::Nickname, &nickname::NAME))
            .or_else(|| slot(Kind::Organization, &organization::COMPANY))
            .or_else(|| slot(Kind::Email, &email::ADDRESS))
            .or_else(|| slot(Kind::Phone, &phone::NUMBER));
        let alt = match (given, family) {
            (Some(g), Some(f)) => Some(format!("{}, {}", f, g)),
            _ => primary.clone(),
        };

        let contact_id = self.contact_of(raw_contact_id);
        if let Some(raw) = self.raw_contacts.get_mut(&raw_contact_id) {
            raw.set("display_name", primary);
            raw.set("display_name_alt", alt);
        }
        if let Some(contact_id) = contact_id {
            self.refresh_contact(contact_id);
        }
    }

    /// Recompute a contact's derived columns from its raw contacts.
    fn refresh_contact(&mut self, contact_id: i64) {
        let raws: Vec<i64> = self
            .raw_contacts
            .iter()
            .filter(|(_, r)| r.get_i64("contact_id") == Some(contact_id))
            .map(|(id, _)| *id)
            .collect();
        let first_named = raws
            .iter()
            .filter_map(|id| self.raw_contacts.get(id))
            .find(|r| r.get_str("display_name").is_some());
        let display_name = first_named.map(|r| r.get("display_name").clone());
        let display_name_alt = first_named.map(|r| r.get("display_name_alt").clone());

        let rows: Vec<&Row> = raws.iter().flat_map(|id| self.data_of(*id)).collect();
        let has_kind = |kind: Kind, slot: &str| {
            rows.iter().any(|r| {
                r.get_str(data::MIMETYPE.column()) == Some(kind.tag()) && !r.get(slot).is_blank()
            })
        };
        let has_phone = has_kind(Kind::Phone, phone::NUMBER.column());
        let has_photo = has_kind(Kind::Photo, photo::THUMBNAIL.column());

        let now = self.tick();
        if let Some(contact) = self.contacts.get_mut(&contact_id) {
            contact.set(
                contacts::DISPLAY_NAME_PRIMARY.column(),
                display_name.unwrap_or(Value::Null),
            );
            contact.set(
                contacts::DISPLAY_NAME_ALT.column(),
                display_name_alt.unwrap_or(Value::Null),
            );
            contact.set(contacts::HAS_PHONE_NUMBER.column(), has_phone);
            contact.set(contacts::LAST_UPDATED_TIMESTAMP.column(), now);
            let (uri, thumb) = if has_photo {
                (
                    Some(format!("content://rolodex/contacts/{}/photo", contact_id)),
                    Some(format!("content://rolodex/contacts/{}/photo/thumb", contact_id)),
                )
            } else {
                (None, None)
            };
            contact.set(contacts::PHOTO_URI.column(), uri);
            contact.set(contacts::PHOTO_THUMBNAIL_URI.column(), thumb);
        }
    }
}
