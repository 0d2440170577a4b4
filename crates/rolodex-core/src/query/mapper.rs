//! Row to entity assembly.
//!
//! Rows arrive relation by relation: contacts first, then raw contacts, then
//! attribute rows. Contacts keep the order they arrive in; raw contacts are
//! attached in ascending id order; attribute rows are folded in arrival
//! order through the [`KindRegistry`].

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rolodex_proto::fields::{contacts, raw_contacts};
use rolodex_proto::{ContactsField, DataField, Field, RawContactsField};
use tracing::debug;

use super::include::{Include, Includes};
use super::registry::{DataRow, Fold, KindRegistry};
use super::CancelCheck;
use crate::entity::{Account, Contact, RawContact};
use crate::error::Error;
use crate::store::{IdSet, Row};

/// Accumulates rows into contacts.
pub struct ContactsMapper<'a> {
    registry: &'a KindRegistry,
    includes: &'a Includes,
    contacts_include: Include<ContactsField>,
    include_blanks: bool,
    contacts: Vec<Contact>,
    positions: HashMap<i64, usize>,
    raw_contacts: BTreeMap<i64, RawContact>,
}

impl<'a> ContactsMapper<'a> {
    pub fn new(registry: &'a KindRegistry, includes: &'a Includes, include_blanks: bool) -> Self {
        Self {
            registry,
            includes,
            contacts_include: includes.contacts(),
            include_blanks,
            contacts: Vec::new(),
            positions: HashMap::new(),
            raw_contacts: BTreeMap::new(),
        }
    }

    pub fn process_contact(&mut self, row: &Row) -> Result<(), Error> {
        let id = row
            .get_i64(contacts::ID.column())
            .ok_or_else(|| Error::Store("contact row without _id".into()))?;
        if self.positions.contains_key(&id) {
            return Ok(());
        }

        let include = &self.contacts_include;
        let text = |field: &ContactsField| -> Option<String> {
            if include.contains(field) {
                row.get_str(field.column()).map(str::to_string)
            } else {
                None
            }
        };
        let flag = |field: &ContactsField| -> Option<bool> {
            if include.contains(field) {
                row.get_bool(field.column())
            } else {
                None
            }
        };
        let last_updated = if include.contains(&contacts::LAST_UPDATED_TIMESTAMP) {
            row.get_i64(contacts::LAST_UPDATED_TIMESTAMP.column())
                .and_then(DateTime::<Utc>::from_timestamp_millis)
        } else {
            None
        };

        let contact = Contact {
            id,
            lookup_key: text(&contacts::LOOKUP_KEY),
            display_name_primary: text(&contacts::DISPLAY_NAME_PRIMARY),
            display_name_alt: text(&contacts::DISPLAY_NAME_ALT),
            last_updated,
            photo_uri: text(&contacts::PHOTO_URI),
            photo_thumbnail_uri: text(&contacts::PHOTO_THUMBNAIL_URI),
            has_phone_number: flag(&contacts::HAS_PHONE_NUMBER),
            starred: flag(&contacts::STARRED),
            ..Contact::new(id)
        };
        self.positions.insert(id, self.contacts.len());
        self.contacts.push(contact);
        Ok(())
    }

    pub fn process_raw_contact(&mut self, row: &Row) -> Result<(), Error> {
        let id = row
            .get_i64(raw_contacts::ID.column())
            .ok_or_else(|| Error::Store("raw contact row without _id".into()))?;
        let Some(contact_id) = row.get_i64(raw_contacts::CONTACT_ID.column()) else {
            return Ok(());
        };
        if !self.positions.contains_key(&contact_id) {
            return Ok(());
        }

        let include = &self.includes.raw_contacts;
        let text = |field: &RawContactsField| -> Option<String> {
            if include.contains(field) {
                row.get_str(field.column()).map(str::to_string)
            } else {
                None
            }
        };
        let account = match (
            text(&raw_contacts::ACCOUNT_NAME),
            text(&raw_contacts::ACCOUNT_TYPE),
        ) {
            (Some(name), Some(account_type)) => Some(Account::new(name, account_type)),
            _ => None,
        };

        let raw = RawContact {
            display_name_primary: text(&raw_contacts::DISPLAY_NAME_PRIMARY),
            display_name_alt: text(&raw_contacts::DISPLAY_NAME_ALT),
            account,
            ..RawContact::new(id, contact_id)
        };
        self.raw_contacts.entry(id).or_insert(raw);
        Ok(())
    }

    pub fn process_data(&mut self, row: &Row) {
        let Some(view) = DataRow::new(row, &self.includes.data) else {
            debug!("skipping attribute row without kind");
            return;
        };
        let Some(raw) = view
            .raw_contact_id()
            .and_then(|id| self.raw_contacts.get_mut(&id))
        else {
            return;
        };
        if self.registry.fold(raw, &view) == Fold::Unknown {
            debug!(kind = %view.kind(), id = ?view.id(), "skipping attribute row of unknown kind");
        }
    }

    /// Attach raw contacts to their contacts. Without blanks, blank raw
    /// contacts are dropped, and so are contacts left with none.
    pub fn finish(self) -> Vec<Contact> {
        let mut contacts = self.contacts;
        for raw in self.raw_contacts.into_values() {
            if !self.include_blanks && raw.is_blank() {
                continue;
            }
            if let Some(&position) = self.positions.get(&raw.contact_id) {
                contacts[position].raw_contacts.push(raw);
            }
        }
        if !self.include_blanks {
            contacts.retain(|c| !c.raw_contacts.is_empty());
        }
        contacts
    }
}

/// Contacts owning at least one raw contact that folds into a non-blank
/// raw contact from `data_rows`, under the same inclusion set the
/// assembly uses.
pub(crate) fn non_blank_contact_ids(
    registry: &KindRegistry,
    include: &Include<DataField>,
    data_rows: &[Row],
) -> IdSet {
    let mut raws: BTreeMap<i64, RawContact> = BTreeMap::new();
    for row in data_rows {
        let Some(view) = DataRow::new(row, include) else {
            continue;
        };
        let (Some(raw_id), Some(contact_id)) = (view.raw_contact_id(), view.contact_id()) else {
            continue;
        };
        let raw = raws
            .entry(raw_id)
            .or_insert_with(|| RawContact::new(raw_id, contact_id));
        registry.fold(raw, &view);
    }
    raws
        .into_values()
        .filter(|raw| !raw.is_blank())
        .map(|raw| raw.contact_id)
        .collect()
}

/// Assemble contacts from the rows of the three relations.
///
/// Cancellation between rows yields no contacts at all, never a partially
/// assembled one.
pub fn assemble(
    registry: &KindRegistry,
    includes: &Includes,
    include_blanks: bool,
    contact_rows: impl IntoIterator<Item = Result<Row, Error>>,
    raw_contact_rows: impl IntoIterator<Item = Result<Row, Error>>,
    data_rows: impl IntoIterator<Item = Result<Row, Error>>,
    cancel: CancelCheck<'_>,
) -> Result<Vec<Contact>, Error> {
    let mut mapper = ContactsMapper::new(registry, includes, include_blanks);

    for row in contact_rows {
        if cancel() {
            debug!(stage = "contacts", "assembly cancelled");
            return Ok(Vec::new());
        }
        mapper.process_contact(&row?)?;
    }
    for row in raw_contact_rows {
        if cancel() {
            debug!(stage = "raw_contacts", "assembly cancelled");
            return Ok(Vec::new());
        }
        mapper.process_raw_contact(&row?)?;
    }
    for row in data_rows {
        if cancel() {
            debug!(stage = "data", "assembly cancelled");
            return Ok(Vec::new());
        }
        mapper.process_data(&row?);
    }
    Ok(mapper.finish())
}
