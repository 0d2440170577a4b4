//! Contacts and raw contacts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rolodex_proto::Kind;

use super::custom::CustomEntity;
use super::data::{
    Address, Email, Event, GroupMembership, Im, Name, Nickname, Note, Organization, Phone,
    Relation, SipAddress, Website,
};
use super::DataEntity;

/// Account a raw contact is synced with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Account {
    pub name: String,
    pub account_type: String,
}

impl Account {
    pub fn new(name: impl Into<String>, account_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            account_type: account_type.into(),
        }
    }
}

/// An aggregate contact.
///
/// Everything except `raw_contacts` is derived by the store and read only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contact {
    pub id: i64,
    pub lookup_key: Option<String>,
    pub display_name_primary: Option<String>,
    pub display_name_alt: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub photo_uri: Option<String>,
    pub photo_thumbnail_uri: Option<String>,
    pub has_phone_number: Option<bool>,
    pub starred: Option<bool>,
    /// Ordered by ascending raw contact id.
    pub raw_contacts: Vec<RawContact>,
    pub is_redacted: bool,
}

impl Contact {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// A contact is blank when all of its raw contacts are.
    pub fn is_blank(&self) -> bool {
        self.raw_contacts.iter().all(RawContact::is_blank)
    }

    pub fn raw_contact(&self, id: i64) -> Option<&RawContact> {
        self.raw_contacts.iter().find(|r| r.id == id)
    }

    /// Phones of every raw contact.
    pub fn phones(&self) -> impl Iterator<Item = &Phone> {
        self.raw_contacts.iter().flat_map(|r| r.phones.iter())
    }

    /// Emails of every raw contact.
    pub fn emails(&self) -> impl Iterator<Item = &Email> {
        self.raw_contacts.iter().flat_map(|r| r.emails.iter())
    }
}

/// An account-scoped constituent of a contact.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawContact {
    pub id: i64,
    pub contact_id: i64,
    pub display_name_primary: Option<String>,
    pub display_name_alt: Option<String>,
    pub account: Option<Account>,

    pub addresses: Vec<Address>,
    pub emails: Vec<Email>,
    pub events: Vec<Event>,
    pub group_memberships: Vec<GroupMembership>,
    pub ims: Vec<Im>,
    pub name: Option<Name>,
    pub nickname: Option<Nickname>,
    pub note: Option<Note>,
    pub organization: Option<Organization>,
    pub phones: Vec<Phone>,
    pub relations: Vec<Relation>,
    pub sip_address: Option<SipAddress>,
    pub websites: Vec<Website>,
    pub custom_data: BTreeMap<Kind, Vec<Box<dyn CustomEntity>>>,

    pub is_redacted: bool,
}

impl RawContact {
    pub fn new(id: i64, contact_id: i64) -> Self {
        Self {
            id,
            contact_id,
            ..Default::default()
        }
    }

    /// True when every attribute is absent or blank.
    pub fn is_blank(&self) -> bool {
        fn all_blank<T: DataEntity>(items: &[T]) -> bool {
            items.iter().all(DataEntity::is_blank)
        }
        fn opt_blank<T: DataEntity>(item: &Option<T>) -> bool {
            item.as_ref().map_or(true, DataEntity::is_blank)
        }

        all_blank(&self.addresses)
            && all_blank(&self.emails)
            && all_blank(&self.events)
            && all_blank(&self.group_memberships)
            && all_blank(&self.ims)
            && opt_blank(&self.name)
            && opt_blank(&self.nickname)
            && opt_blank(&self.note)
            && opt_blank(&self.organization)
            && all_blank(&self.phones)
            && all_blank(&self.relations)
            && opt_blank(&self.sip_address)
            && all_blank(&self.websites)
            && self.custom_data.values().flatten().all(|e| e.is_blank())
    }

    /// Custom values of `kind`, in row order.
    pub fn custom(&self, kind: &Kind) -> &[Box<dyn CustomEntity>] {
        self.custom_data.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_raw_contact_is_blank() {
        assert!(RawContact::new(1, 1).is_blank());
    }

    #[test]
    fn test_raw_contact_with_blank_attributes_is_blank() {
        let mut raw = RawContact::new(1, 1);
        raw.phones.push(Phone::default());
        raw.name = Some(Name::default());
        assert!(raw.is_blank());

        raw.note = Some(Note {
            note: Some("hi".into()),
            ..Default::default()
        });
        assert!(!raw.is_blank());
    }

    #[test]
    fn test_contact_blank_and_lookup() {
        let mut contact = Contact::new(9);
        assert!(contact.is_blank());
        let mut raw = RawContact::new(3, 9);
        raw.emails.push(Email {
            address: Some("a@b.c".into()),
            ..Default::default()
        });
        contact.raw_contacts.push(raw);
        assert!(!contact.is_blank());
        assert_eq!(contact.emails().count(), 1);
        assert!(contact.raw_contact(3).is_some());
        assert!(contact.raw_contacts[0].custom(&Kind::custom("x")).is_empty());
    }
}
