//! Typed result graph: contacts own raw contacts, raw contacts own typed
//! attributes.
//!
//! Entities are plain values created fresh by every read. A persisted
//! attribute carries its row identifiers in [`Lifecycle::Persisted`]; an
//! attribute built by the caller for insertion is [`Lifecycle::New`].

mod contact;
mod custom;
mod data;

pub use contact::{Account, Contact, RawContact};
pub use custom::CustomEntity;
pub use data::{
    Address, Email, Event, GroupMembership, Im, Name, Nickname, Note, Organization, Phone,
    Relation, SipAddress, Website,
};

/// Whether an attribute exists in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    /// Built in memory, not yet inserted.
    #[default]
    New,
    /// Read from the store.
    Persisted {
        id: i64,
        raw_contact_id: i64,
        contact_id: i64,
    },
}

impl Lifecycle {
    pub fn id(&self) -> Option<i64> {
        match self {
            Lifecycle::New => None,
            Lifecycle::Persisted { id, .. } => Some(*id),
        }
    }

    pub fn raw_contact_id(&self) -> Option<i64> {
        match self {
            Lifecycle::New => None,
            Lifecycle::Persisted { raw_contact_id, .. } => Some(*raw_contact_id),
        }
    }

    pub fn contact_id(&self) -> Option<i64> {
        match self {
            Lifecycle::New => None,
            Lifecycle::Persisted { contact_id, .. } => Some(*contact_id),
        }
    }
}

/// Row-level state shared by every attribute kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataInfo {
    pub lifecycle: Lifecycle,
    /// Primary within its raw contact.
    pub is_primary: bool,
    /// Primary within the whole contact. Implies `is_primary`.
    pub is_super_primary: bool,
    pub is_redacted: bool,
}

impl DataInfo {
    pub fn persisted(id: i64, raw_contact_id: i64, contact_id: i64) -> Self {
        Self {
            lifecycle: Lifecycle::Persisted {
                id,
                raw_contact_id,
                contact_id,
            },
            ..Default::default()
        }
    }

    /// Set the primary flags. Super primary forces primary.
    pub fn with_primary(mut self, is_primary: bool, is_super_primary: bool) -> Self {
        self.is_super_primary = is_super_primary;
        self.is_primary = is_primary || is_super_primary;
        self
    }
}

/// Behaviour common to every attribute value.
pub trait DataEntity {
    fn info(&self) -> &DataInfo;

    /// True when every value slot meaningful to the kind is empty. Flags and
    /// identifiers are never considered.
    fn is_blank(&self) -> bool;
}

/// Blank test for optional text: missing, empty or whitespace only.
pub(crate) fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_super_primary_implies_primary() {
        let info = DataInfo::persisted(1, 2, 3).with_primary(false, true);
        assert!(info.is_primary);
        assert!(info.is_super_primary);
        assert_eq!(info.lifecycle.id(), Some(1));
        assert_eq!(info.lifecycle.contact_id(), Some(3));
    }

    #[test]
    fn test_new_has_no_ids() {
        let info = DataInfo::default();
        assert_eq!(info.lifecycle, Lifecycle::New);
        assert_eq!(info.lifecycle.raw_contact_id(), None);
    }

    #[test]
    fn test_blank_text() {
        assert!(blank(&None));
        assert!(blank(&Some(" \t".into())));
        assert!(!blank(&Some("a".into())));
    }
}
