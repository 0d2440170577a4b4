//! Field constants for every relation and built-in kind.
//!
//! ```
//! use rolodex_proto::fields::{email, name};
//! use rolodex_proto::Field;
//!
//! let predicate = name::GIVEN_NAME
//!     .starts_with("jo")
//!     .and(email::ADDRESS.ends_with("@example.com"));
//! assert!(predicate.to_string().contains("mimetype = 'vnd.android.cursor.item/name'"));
//! ```

use crate::field::{ContactsField, DataField, Field, RawContactsField, Relation};
use crate::kind::{Kind, Slot};

const fn slot(kind: Kind, slot: Slot) -> DataField {
    DataField::new(kind, slot)
}

/// Columns present on every attribute row, including the contact and raw
/// contact columns joined into the attribute view.
pub mod data {
    use super::*;

    pub const ID: DataField = DataField::common("_id", Relation::Data, true);
    pub const RAW_CONTACT_ID: DataField =
        DataField::common("raw_contact_id", Relation::RawContacts, true);
    pub const CONTACT_ID: DataField = DataField::common("contact_id", Relation::Contacts, true);
    pub const MIMETYPE: DataField = DataField::common("mimetype", Relation::Data, true);
    pub const IS_PRIMARY: DataField = DataField::common("is_primary", Relation::Data, true);
    pub const IS_SUPER_PRIMARY: DataField =
        DataField::common("is_super_primary", Relation::Data, true);

    pub const ACCOUNT_NAME: DataField =
        DataField::common("account_name", Relation::RawContacts, false);
    pub const ACCOUNT_TYPE: DataField =
        DataField::common("account_type", Relation::RawContacts, false);

    pub const CONTACT_LOOKUP_KEY: DataField =
        DataField::common("lookup", Relation::Contacts, false);
    pub const CONTACT_DISPLAY_NAME: DataField =
        DataField::common("display_name", Relation::Contacts, false);
    pub const CONTACT_DISPLAY_NAME_ALT: DataField =
        DataField::common("display_name_alt", Relation::Contacts, false);
    pub const CONTACT_LAST_UPDATED_TIMESTAMP: DataField =
        DataField::common("contact_last_updated_timestamp", Relation::Contacts, false);
    pub const CONTACT_HAS_PHONE_NUMBER: DataField =
        DataField::common("has_phone_number", Relation::Contacts, false);
    pub const CONTACT_STARRED: DataField = DataField::common("starred", Relation::Contacts, false);

    pub fn all() -> Vec<DataField> {
        vec![
            ID,
            RAW_CONTACT_ID,
            CONTACT_ID,
            MIMETYPE,
            IS_PRIMARY,
            IS_SUPER_PRIMARY,
            ACCOUNT_NAME,
            ACCOUNT_TYPE,
            CONTACT_LOOKUP_KEY,
            CONTACT_DISPLAY_NAME,
            CONTACT_DISPLAY_NAME_ALT,
            CONTACT_LAST_UPDATED_TIMESTAMP,
            CONTACT_HAS_PHONE_NUMBER,
            CONTACT_STARRED,
        ]
    }

    pub fn for_matching() -> Vec<DataField> {
        vec![CONTACT_DISPLAY_NAME, CONTACT_DISPLAY_NAME_ALT]
    }
}

pub mod address {
    use super::*;

    pub const FORMATTED_ADDRESS: DataField = slot(Kind::Address, Slot::Data1);
    pub const TYPE: DataField = slot(Kind::Address, Slot::Data2);
    pub const LABEL: DataField = slot(Kind::Address, Slot::Data3);
    pub const STREET: DataField = slot(Kind::Address, Slot::Data4);
    pub const PO_BOX: DataField = slot(Kind::Address, Slot::Data5);
    pub const NEIGHBORHOOD: DataField = slot(Kind::Address, Slot::Data6);
    pub const CITY: DataField = slot(Kind::Address, Slot::Data7);
    pub const REGION: DataField = slot(Kind::Address, Slot::Data8);
    pub const POSTCODE: DataField = slot(Kind::Address, Slot::Data9);
    pub const COUNTRY: DataField = slot(Kind::Address, Slot::Data10);

    pub fn all() -> Vec<DataField> {
        vec![
            FORMATTED_ADDRESS,
            TYPE,
            LABEL,
            STREET,
            PO_BOX,
            NEIGHBORHOOD,
            CITY,
            REGION,
            POSTCODE,
            COUNTRY,
        ]
    }

    pub fn for_matching() -> Vec<DataField> {
        vec![
            FORMATTED_ADDRESS,
            STREET,
            PO_BOX,
            NEIGHBORHOOD,
            CITY,
            REGION,
            POSTCODE,
            COUNTRY,
        ]
    }
}

pub mod email {
    use super::*;

    pub const ADDRESS: DataField = slot(Kind::Email, Slot::Data1);
    pub const TYPE: DataField = slot(Kind::Email, Slot::Data2);
    pub const LABEL: DataField = slot(Kind::Email, Slot::Data3);

    pub fn all() -> Vec<DataField> {
        vec![ADDRESS, TYPE, LABEL]
    }

    pub fn for_matching() -> Vec<DataField> {
        vec![ADDRESS]
    }
}

pub mod event {
    use super::*;

    pub const DATE: DataField = slot(Kind::Event, Slot::Data1);
    pub const TYPE: DataField = slot(Kind::Event, Slot::Data2);
    pub const LABEL: DataField = slot(Kind::Event, Slot::Data3);

    pub fn all() -> Vec<DataField> {
        vec![DATE, TYPE, LABEL]
    }

    pub fn for_matching() -> Vec<DataField> {
        Vec::new()
    }
}

pub mod group_membership {
    use super::*;

    pub const GROUP_ID: DataField = slot(Kind::GroupMembership, Slot::Data1);

    pub fn all() -> Vec<DataField> {
        vec![GROUP_ID]
    }

    pub fn for_matching() -> Vec<DataField> {
        Vec::new()
    }
}

pub mod im {
    use super::*;

    pub const DATA: DataField = slot(Kind::Im, Slot::Data1);
    pub const PROTOCOL: DataField = slot(Kind::Im, Slot::Data5);
    pub const CUSTOM_PROTOCOL: DataField = slot(Kind::Im, Slot::Data6);

    pub fn all() -> Vec<DataField> {
        vec![DATA, PROTOCOL, CUSTOM_PROTOCOL]
    }

    pub fn for_matching() -> Vec<DataField> {
        vec![DATA]
    }
}

pub mod name {
    use super::*;

    pub const DISPLAY_NAME: DataField = slot(Kind::Name, Slot::Data1);
    pub const GIVEN_NAME: DataField = slot(Kind::Name, Slot::Data2);
    pub const FAMILY_NAME: DataField = slot(Kind::Name, Slot::Data3);
    pub const PREFIX: DataField = slot(Kind::Name, Slot::Data4);
    pub const MIDDLE_NAME: DataField = slot(Kind::Name, Slot::Data5);
    pub const SUFFIX: DataField = slot(Kind::Name, Slot::Data6);
    pub const PHONETIC_GIVEN_NAME: DataField = slot(Kind::Name, Slot::Data7);
    pub const PHONETIC_MIDDLE_NAME: DataField = slot(Kind::Name, Slot::Data8);
    pub const PHONETIC_FAMILY_NAME: DataField = slot(Kind::Name, Slot::Data9);

    pub fn all() -> Vec<DataField> {
        vec![
            DISPLAY_NAME,
            GIVEN_NAME,
            FAMILY_NAME,
            PREFIX,
            MIDDLE_NAME,
            SUFFIX,
            PHONETIC_GIVEN_NAME,
            PHONETIC_MIDDLE_NAME,
            PHONETIC_FAMILY_NAME,
        ]
    }

    pub fn for_matching() -> Vec<DataField> {
        all()
    }
}

pub mod nickname {
    use super::*;

    pub const NAME: DataField = slot(Kind::Nickname, Slot::Data1);

    pub fn all() -> Vec<DataField> {
        vec![NAME]
    }

    pub fn for_matching() -> Vec<DataField> {
        all()
    }
}

pub mod note {
    use super::*;

    pub const NOTE: DataField = slot(Kind::Note, Slot::Data1);

    pub fn all() -> Vec<DataField> {
        vec![NOTE]
    }

    pub fn for_matching() -> Vec<DataField> {
        all()
    }
}

pub mod organization {
    use super::*;

    pub const COMPANY: DataField = slot(Kind::Organization, Slot::Data1);
    pub const TITLE: DataField = slot(Kind::Organization, Slot::Data4);
    pub const DEPARTMENT: DataField = slot(Kind::Organization, Slot::Data5);
    pub const JOB_DESCRIPTION: DataField = slot(Kind::Organization, Slot::Data6);
    pub const SYMBOL: DataField = slot(Kind::Organization, Slot::Data7);
    pub const PHONETIC_NAME: DataField = slot(Kind::Organization, Slot::Data8);
    pub const OFFICE_LOCATION: DataField = slot(Kind::Organization, Slot::Data9);

    pub fn all() -> Vec<DataField> {
        vec![
            COMPANY,
            TITLE,
            DEPARTMENT,
            JOB_DESCRIPTION,
            SYMBOL,
            PHONETIC_NAME,
            OFFICE_LOCATION,
        ]
    }

    pub fn for_matching() -> Vec<DataField> {
        all()
    }
}

pub mod phone {
    use super::*;

    pub const NUMBER: DataField = slot(Kind::Phone, Slot::Data1);
    pub const TYPE: DataField = slot(Kind::Phone, Slot::Data2);
    pub const LABEL: DataField = slot(Kind::Phone, Slot::Data3);
    pub const NORMALIZED_NUMBER: DataField = slot(Kind::Phone, Slot::Data4);

    pub fn all() -> Vec<DataField> {
        vec![NUMBER, TYPE, LABEL, NORMALIZED_NUMBER]
    }

    pub fn for_matching() -> Vec<DataField> {
        vec![NUMBER, NORMALIZED_NUMBER]
    }
}

/// Photo slots. Not part of [`all`]: photos are read and written through the
/// photo side channel, never through the generic attribute fold.
pub mod photo {
    use super::*;

    pub const FILE_ID: DataField = slot(Kind::Photo, Slot::Data14);
    pub const THUMBNAIL: DataField = slot(Kind::Photo, Slot::Data15);
}

pub mod relation {
    use super::*;

    pub const NAME: DataField = slot(Kind::Relation, Slot::Data1);
    pub const TYPE: DataField = slot(Kind::Relation, Slot::Data2);
    pub const LABEL: DataField = slot(Kind::Relation, Slot::Data3);

    pub fn all() -> Vec<DataField> {
        vec![NAME, TYPE, LABEL]
    }

    pub fn for_matching() -> Vec<DataField> {
        Vec::new()
    }
}

pub mod sip_address {
    use super::*;

    pub const SIP_ADDRESS: DataField = slot(Kind::SipAddress, Slot::Data1);

    pub fn all() -> Vec<DataField> {
        vec![SIP_ADDRESS]
    }

    pub fn for_matching() -> Vec<DataField> {
        Vec::new()
    }
}

pub mod website {
    use super::*;

    pub const URL: DataField = slot(Kind::Website, Slot::Data1);

    pub fn all() -> Vec<DataField> {
        vec![URL]
    }

    pub fn for_matching() -> Vec<DataField> {
        Vec::new()
    }
}

pub mod contacts {
    use super::*;

    pub const ID: ContactsField = ContactsField::new("_id", true);
    pub const LOOKUP_KEY: ContactsField = ContactsField::new("lookup", false);
    pub const DISPLAY_NAME_PRIMARY: ContactsField = ContactsField::new("display_name", false);
    pub const DISPLAY_NAME_ALT: ContactsField = ContactsField::new("display_name_alt", false);
    pub const LAST_UPDATED_TIMESTAMP: ContactsField =
        ContactsField::new("contact_last_updated_timestamp", false);
    pub const PHOTO_URI: ContactsField = ContactsField::new("photo_uri", false);
    pub const PHOTO_THUMBNAIL_URI: ContactsField = ContactsField::new("photo_thumb_uri", false);
    pub const HAS_PHONE_NUMBER: ContactsField = ContactsField::new("has_phone_number", false);
    pub const STARRED: ContactsField = ContactsField::new("starred", false);

    pub fn all() -> Vec<ContactsField> {
        vec![
            ID,
            LOOKUP_KEY,
            DISPLAY_NAME_PRIMARY,
            DISPLAY_NAME_ALT,
            LAST_UPDATED_TIMESTAMP,
            PHOTO_URI,
            PHOTO_THUMBNAIL_URI,
            HAS_PHONE_NUMBER,
            STARRED,
        ]
    }

    pub fn for_matching() -> Vec<ContactsField> {
        vec![DISPLAY_NAME_PRIMARY, DISPLAY_NAME_ALT]
    }
}

pub mod raw_contacts {
    use super::*;

    pub const ID: RawContactsField = RawContactsField::new("_id", true);
    pub const CONTACT_ID: RawContactsField = RawContactsField::new("contact_id", true);
    pub const DISPLAY_NAME_PRIMARY: RawContactsField =
        RawContactsField::new("display_name", false);
    pub const DISPLAY_NAME_ALT: RawContactsField =
        RawContactsField::new("display_name_alt", false);
    pub const ACCOUNT_NAME: RawContactsField = RawContactsField::new("account_name", false);
    pub const ACCOUNT_TYPE: RawContactsField = RawContactsField::new("account_type", false);

    pub fn all() -> Vec<RawContactsField> {
        vec![
            ID,
            CONTACT_ID,
            DISPLAY_NAME_PRIMARY,
            DISPLAY_NAME_ALT,
            ACCOUNT_NAME,
            ACCOUNT_TYPE,
        ]
    }

    pub fn for_matching() -> Vec<RawContactsField> {
        vec![DISPLAY_NAME_PRIMARY, DISPLAY_NAME_ALT]
    }
}

/// Slot fields of a built-in kind. Empty for photos and custom kinds.
pub fn of_kind(kind: &Kind) -> Vec<DataField> {
    match kind {
        Kind::Address => address::all(),
        Kind::Email => email::all(),
        Kind::Event => event::all(),
        Kind::GroupMembership => group_membership::all(),
        Kind::Im => im::all(),
        Kind::Name => name::all(),
        Kind::Nickname => nickname::all(),
        Kind::Note => note::all(),
        Kind::Organization => organization::all(),
        Kind::Phone => phone::all(),
        Kind::Relation => relation::all(),
        Kind::SipAddress => sip_address::all(),
        Kind::Website => website::all(),
        Kind::Photo | Kind::Custom(_) => Vec::new(),
    }
}

/// Free-text fields of a built-in kind.
pub fn for_matching_of_kind(kind: &Kind) -> Vec<DataField> {
    match kind {
        Kind::Address => address::for_matching(),
        Kind::Email => email::for_matching(),
        Kind::Event => event::for_matching(),
        Kind::GroupMembership => group_membership::for_matching(),
        Kind::Im => im::for_matching(),
        Kind::Name => name::for_matching(),
        Kind::Nickname => nickname::for_matching(),
        Kind::Note => note::for_matching(),
        Kind::Organization => organization::for_matching(),
        Kind::Phone => phone::for_matching(),
        Kind::Relation => relation::for_matching(),
        Kind::SipAddress => sip_address::for_matching(),
        Kind::Website => website::for_matching(),
        Kind::Photo | Kind::Custom(_) => Vec::new(),
    }
}

/// Every built-in attribute field: the common columns followed by the slots
/// of each kind.
pub fn all() -> Vec<DataField> {
    let mut fields = data::all();
    for kind in Kind::BUILT_IN.iter() {
        fields.extend(of_kind(kind));
    }
    fields
}

/// Every built-in attribute field eligible for free-text matching.
pub fn for_matching() -> Vec<DataField> {
    let mut fields = data::for_matching();
    for kind in Kind::BUILT_IN.iter() {
        fields.extend(for_matching_of_kind(kind));
    }
    fields
}

/// Attribute fields whose column lives in the contacts relation.
pub fn contacts_columns() -> Vec<DataField> {
    all()
        .into_iter()
        .filter(|f| f.descriptor().origin == Relation::Contacts)
        .collect()
}
