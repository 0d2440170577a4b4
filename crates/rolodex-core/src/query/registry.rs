//! Kind handlers.
//!
//! Attribute rows are folded into typed attributes by kind. Built-in kinds
//! form a closed set handled here directly; custom kinds are handled by
//! [`CustomKindHandler`]s registered once at startup and shared read-only
//! afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rolodex_proto::fields::{
    address, data, email, event, group_membership, im, name, nickname, note, organization, phone,
    relation, sip_address, website,
};
use rolodex_proto::{DataField, Field, Kind, Value};

use super::include::Include;
use crate::entity::{
    Address, CustomEntity, DataInfo, Email, Event, GroupMembership, Im, Name, Nickname, Note,
    Organization, Phone, RawContact, Relation, SipAddress, Website,
};
use crate::error::Error;
use crate::store::Row;

static NULL: Value = Value::Null;

/// How many values of a kind a raw contact may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountRestriction {
    /// A later row replaces the earlier one.
    AtMostOne,
    /// Rows accumulate in order.
    NoLimit,
}

/// An attribute row seen through an inclusion set.
///
/// Slot values of fields outside the inclusion set, or belonging to another
/// kind, read as null.
pub struct DataRow<'a> {
    row: &'a Row,
    kind: Kind,
    include: &'a Include<DataField>,
}

impl<'a> DataRow<'a> {
    /// `None` when the row carries no kind tag.
    pub fn new(row: &'a Row, include: &'a Include<DataField>) -> Option<Self> {
        let kind = Kind::from_tag(row.get_str(data::MIMETYPE.column())?);
        Some(Self { row, kind, include })
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn id(&self) -> Option<i64> {
        self.row.get_i64(data::ID.column())
    }

    pub fn raw_contact_id(&self) -> Option<i64> {
        self.row.get_i64(data::RAW_CONTACT_ID.column())
    }

    pub fn contact_id(&self) -> Option<i64> {
        self.row.get_i64(data::CONTACT_ID.column())
    }

    /// Identifiers and primary flags of the row.
    pub fn info(&self) -> DataInfo {
        let info = match (self.id(), self.raw_contact_id(), self.contact_id()) {
            (Some(id), Some(raw_contact_id), Some(contact_id)) => {
                DataInfo::persisted(id, raw_contact_id, contact_id)
            }
            _ => DataInfo::default(),
        };
        info.with_primary(
            self.row.get_bool(data::IS_PRIMARY.column()).unwrap_or(false),
            self.row
                .get_bool(data::IS_SUPER_PRIMARY.column())
                .unwrap_or(false),
        )
    }

    pub fn value(&self, field: &DataField) -> &Value {
        if field.kind().is_some_and(|k| k != &self.kind) || !self.include.contains(field) {
            return &NULL;
        }
        self.row.get(field.column())
    }

    pub fn text(&self, field: &DataField) -> Option<String> {
        match self.value(field) {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
            other => Some(other.to_sql()),
        }
    }

    pub fn int(&self, field: &DataField) -> Option<i64> {
        let value = self.value(field);
        value
            .as_i64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
    }

    pub fn bytes(&self, field: &DataField) -> Option<Vec<u8>> {
        self.value(field).as_bytes().map(<[u8]>::to_vec)
    }
}

/// Decodes attribute rows of one custom kind.
pub trait CustomKindHandler: Send + Sync {
    /// Tag of the handled kind. Must be a custom kind.
    fn kind(&self) -> Kind;

    /// Every field of the kind.
    fn fields(&self) -> Vec<DataField>;

    /// Fields holding free text.
    fn fields_for_matching(&self) -> Vec<DataField> {
        self.fields()
    }

    fn count_restriction(&self) -> CountRestriction {
        CountRestriction::NoLimit
    }

    /// Build the typed value of a row.
    fn map(&self, row: &DataRow<'_>) -> Box<dyn CustomEntity>;
}

/// What happened to a folded row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fold {
    Folded,
    /// The kind is known but not assembled (photos).
    Skipped,
    /// No handler for the kind.
    Unknown,
}

/// Registry of custom kind handlers.
#[derive(Clone, Default)]
pub struct KindRegistry {
    handlers: BTreeMap<Kind, Arc<dyn CustomKindHandler>>,
}

impl fmt::Debug for KindRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindRegistry")
            .field("custom", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom kind handler.
    pub fn register(&mut self, handler: impl CustomKindHandler + 'static) -> Result<(), Error> {
        let kind = handler.kind();
        if !kind.is_custom() {
            return Err(Error::InvalidArgument(format!(
                "{} is a built-in kind",
                kind.tag()
            )));
        }
        if self.handlers.contains_key(&kind) {
            return Err(Error::InvalidArgument(format!(
                "kind {} is already registered",
                kind.tag()
            )));
        }
        self.handlers.insert(kind, Arc::new(handler));
        Ok(())
    }

    pub fn handler(&self, kind: &Kind) -> Option<&Arc<dyn CustomKindHandler>> {
        self.handlers.get(kind)
    }

    pub fn custom_kinds(&self) -> impl Iterator<Item = &Kind> {
        self.handlers.keys()
    }

    /// Built-in fields followed by every registered custom field.
    pub fn fields(&self) -> Vec<DataField> {
        let mut fields = rolodex_proto::fields::all();
        for handler in self.handlers.values() {
            fields.extend(handler.fields());
        }
        fields
    }

    pub fn fields_for_matching(&self) -> Vec<DataField> {
        let mut fields = rolodex_proto::fields::for_matching();
        for handler in self.handlers.values() {
            fields.extend(handler.fields_for_matching());
        }
        fields
    }

    /// Fold one attribute row into its raw contact.
    pub fn fold(&self, raw: &mut RawContact, row: &DataRow<'_>) -> Fold {
        match row.kind() {
            Kind::Photo => Fold::Skipped,
            Kind::Custom(_) => match self.handlers.get(row.kind()) {
                Some(handler) => {
                    let value = handler.map(row);
                    let values = raw.custom_data.entry(row.kind().clone()).or_default();
                    match handler.count_restriction() {
                        CountRestriction::AtMostOne => *values = vec![value],
                        CountRestriction::NoLimit => values.push(value),
                    }
                    Fold::Folded
                }
                None => Fold::Unknown,
            },
            _ => {
                fold_built_in(raw, row);
                Fold::Folded
            }
        }
    }
}

fn fold_built_in(raw: &mut RawContact, row: &DataRow<'_>) {
    let info = row.info();
    match row.kind() {
        Kind::Address => raw.addresses.push(Address {
            info,
            type_code: row.int(&address::TYPE),
            label: row.text(&address::LABEL),
            formatted_address: row.text(&address::FORMATTED_ADDRESS),
            street: row.text(&address::STREET),
            po_box: row.text(&address::PO_BOX),
            neighborhood: row.text(&address::NEIGHBORHOOD),
            city: row.text(&address::CITY),
            region: row.text(&address::REGION),
            postcode: row.text(&address::POSTCODE),
            country: row.text(&address::COUNTRY),
        }),
        Kind::Email => raw.emails.push(Email {
            info,
            type_code: row.int(&email::TYPE),
            label: row.text(&email::LABEL),
            address: row.text(&email::ADDRESS),
        }),
        Kind::Event => raw.events.push(Event {
            info,
            type_code: row.int(&event::TYPE),
            label: row.text(&event::LABEL),
            date: row.text(&event::DATE),
        }),
        Kind::GroupMembership => raw.group_memberships.push(GroupMembership {
            info,
            group_id: row.int(&group_membership::GROUP_ID),
        }),
        Kind::Im => raw.ims.push(Im {
            info,
            protocol: row.int(&im::PROTOCOL),
            custom_protocol: row.text(&im::CUSTOM_PROTOCOL),
            data: row.text(&im::DATA),
        }),
        Kind::Name => {
            raw.name = Some(Name {
                info,
                display_name: row.text(&name::DISPLAY_NAME),
                given_name: row.text(&name::GIVEN_NAME),
                middle_name: row.text(&name::MIDDLE_NAME),
                family_name: row.text(&name::FAMILY_NAME),
                prefix: row.text(&name::PREFIX),
                suffix: row.text(&name::SUFFIX),
                phonetic_given_name: row.text(&name::PHONETIC_GIVEN_NAME),
                phonetic_middle_name: row.text(&name::PHONETIC_MIDDLE_NAME),
                phonetic_family_name: row.text(&name::PHONETIC_FAMILY_NAME),
            })
        }
        Kind::Nickname => {
            raw.nickname = Some(Nickname {
                info,
                name: row.text(&nickname::NAME),
            })
        }
        Kind::Note => {
            raw.note = Some(Note {
                info,
                note: row.text(&note::NOTE),
            })
        }
        Kind::Organization => {
            raw.organization = Some(Organization {
                info,
                company: row.text(&organization::COMPANY),
                title: row.text(&organization::TITLE),
                department: row.text(&organization::DEPARTMENT),
                job_description: row.text(&organization::JOB_DESCRIPTION),
                office_location: row.text(&organization::OFFICE_LOCATION),
                symbol: row.text(&organization::SYMBOL),
                phonetic_name: row.text(&organization::PHONETIC_NAME),
            })
        }
        Kind::Phone => raw.phones.push(Phone {
            info,
            type_code: row.int(&phone::TYPE),
            label: row.text(&phone::LABEL),
            number: row.text(&phone::NUMBER),
            normalized_number: row.text(&phone::NORMALIZED_NUMBER),
        }),
        Kind::Relation => raw.relations.push(Relation {
            info,
            type_code: row.int(&relation::TYPE),
            label: row.text(&relation::LABEL),
            name: row.text(&relation::NAME),
        }),
        Kind::SipAddress => {
            raw.sip_address = Some(SipAddress {
                info,
                sip_address: row.text(&sip_address::SIP_ADDRESS),
            })
        }
        Kind::Website => raw.websites.push(Website {
            info,
            url: row.text(&website::URL),
        }),
        Kind::Photo | Kind::Custom(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use super::*;
    use rolodex_proto::Slot;

    const PRONOUNS: Kind = Kind::custom("vnd.rolodex.item/pronouns");
    const PRONOUNS_VALUE: DataField = DataField::new(PRONOUNS, Slot::Data1);

    #[derive(Debug, Clone, PartialEq)]
    struct Pronouns {
        info: DataInfo,
        value: Option<String>,
    }

    impl CustomEntity for Pronouns {
        fn kind(&self) -> Kind {
            PRONOUNS
        }

        fn info(&self) -> &DataInfo {
            &self.info
        }

        fn is_blank(&self) -> bool {
            self.value.as_deref().map_or(true, str::is_empty)
        }

        fn redacted(&self, mask: char) -> Box<dyn CustomEntity> {
            Box::new(Pronouns {
                info: DataInfo {
                    is_redacted: true,
                    ..self.info.clone()
                },
                value: self
                    .value
                    .as_deref()
                    .map(|v| rolodex_proto::value::mask_str(v, mask)),
            })
        }

        fn clone_box(&self) -> Box<dyn CustomEntity> {
            Box::new(self.clone())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn dyn_eq(&self, other: &dyn CustomEntity) -> bool {
            other.as_any().downcast_ref::<Pronouns>() == Some(self)
        }
    }

    struct PronounsHandler(CountRestriction);

    impl CustomKindHandler for PronounsHandler {
        fn kind(&self) -> Kind {
            PRONOUNS
        }

        fn fields(&self) -> Vec<DataField> {
            vec![PRONOUNS_VALUE]
        }

        fn count_restriction(&self) -> CountRestriction {
            self.0
        }

        fn map(&self, row: &DataRow<'_>) -> Box<dyn CustomEntity> {
            Box::new(Pronouns {
                info: row.info(),
                value: row.text(&PRONOUNS_VALUE),
            })
        }
    }

    fn data_row(id: i64, kind: &Kind, slots: Vec<(&str, Value)>) -> Row {
        let mut row = Row::new()
            .with("_id", id)
            .with("raw_contact_id", 1i64)
            .with("contact_id", 1i64)
            .with("mimetype", kind.tag())
            .with("is_primary", false)
            .with("is_super_primary", false);
        for (column, value) in slots {
            row.set(column, value);
        }
        row
    }

    #[test]
    fn test_fold_built_in_kinds() {
        let registry = KindRegistry::new();
        let include = Include::all();
        let mut raw = RawContact::new(1, 1);
        for (id, number) in [(1, "555-1"), (2, "555-2")] {
            let row = data_row(
                id,
                &Kind::Phone,
                vec![("data1", number.into()), ("data2", 2i64.into())],
            );
            let view = DataRow::new(&row, &include).unwrap();
            assert_eq!(registry.fold(&mut raw, &view), Fold::Folded);
        }
        for (id, given) in [(3, "Ann"), (4, "Anne")] {
            let row = data_row(id, &Kind::Name, vec![("data2", given.into())]);
            registry.fold(&mut raw, &DataRow::new(&row, &include).unwrap());
        }
        assert_eq!(raw.phones.len(), 2);
        assert_eq!(raw.phones[1].number.as_deref(), Some("555-2"));
        assert_eq!(raw.phones[0].type_code, Some(2));
        assert_eq!(raw.phones[0].info.lifecycle.id(), Some(1));
        // singletons keep the last row
        assert_eq!(raw.name.as_ref().unwrap().given_name.as_deref(), Some("Anne"));
    }

    #[test]
    fn test_photo_and_unknown_kinds_are_not_folded() {
        let registry = KindRegistry::new();
        let include = Include::all();
        let mut raw = RawContact::new(1, 1);
        let photo = data_row(1, &Kind::Photo, vec![("data15", vec![1u8, 2].into())]);
        assert_eq!(
            registry.fold(&mut raw, &DataRow::new(&photo, &include).unwrap()),
            Fold::Skipped
        );
        let unknown = data_row(2, &Kind::from_tag("vnd.other/thing"), vec![("data1", "x".into())]);
        assert_eq!(
            registry.fold(&mut raw, &DataRow::new(&unknown, &include).unwrap()),
            Fold::Unknown
        );
        assert!(raw.is_blank());
    }

    #[test]
    fn test_include_masks_values() {
        let include = Include::only([email::ADDRESS]);
        let row = data_row(
            1,
            &Kind::Email,
            vec![("data1", "a@b.c".into()), ("data3", "Work".into())],
        );
        let view = DataRow::new(&row, &include).unwrap();
        assert_eq!(view.text(&email::ADDRESS).as_deref(), Some("a@b.c"));
        assert_eq!(view.text(&email::LABEL), None);
        // same slot, other kind
        assert_eq!(view.text(&phone::NUMBER), None);
    }

    #[test]
    fn test_primary_flags() {
        let include = Include::all();
        let mut row = data_row(1, &Kind::Email, vec![("data1", "a@b.c".into())]);
        row.set("is_super_primary", true);
        let info = DataRow::new(&row, &include).unwrap().info();
        assert!(info.is_primary);
        assert!(info.is_super_primary);
    }

    #[test]
    fn test_custom_kind_count_restriction() {
        let include = Include::all();
        for (restriction, expected) in
            [(CountRestriction::AtMostOne, 1), (CountRestriction::NoLimit, 2)]
        {
            let mut registry = KindRegistry::new();
            registry.register(PronounsHandler(restriction)).unwrap();
            let mut raw = RawContact::new(1, 1);
            for (id, value) in [(1, "she/her"), (2, "they/them")] {
                let row = data_row(id, &PRONOUNS, vec![("data1", value.into())]);
                registry.fold(&mut raw, &DataRow::new(&row, &include).unwrap());
            }
            assert_eq!(raw.custom(&PRONOUNS).len(), expected);
            assert!(!raw.is_blank());
        }
    }

    #[test]
    fn test_register_rejects_duplicates_and_built_ins() {
        struct Fake;
        impl CustomKindHandler for Fake {
            fn kind(&self) -> Kind {
                Kind::Email
            }
            fn fields(&self) -> Vec<DataField> {
                Vec::new()
            }
            fn map(&self, _row: &DataRow<'_>) -> Box<dyn CustomEntity> {
                unreachable!()
            }
        }

        let mut registry = KindRegistry::new();
        assert!(matches!(registry.register(Fake), Err(Error::InvalidArgument(_))));
        registry
            .register(PronounsHandler(CountRestriction::NoLimit))
            .unwrap();
        assert!(registry
            .register(PronounsHandler(CountRestriction::NoLimit))
            .is_err());
        assert!(registry.fields().contains(&PRONOUNS_VALUE));
        assert!(registry.fields_for_matching().contains(&PRONOUNS_VALUE));
        assert_eq!(registry.custom_kinds().count(), 1);
    }
}
