//! Kind tags and generic value slots of the attribute relation.

use std::borrow::Cow;
use std::fmt;

use crate::error::Error;

/// Discriminator stored in the `mimetype` column of every attribute row.
///
/// The attribute relation reuses the same slot columns for every kind, so the
/// kind is what gives a slot its meaning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Address,
    Email,
    Event,
    GroupMembership,
    Im,
    Name,
    Nickname,
    Note,
    Organization,
    Phone,
    Photo,
    Relation,
    SipAddress,
    Website,
    /// A kind defined outside this crate, identified by its tag.
    Custom(Cow<'static, str>),
}

impl Kind {
    /// Every built-in kind.
    pub const BUILT_IN: [Kind; 14] = [
        Kind::Address,
        Kind::Email,
        Kind::Event,
        Kind::GroupMembership,
        Kind::Im,
        Kind::Name,
        Kind::Nickname,
        Kind::Note,
        Kind::Organization,
        Kind::Phone,
        Kind::Photo,
        Kind::Relation,
        Kind::SipAddress,
        Kind::Website,
    ];

    /// A custom kind with a static tag, usable in constants.
    pub const fn custom(tag: &'static str) -> Kind {
        Kind::Custom(Cow::Borrowed(tag))
    }

    /// The value stored in the `mimetype` column.
    pub fn tag(&self) -> &str {
        match self {
            Kind::Address => "vnd.android.cursor.item/postal-address_v2",
            Kind::Email => "vnd.android.cursor.item/email_v2",
            Kind::Event => "vnd.android.cursor.item/contact_event",
            Kind::GroupMembership => "vnd.android.cursor.item/group_membership",
            Kind::Im => "vnd.android.cursor.item/im",
            Kind::Name => "vnd.android.cursor.item/name",
            Kind::Nickname => "vnd.android.cursor.item/nickname",
            Kind::Note => "vnd.android.cursor.item/note",
            Kind::Organization => "vnd.android.cursor.item/organization",
            Kind::Phone => "vnd.android.cursor.item/phone_v2",
            Kind::Photo => "vnd.android.cursor.item/photo",
            Kind::Relation => "vnd.android.cursor.item/relation",
            Kind::SipAddress => "vnd.android.cursor.item/sip_address",
            Kind::Website => "vnd.android.cursor.item/website",
            Kind::Custom(tag) => tag,
        }
    }

    /// Resolve a stored tag. Tags that are not built in become custom kinds.
    pub fn from_tag(tag: &str) -> Kind {
        Self::built_in(tag).unwrap_or_else(|_| Kind::Custom(Cow::Owned(tag.to_string())))
    }

    /// Resolve a tag that must name a built-in kind.
    pub fn built_in(tag: &str) -> Result<Kind, Error> {
        Self::BUILT_IN
            .iter()
            .find(|k| k.tag() == tag)
            .cloned()
            .ok_or_else(|| Error::UnknownKind(tag.to_string()))
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Kind::Custom(_))
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One of the fifteen untyped value columns of the attribute relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    Data1,
    Data2,
    Data3,
    Data4,
    Data5,
    Data6,
    Data7,
    Data8,
    Data9,
    Data10,
    Data11,
    Data12,
    Data13,
    Data14,
    Data15,
}

impl Slot {
    pub const ALL: [Slot; 15] = [
        Slot::Data1,
        Slot::Data2,
        Slot::Data3,
        Slot::Data4,
        Slot::Data5,
        Slot::Data6,
        Slot::Data7,
        Slot::Data8,
        Slot::Data9,
        Slot::Data10,
        Slot::Data11,
        Slot::Data12,
        Slot::Data13,
        Slot::Data14,
        Slot::Data15,
    ];

    /// Slot for a 1-based index, as used by the column names.
    pub fn from_index(index: usize) -> Option<Slot> {
        index.checked_sub(1).and_then(|i| Self::ALL.get(i)).copied()
    }

    pub const fn column(self) -> &'static str {
        match self {
            Slot::Data1 => "data1",
            Slot::Data2 => "data2",
            Slot::Data3 => "data3",
            Slot::Data4 => "data4",
            Slot::Data5 => "data5",
            Slot::Data6 => "data6",
            Slot::Data7 => "data7",
            Slot::Data8 => "data8",
            Slot::Data9 => "data9",
            Slot::Data10 => "data10",
            Slot::Data11 => "data11",
            Slot::Data12 => "data12",
            Slot::Data13 => "data13",
            Slot::Data14 => "data14",
            Slot::Data15 => "data15",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip() {
        for kind in Kind::BUILT_IN.iter() {
            assert_eq!(&Kind::from_tag(kind.tag()), kind);
        }
    }

    #[test]
    fn test_unknown_tag_is_custom() {
        let kind = Kind::from_tag("vnd.example/pet");
        assert!(kind.is_custom());
        assert_eq!(kind.tag(), "vnd.example/pet");
        assert_eq!(kind, Kind::custom("vnd.example/pet"));
        assert!(Kind::built_in("vnd.example/pet").is_err());
    }

    #[test]
    fn test_slot_index() {
        assert_eq!(Slot::from_index(1), Some(Slot::Data1));
        assert_eq!(Slot::from_index(15).map(Slot::column), Some("data15"));
        assert_eq!(Slot::from_index(0), None);
        assert_eq!(Slot::from_index(16), None);
    }
}
