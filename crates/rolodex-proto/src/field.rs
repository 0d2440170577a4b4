//! Typed column descriptors.
//!
//! Every column is described by a [`FieldDescriptor`] and wrapped in one of
//! three family types: [`DataField`], [`RawContactsField`] or
//! [`ContactsField`]. Predicates are generic over the family, so a predicate
//! built from attribute fields cannot be handed to a query on another
//! relation.

use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::kind::{Kind, Slot};
use crate::predicate::{MatchOp, Operand, Pattern, Predicate};
use crate::value::Value;

/// The three relations of the contacts store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Relation {
    /// Aggregate records.
    Contacts,
    /// Account-scoped constituents of a contact.
    RawContacts,
    /// Generic key-value attribute rows.
    Data,
}

impl Relation {
    pub fn name(&self) -> &'static str {
        match self {
            Relation::Contacts => "contacts",
            Relation::RawContacts => "raw_contacts",
            Relation::Data => "data",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable description of one column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    /// Column name as the store knows it.
    pub column: &'static str,
    /// Relation the column is read from.
    pub relation: Relation,
    /// Relation the column physically belongs to. Differs from `relation`
    /// for contact and raw contact columns joined into the attribute view.
    pub origin: Relation,
    /// Owning kind for attribute slot columns.
    pub kind: Option<Kind>,
    /// Always requested, whatever the caller's inclusion set says.
    pub required: bool,
}

impl FieldDescriptor {
    pub const fn new(
        column: &'static str,
        relation: Relation,
        origin: Relation,
        kind: Option<Kind>,
        required: bool,
    ) -> Self {
        Self {
            column,
            relation,
            origin,
            kind,
            required,
        }
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column)
    }
}

/// A column of one field family.
///
/// The provided methods build single-comparison predicates. Combine them
/// with [`Predicate::and`] and [`Predicate::or`].
pub trait Field: Clone + Eq + Hash + fmt::Debug + Sized + 'static {
    /// Relation every field of this family is read from.
    const RELATION: Relation;

    fn descriptor(&self) -> &FieldDescriptor;

    /// Every field of the family.
    fn all() -> Vec<Self>;

    /// Fields that hold free text and are safe to match loosely.
    fn for_matching() -> Vec<Self>;

    /// Fields that are requested regardless of inclusion.
    fn required() -> Vec<Self> {
        Self::all().into_iter().filter(|f| f.is_required()).collect()
    }

    fn column(&self) -> &'static str {
        self.descriptor().column
    }

    fn kind(&self) -> Option<&Kind> {
        self.descriptor().kind.as_ref()
    }

    fn is_required(&self) -> bool {
        self.descriptor().required
    }

    /// `field = value`, or `field IS NULL` when the value is null.
    fn equal_to(&self, value: impl Into<Value>) -> Predicate<Self> {
        match value.into() {
            Value::Null => self.is_null(),
            v => Predicate::leaf(self, MatchOp::Equal, Operand::Scalar(v)),
        }
    }

    /// `field != value`, or `field IS NOT NULL` when the value is null.
    fn not_equal_to(&self, value: impl Into<Value>) -> Predicate<Self> {
        match value.into() {
            Value::Null => self.is_not_null(),
            v => Predicate::leaf(self, MatchOp::NotEqual, Operand::Scalar(v)),
        }
    }

    /// Case-insensitive equality, rendered as an escaped `LIKE`.
    fn equal_to_ignore_case(&self, value: impl Into<Value>) -> Predicate<Self> {
        self.pattern(MatchOp::Like, Pattern::exact(value))
    }

    fn not_equal_to_ignore_case(&self, value: impl Into<Value>) -> Predicate<Self> {
        self.pattern(MatchOp::NotLike, Pattern::exact(value))
    }

    fn greater_than(&self, value: impl Into<Value>) -> Predicate<Self> {
        Predicate::leaf(self, MatchOp::GreaterThan, Operand::Scalar(value.into()))
    }

    fn greater_than_or_equal(&self, value: impl Into<Value>) -> Predicate<Self> {
        Predicate::leaf(self, MatchOp::GreaterThanOrEqual, Operand::Scalar(value.into()))
    }

    fn less_than(&self, value: impl Into<Value>) -> Predicate<Self> {
        Predicate::leaf(self, MatchOp::LessThan, Operand::Scalar(value.into()))
    }

    fn less_than_or_equal(&self, value: impl Into<Value>) -> Predicate<Self> {
        Predicate::leaf(self, MatchOp::LessThanOrEqual, Operand::Scalar(value.into()))
    }

    fn is_in<V: Into<Value>>(&self, values: impl IntoIterator<Item = V>) -> Predicate<Self> {
        let list = values.into_iter().map(Into::into).collect();
        Predicate::leaf(self, MatchOp::In, Operand::List(list))
    }

    fn not_in<V: Into<Value>>(&self, values: impl IntoIterator<Item = V>) -> Predicate<Self> {
        let list = values.into_iter().map(Into::into).collect();
        Predicate::leaf(self, MatchOp::NotIn, Operand::List(list))
    }

    fn starts_with(&self, value: impl Into<Value>) -> Predicate<Self> {
        self.pattern(MatchOp::Like, Pattern::prefix(value))
    }

    fn ends_with(&self, value: impl Into<Value>) -> Predicate<Self> {
        self.pattern(MatchOp::Like, Pattern::suffix(value))
    }

    fn contains(&self, value: impl Into<Value>) -> Predicate<Self> {
        self.pattern(MatchOp::Like, Pattern::infix(value))
    }

    fn does_not_start_with(&self, value: impl Into<Value>) -> Predicate<Self> {
        self.pattern(MatchOp::NotLike, Pattern::prefix(value))
    }

    fn does_not_end_with(&self, value: impl Into<Value>) -> Predicate<Self> {
        self.pattern(MatchOp::NotLike, Pattern::suffix(value))
    }

    fn does_not_contain(&self, value: impl Into<Value>) -> Predicate<Self> {
        self.pattern(MatchOp::NotLike, Pattern::infix(value))
    }

    /// `field LIKE pattern` with a caller-written pattern. `%` and `_` are
    /// wildcards; prefix them with `\` to match them literally.
    fn like(&self, pattern: impl Into<String>) -> Predicate<Self> {
        self.pattern(MatchOp::Like, Pattern::raw(pattern))
    }

    fn not_like(&self, pattern: impl Into<String>) -> Predicate<Self> {
        self.pattern(MatchOp::NotLike, Pattern::raw(pattern))
    }

    fn is_null(&self) -> Predicate<Self> {
        Predicate::leaf(self, MatchOp::IsNull, Operand::None)
    }

    fn is_not_null(&self) -> Predicate<Self> {
        Predicate::leaf(self, MatchOp::IsNotNull, Operand::None)
    }

    /// Non-null and not the empty string.
    fn is_not_null_or_empty(&self) -> Predicate<Self> {
        self.is_not_null().and(self.not_equal_to(""))
    }

    #[doc(hidden)]
    fn pattern(&self, op: MatchOp, pattern: Pattern) -> Predicate<Self> {
        Predicate::leaf(self, op, Operand::Pattern(pattern))
    }
}

/// A column readable from the attribute relation: either a kind's slot or a
/// column shared by all rows (identifiers, flags, joined columns).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataField(pub(crate) FieldDescriptor);

impl DataField {
    /// The slot `slot` interpreted as a field of `kind`.
    pub const fn new(kind: Kind, slot: Slot) -> Self {
        Self(FieldDescriptor::new(
            slot.column(),
            Relation::Data,
            Relation::Data,
            Some(kind),
            false,
        ))
    }

    /// A column shared by every row of the attribute relation.
    pub const fn common(column: &'static str, origin: Relation, required: bool) -> Self {
        Self(FieldDescriptor::new(column, Relation::Data, origin, None, required))
    }

    /// Same column read from the raw contacts relation, if it lives there.
    pub fn in_raw_contacts_table(&self) -> Option<RawContactsField> {
        let column = match (self.0.origin, self.0.column) {
            (Relation::RawContacts, "raw_contact_id") => "_id",
            (Relation::RawContacts, column) => column,
            (Relation::Contacts, "contact_id") => "contact_id",
            _ => return None,
        };
        RawContactsField::all()
            .into_iter()
            .find(|f| f.column() == column)
    }

    /// Same column read from the contacts relation, if it lives there.
    pub fn in_contacts_table(&self) -> Option<ContactsField> {
        let column = match (self.0.origin, self.0.column) {
            (Relation::Contacts, "contact_id") => "_id",
            (Relation::Contacts, column) => column,
            _ => return None,
        };
        ContactsField::all().into_iter().find(|f| f.column() == column)
    }
}

impl Field for DataField {
    const RELATION: Relation = Relation::Data;

    fn descriptor(&self) -> &FieldDescriptor {
        &self.0
    }

    fn all() -> Vec<Self> {
        crate::fields::all()
    }

    fn for_matching() -> Vec<Self> {
        crate::fields::for_matching()
    }
}

/// A column of the raw contacts relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawContactsField(FieldDescriptor);

impl RawContactsField {
    pub const fn new(column: &'static str, required: bool) -> Self {
        Self(FieldDescriptor::new(
            column,
            Relation::RawContacts,
            Relation::RawContacts,
            None,
            required,
        ))
    }
}

impl Field for RawContactsField {
    const RELATION: Relation = Relation::RawContacts;

    fn descriptor(&self) -> &FieldDescriptor {
        &self.0
    }

    fn all() -> Vec<Self> {
        crate::fields::raw_contacts::all()
    }

    fn for_matching() -> Vec<Self> {
        crate::fields::raw_contacts::for_matching()
    }
}

/// A column of the contacts relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContactsField(FieldDescriptor);

impl ContactsField {
    pub const fn new(column: &'static str, required: bool) -> Self {
        Self(FieldDescriptor::new(
            column,
            Relation::Contacts,
            Relation::Contacts,
            None,
            required,
        ))
    }
}

impl Field for ContactsField {
    const RELATION: Relation = Relation::Contacts;

    fn descriptor(&self) -> &FieldDescriptor {
        &self.0
    }

    fn all() -> Vec<Self> {
        crate::fields::contacts::all()
    }

    fn for_matching() -> Vec<Self> {
        crate::fields::contacts::for_matching()
    }
}
