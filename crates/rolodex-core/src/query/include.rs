//! Field inclusion sets.
//!
//! An [`Include`] lists the fields a caller wants populated. The empty set
//! means every field, in which case no per-value check is made at all.
//! Otherwise the family's required fields are always added, and values of
//! fields outside the set are masked to absent during assembly even when the
//! store returned them.

use std::fmt;

use rolodex_proto::{ContactsField, DataField, Field, RawContactsField};

/// Fields to populate for one family.
#[derive(Clone, PartialEq)]
pub struct Include<F: Field> {
    fields: Option<Vec<F>>,
}

impl<F: Field> Default for Include<F> {
    fn default() -> Self {
        Self::all()
    }
}

impl<F: Field> fmt::Debug for Include<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fields {
            None => f.write_str("Include(all)"),
            Some(fields) => f
                .debug_tuple("Include")
                .field(&fields.iter().map(|x| x.column()).collect::<Vec<_>>())
                .finish(),
        }
    }
}

impl<F: Field> Include<F> {
    /// Every field of the family.
    pub fn all() -> Self {
        Self { fields: None }
    }

    /// Only `fields`, plus the family's required fields. An empty input
    /// means every field.
    pub fn only(fields: impl IntoIterator<Item = F>) -> Self {
        let mut fields = fields.into_iter().peekable();
        if fields.peek().is_none() {
            return Self::all();
        }
        let mut selected: Vec<F> = Vec::new();
        for field in fields.chain(F::required()) {
            if !selected.contains(&field) {
                selected.push(field);
            }
        }
        Self {
            fields: Some(selected),
        }
    }

    pub fn is_all(&self) -> bool {
        self.fields.is_none()
    }

    pub fn contains(&self, field: &F) -> bool {
        match &self.fields {
            None => true,
            Some(fields) => fields.contains(field),
        }
    }

    /// Selected fields, or `None` for every field.
    pub fn fields(&self) -> Option<&[F]> {
        self.fields.as_deref()
    }

    /// Distinct column names to request from the store. Empty means every
    /// column.
    pub fn columns(&self) -> Vec<&'static str> {
        let mut columns: Vec<&'static str> = Vec::new();
        if let Some(fields) = &self.fields {
            for field in fields {
                if !columns.contains(&field.column()) {
                    columns.push(field.column());
                }
            }
        }
        columns
    }
}

impl Include<DataField> {
    /// The selected fields that also exist in the contacts relation.
    pub fn only_contacts_fields(&self) -> Include<ContactsField> {
        match &self.fields {
            None => Include::all(),
            Some(fields) => Include::only(fields.iter().filter_map(DataField::in_contacts_table)),
        }
    }

    /// The selected fields that also exist in the raw contacts relation.
    pub fn only_raw_contacts_fields(&self) -> Include<RawContactsField> {
        match &self.fields {
            None => Include::all(),
            Some(fields) => {
                Include::only(fields.iter().filter_map(DataField::in_raw_contacts_table))
            }
        }
    }
}

/// Inclusion sets for a whole read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Includes {
    pub data: Include<DataField>,
    pub raw_contacts: Include<RawContactsField>,
}

impl Includes {
    pub fn new(data: Include<DataField>, raw_contacts: Include<RawContactsField>) -> Self {
        Self { data, raw_contacts }
    }

    /// Contacts columns follow from the attribute inclusion set.
    pub fn contacts(&self) -> Include<ContactsField> {
        self.data.only_contacts_fields()
    }
}
