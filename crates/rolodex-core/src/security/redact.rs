//! Redaction of contacts and predicates.
//!
//! A redacted copy has the same shape as the original. Every personal string
//! is replaced by the same number of mask characters; identifiers, numbers,
//! flags, lookup keys and photo URIs are kept. Redacting twice gives the
//! same result as redacting once.

use rolodex_proto::value::mask_str;
use rolodex_proto::{Expr, Field, Predicate};

use crate::entity::{
    Account, Address, Contact, DataInfo, Email, Event, GroupMembership, Im, Name, Nickname, Note,
    Organization, Phone, RawContact, Relation, SipAddress, Website,
};

/// Produces a redacted copy of a value.
pub trait Redact {
    fn redacted(&self, mask: char) -> Self;
}

/// Redact with the given mask character.
pub fn redact<T: Redact>(value: &T, mask: char) -> T {
    value.redacted(mask)
}

fn mask_opt(value: &Option<String>, mask: char) -> Option<String> {
    value.as_deref().map(|s| mask_str(s, mask))
}

impl Redact for DataInfo {
    fn redacted(&self, _mask: char) -> Self {
        DataInfo {
            is_redacted: true,
            ..self.clone()
        }
    }
}

macro_rules! redact_strings {
    ($($ty:ident { $($field:ident),* }),* $(,)?) => {
        $(
            impl Redact for $ty {
                fn redacted(&self, mask: char) -> Self {
                    $ty {
                        info: self.info.redacted(mask),
                        $($field: mask_opt(&self.$field, mask),)*
                        ..self.clone()
                    }
                }
            }
        )*
    };
}

redact_strings! {
    Address {
        label,
        formatted_address,
        street,
        po_box,
        neighborhood,
        city,
        region,
        postcode,
        country
    },
    Email { label, address },
    Event { label, date },
    GroupMembership {},
    Im { custom_protocol, data },
    Name {
        display_name,
        given_name,
        middle_name,
        family_name,
        prefix,
        suffix,
        phonetic_given_name,
        phonetic_middle_name,
        phonetic_family_name
    },
    Nickname { name },
    Note { note },
    Organization {
        company,
        title,
        department,
        job_description,
        office_location,
        symbol,
        phonetic_name
    },
    Phone { label, number, normalized_number },
    Relation { label, name },
    SipAddress { sip_address },
    Website { url },
}

impl Redact for Account {
    fn redacted(&self, mask: char) -> Self {
        Account {
            name: mask_str(&self.name, mask),
            account_type: mask_str(&self.account_type, mask),
        }
    }
}

impl<T: Redact> Redact for Option<T> {
    fn redacted(&self, mask: char) -> Self {
        self.as_ref().map(|v| v.redacted(mask))
    }
}

impl<T: Redact> Redact for Vec<T> {
    fn redacted(&self, mask: char) -> Self {
        self.iter().map(|v| v.redacted(mask)).collect()
    }
}

impl Redact for RawContact {
    fn redacted(&self, mask: char) -> Self {
        RawContact {
            id: self.id,
            contact_id: self.contact_id,
            display_name_primary: mask_opt(&self.display_name_primary, mask),
            display_name_alt: mask_opt(&self.display_name_alt, mask),
            account: self.account.redacted(mask),
            addresses: self.addresses.redacted(mask),
            emails: self.emails.redacted(mask),
            events: self.events.redacted(mask),
            group_memberships: self.group_memberships.redacted(mask),
            ims: self.ims.redacted(mask),
            name: self.name.redacted(mask),
            nickname: self.nickname.redacted(mask),
            note: self.note.redacted(mask),
            organization: self.organization.redacted(mask),
            phones: self.phones.redacted(mask),
            relations: self.relations.redacted(mask),
            sip_address: self.sip_address.redacted(mask),
            websites: self.websites.redacted(mask),
            custom_data: self
                .custom_data
                .iter()
                .map(|(kind, values)| {
                    (
                        kind.clone(),
                        values.iter().map(|v| v.redacted(mask)).collect(),
                    )
                })
                .collect(),
            is_redacted: true,
        }
    }
}

impl Redact for Contact {
    fn redacted(&self, mask: char) -> Self {
        Contact {
            display_name_primary: mask_opt(&self.display_name_primary, mask),
            display_name_alt: mask_opt(&self.display_name_alt, mask),
            raw_contacts: self.raw_contacts.redacted(mask),
            is_redacted: true,
            ..self.clone()
        }
    }
}

impl<F: Field> Redact for Predicate<F> {
    fn redacted(&self, mask: char) -> Self {
        self.redacted_with(mask)
    }
}

impl Redact for Expr {
    fn redacted(&self, mask: char) -> Self {
        Expr::redacted(self, mask)
    }
}
