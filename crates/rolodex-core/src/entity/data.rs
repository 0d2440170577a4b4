//! Typed attribute values, one struct per built-in kind.
//!
//! `type_code` and `label` slots never count towards blankness: a phone with
//! a type but no number is still blank.

use super::{blank, DataEntity, DataInfo};

macro_rules! data_entity {
    ($ty:ident { $($text:ident),* $(; $($other:ident),*)? }) => {
        impl DataEntity for $ty {
            fn info(&self) -> &DataInfo {
                &self.info
            }

            fn is_blank(&self) -> bool {
                true $(&& blank(&self.$text))* $($(&& self.$other.is_none())*)?
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Address {
    pub info: DataInfo,
    pub type_code: Option<i64>,
    pub label: Option<String>,
    pub formatted_address: Option<String>,
    pub street: Option<String>,
    pub po_box: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
}

data_entity!(Address {
    formatted_address,
    street,
    po_box,
    neighborhood,
    city,
    region,
    postcode,
    country
});

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Email {
    pub info: DataInfo,
    pub type_code: Option<i64>,
    pub label: Option<String>,
    pub address: Option<String>,
}

data_entity!(Email { address });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    pub info: DataInfo,
    pub type_code: Option<i64>,
    pub label: Option<String>,
    /// `yyyy-MM-dd`, or `--MM-dd` when the year is unknown.
    pub date: Option<String>,
}

data_entity!(Event { date });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupMembership {
    pub info: DataInfo,
    pub group_id: Option<i64>,
}

data_entity!(GroupMembership { ; group_id });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Im {
    pub info: DataInfo,
    pub protocol: Option<i64>,
    pub custom_protocol: Option<String>,
    pub data: Option<String>,
}

data_entity!(Im { data });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Name {
    pub info: DataInfo,
    pub display_name: Option<String>,
    pub given_name: Option<String>,
    pub middle_name: Option<String>,
    pub family_name: Option<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub phonetic_given_name: Option<String>,
    pub phonetic_middle_name: Option<String>,
    pub phonetic_family_name: Option<String>,
}

data_entity!(Name {
    display_name,
    given_name,
    middle_name,
    family_name,
    prefix,
    suffix,
    phonetic_given_name,
    phonetic_middle_name,
    phonetic_family_name
});

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Nickname {
    pub info: DataInfo,
    pub name: Option<String>,
}

data_entity!(Nickname { name });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Note {
    pub info: DataInfo,
    pub note: Option<String>,
}

data_entity!(Note { note });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Organization {
    pub info: DataInfo,
    pub company: Option<String>,
    pub title: Option<String>,
    pub department: Option<String>,
    pub job_description: Option<String>,
    pub office_location: Option<String>,
    pub symbol: Option<String>,
    pub phonetic_name: Option<String>,
}

data_entity!(Organization {
    company,
    title,
    department,
    job_description,
    office_location,
    symbol,
    phonetic_name
});

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Phone {
    pub info: DataInfo,
    pub type_code: Option<i64>,
    pub label: Option<String>,
    pub number: Option<String>,
    pub normalized_number: Option<String>,
}

data_entity!(Phone { number, normalized_number });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Relation {
    pub info: DataInfo,
    pub type_code: Option<i64>,
    pub label: Option<String>,
    pub name: Option<String>,
}

data_entity!(Relation { name });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SipAddress {
    pub info: DataInfo,
    pub sip_address: Option<String>,
}

data_entity!(SipAddress { sip_address });

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Website {
    pub info: DataInfo,
    pub url: Option<String>,
}

data_entity!(Website { url });
