//! Integration tests for resolution, assembly, redaction and the write side
//! channels.

use std::any::Any;
use std::cell::Cell;
use std::sync::Arc;

use rolodex_core::entity::DataInfo;
use rolodex_core::query::{DataRow, Include};
use rolodex_core::{
    Account, CapabilitySet, Candidates, Contacts, ContactsQuery, ContactsStore, CountRestriction,
    CustomEntity, CustomKindHandler, Error, IdSet, Includes, KindRegistry, MemoryStore,
    QueryConfig, Row, Selection, StoreQuery,
};
use rolodex_proto::fields::{contacts, data, email, name, phone, raw_contacts};
use rolodex_proto::{DataField, Field, Kind, OrderSpec, Relation, Slot};

const LANGUAGE: Kind = Kind::custom("vnd.rolodex.item/language");
const LANGUAGE_NAME: DataField = DataField::new(LANGUAGE, Slot::Data1);

#[derive(Debug, Clone, PartialEq)]
struct Language {
    info: DataInfo,
    name: Option<String>,
}

impl CustomEntity for Language {
    fn kind(&self) -> Kind {
        LANGUAGE
    }

    fn info(&self) -> &DataInfo {
        &self.info
    }

    fn is_blank(&self) -> bool {
        self.name.as_deref().map_or(true, |s| s.trim().is_empty())
    }

    fn redacted(&self, mask: char) -> Box<dyn CustomEntity> {
        Box::new(Language {
            info: DataInfo {
                is_redacted: true,
                ..self.info.clone()
            },
            name: self
                .name
                .as_deref()
                .map(|s| rolodex_proto::value::mask_str(s, mask)),
        })
    }

    fn clone_box(&self) -> Box<dyn CustomEntity> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn CustomEntity) -> bool {
        other.as_any().downcast_ref::<Language>() == Some(self)
    }
}

struct LanguageHandler;

impl CustomKindHandler for LanguageHandler {
    fn kind(&self) -> Kind {
        LANGUAGE
    }

    fn fields(&self) -> Vec<DataField> {
        vec![LANGUAGE_NAME]
    }

    fn count_restriction(&self) -> CountRestriction {
        CountRestriction::NoLimit
    }

    fn map(&self, row: &DataRow<'_>) -> Box<dyn CustomEntity> {
        Box::new(Language {
            info: row.info(),
            name: row.text(&LANGUAGE_NAME),
        })
    }
}

struct TestContext {
    store: Arc<MemoryStore>,
    contacts: Contacts,
}

impl TestContext {
    fn new() -> Self {
        Self::with_config(QueryConfig::default())
    }

    fn with_config(config: QueryConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let mut registry = KindRegistry::new();
        registry.register(LanguageHandler).unwrap();
        let contacts = Contacts::new(store.clone())
            .with_registry(registry)
            .with_config(config);
        Self { store, contacts }
    }

    fn person(&self, given: &str, account: Option<&Account>) -> i64 {
        let raw = self.store.insert_raw_contact(account);
        self.store
            .insert_data(raw, &Kind::Name, &[(Slot::Data2, given.into())])
            .unwrap();
        raw
    }

    fn add(&self, raw: i64, kind: &Kind, data1: &str) -> i64 {
        self.store
            .insert_data(raw, kind, &[(Slot::Data1, data1.into())])
            .unwrap()
    }

    fn contact_ids(&self, query: &ContactsQuery) -> Vec<i64> {
        self.contacts
            .find(query)
            .unwrap()
            .contacts
            .iter()
            .map(|c| c.id)
            .collect()
    }

    fn rows(&self, relation: Relation) -> Vec<Result<Row, Error>> {
        self.store
            .query(&StoreQuery::new(relation))
            .unwrap()
            .collect()
    }
}

#[test]
fn test_kind_guard_on_shared_slots() {
    // phone number and email address both live in data1
    let text = phone::NUMBER.equal_to("555").to_string();
    assert!(text.contains("mimetype = 'vnd.android.cursor.item/phone_v2'"));
    assert!(!text.contains("email_v2"));

    let ctx = TestContext::new();
    let raw = ctx.person("Ann", None);
    ctx.add(raw, &Kind::Email, "555");
    let other = ctx.person("Bob", None);
    ctx.add(other, &Kind::Phone, "555");

    let ids = ctx.contact_ids(&ContactsQuery::new().where_data(phone::NUMBER.equal_to("555")));
    assert_eq!(ids, vec![2]);
}

#[test]
fn test_union_then_restrict() {
    let ctx = TestContext::with_config(QueryConfig::default().with_include_blanks(true));
    let gmail = Account::new("me@gmail.com", "com.google");
    let work = Account::new("me@work.io", "io.work");
    let r1 = ctx.person("Ann", Some(&gmail));
    ctx.add(r1, &Kind::Email, "ann@x.io");
    let r2 = ctx.person("Bob", Some(&work));
    ctx.add(r2, &Kind::Email, "bob@x.io");
    ctx.store.insert_raw_contact(Some(&gmail));

    let data_predicate = email::ADDRESS
        .ends_with("@x.io")
        .or(data::ACCOUNT_NAME.equal_to("me@gmail.com"));
    let selection = Selection::new().with_data(data_predicate);
    assert_eq!(
        ctx.contacts.split(&selection, &|| false).unwrap(),
        Candidates::Only(IdSet::from([1, 2, 3]))
    );

    let narrowed = selection.with_raw_contacts(raw_contacts::ACCOUNT_TYPE.equal_to("com.google"));
    assert_eq!(
        ctx.contacts.split(&narrowed, &|| false).unwrap(),
        Candidates::Only(IdSet::from([1, 3]))
    );
}

#[test]
fn test_pagination_pages_do_not_overlap() {
    let ctx = TestContext::new();
    for i in 0..15 {
        ctx.person(&format!("Person {:02}", i), None);
    }

    let first = ctx.contact_ids(&ContactsQuery::new().limit(10));
    let second = ctx.contact_ids(&ContactsQuery::new().limit(10).offset(10));
    assert_eq!(first, (1..=10).collect::<Vec<_>>());
    assert_eq!(second, (11..=15).collect::<Vec<_>>());
}

#[test]
fn test_pagination_skips_blank_contacts() {
    let ctx = TestContext::new();
    for i in 0..16 {
        if i == 4 {
            ctx.store.insert_raw_contact(None);
        } else {
            ctx.person(&format!("Person {:02}", i), None);
        }
    }

    let first = ctx.contact_ids(&ContactsQuery::new().limit(10));
    let second = ctx.contact_ids(&ContactsQuery::new().limit(10).offset(10));
    assert_eq!(first.len(), 10);
    assert_eq!(second.len(), 5);
    assert!(!first.contains(&5) && !second.contains(&5));
    assert_eq!(first.last(), Some(&11));
}

#[test]
fn test_pagination_with_non_compliant_store() {
    let store = Arc::new(MemoryStore::new().ignoring_pagination());
    for _ in 0..15 {
        let raw = store.insert_raw_contact(None);
        store
            .insert_data(raw, &Kind::Note, &[(Slot::Data1, "n".into())])
            .unwrap();
    }
    let contacts = Contacts::new(store.clone());

    let result = contacts.find(&ContactsQuery::new().limit(10).offset(10)).unwrap();
    assert!(result.limit_breached);
    assert_eq!(result.len(), 5);
    assert_eq!(result.contacts[0].id, 11);

    let unforced = contacts.with_config(QueryConfig::default().with_force_offset_and_limit(false));
    let result = unforced.find(&ContactsQuery::new().limit(10)).unwrap();
    assert!(result.limit_breached);
    assert_eq!(result.len(), 15);
}

#[test]
fn test_assembly_completeness() {
    let ctx = TestContext::new();
    let raw = ctx.person("Ann", None);
    for number in ["555-0103", "555-0101", "555-0102"] {
        ctx.add(raw, &Kind::Phone, number);
    }

    let result = ctx.contacts.find(&ContactsQuery::new()).unwrap();
    let assembled = &result.contacts[0].raw_contacts[0];
    let numbers: Vec<_> = assembled
        .phones
        .iter()
        .map(|p| p.number.as_deref().unwrap())
        .collect();
    assert_eq!(numbers, vec!["555-0103", "555-0101", "555-0102"]);
    let ids: Vec<_> = assembled.phones.iter().map(|p| p.info.lifecycle.id()).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(
        assembled.name.as_ref().and_then(|n| n.given_name.as_deref()),
        Some("Ann")
    );
}

#[test]
fn test_blank_raw_contacts() {
    let ctx = TestContext::new();
    ctx.person("Ann", None);
    let blank = ctx.store.insert_raw_contact(None);
    ctx.add(blank, &Kind::Phone, "");
    ctx.add(blank, &Kind::Note, "   ");

    let ids = ctx.contact_ids(&ContactsQuery::new());
    assert_eq!(ids, vec![1]);

    let with_blanks = ctx
        .contacts
        .clone()
        .with_config(QueryConfig::default().with_include_blanks(true));
    let result = with_blanks.find(&ContactsQuery::new()).unwrap();
    assert_eq!(result.len(), 2);
    let raw = &result.contacts[1].raw_contacts[0];
    assert_eq!(raw.id, blank);
    assert!(raw.is_blank());
    assert_eq!(raw.phones.len(), 1);
}

#[test]
fn test_redaction_preserves_shape() {
    let ctx = TestContext::new();
    let raw = ctx.person("Zoë", Some(&Account::new("me@x.io", "com.x")));
    ctx.add(raw, &Kind::Phone, "555-0101");
    ctx.add(raw, &Kind::Email, "zoe@x.io");
    ctx.add(raw, &LANGUAGE, "Welsh");

    let result = ctx.contacts.find(&ContactsQuery::new()).unwrap();
    let original = &result.contacts[0];
    let once = ctx.contacts.redact(original);
    let twice = ctx.contacts.redact(&once);
    assert_eq!(once, twice);

    assert_eq!(once.id, original.id);
    assert_eq!(once.raw_contacts.len(), original.raw_contacts.len());
    let redacted_raw = &once.raw_contacts[0];
    assert_eq!(redacted_raw.phones.len(), 1);
    assert_eq!(redacted_raw.emails.len(), 1);
    assert_eq!(redacted_raw.custom(&LANGUAGE).len(), 1);
    assert_eq!(redacted_raw.emails[0].address.as_deref(), Some("********"));
    assert_eq!(
        redacted_raw.name.as_ref().and_then(|n| n.given_name.as_deref()),
        Some("***")
    );
    assert_eq!(
        redacted_raw.phones[0].info.lifecycle,
        original.raw_contacts[0].phones[0].info.lifecycle
    );
    let language = redacted_raw.custom(&LANGUAGE)[0]
        .as_any()
        .downcast_ref::<Language>()
        .unwrap();
    assert_eq!(language.name.as_deref(), Some("*****"));

    let predicate = ctx.contacts.redact(&email::ADDRESS.equal_to("zoe@x.io"));
    assert!(predicate.to_string().contains("'********'"));
}

#[test]
fn test_cancellation_mid_assembly() {
    let ctx = TestContext::new();
    for given in ["Ann", "Bob", "Cy"] {
        let raw = ctx.person(given, None);
        ctx.add(raw, &Kind::Phone, "555");
    }
    let total_rows = 3 + 3 + 6;

    for stop_after in 0..=total_rows {
        let consumed = Cell::new(0);
        let cancel = || {
            consumed.set(consumed.get() + 1);
            consumed.get() > stop_after
        };
        let contacts = ctx
            .contacts
            .assemble(
                ctx.rows(Relation::Contacts),
                ctx.rows(Relation::RawContacts),
                ctx.rows(Relation::Data),
                &Includes::default(),
                &cancel,
            )
            .unwrap();
        if stop_after < total_rows {
            assert!(contacts.is_empty(), "partial result after {} rows", stop_after);
        } else {
            assert_eq!(contacts.len(), 3);
            assert!(contacts
                .iter()
                .all(|c| c.raw_contacts[0].phones.len() == 1 && c.raw_contacts[0].name.is_some()));
        }
    }
}

#[test]
fn test_cancellation_before_resolution() {
    let ctx = TestContext::new();
    ctx.person("Ann", None);
    let result = ctx.contacts.resolve(&ContactsQuery::new(), &|| true).unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_custom_kind_query_and_assembly() {
    let ctx = TestContext::new();
    let ann = ctx.person("Ann", None);
    ctx.add(ann, &LANGUAGE, "Welsh");
    ctx.add(ann, &LANGUAGE, "Breton");
    let bob = ctx.person("Bob", None);
    ctx.add(bob, &LANGUAGE, "Basque");
    ctx.add(bob, &Kind::custom("vnd.other.item/unknown"), "ignored");

    let ids = ctx.contact_ids(&ContactsQuery::new().where_data(LANGUAGE_NAME.equal_to("Breton")));
    assert_eq!(ids, vec![1]);

    let result = ctx.contacts.find(&ContactsQuery::new()).unwrap();
    assert_eq!(result.contacts[0].raw_contacts[0].custom(&LANGUAGE).len(), 2);
    let bob = &result.contacts[1].raw_contacts[0];
    assert_eq!(bob.custom(&LANGUAGE).len(), 1);
    assert_eq!(bob.custom_data.len(), 1);
}

#[test]
fn test_cross_kind_and() {
    let ctx = TestContext::new();
    let ann = ctx.person("Ann", None);
    ctx.add(ann, &Kind::Email, "ann@x.io");
    ctx.add(ann, &Kind::Phone, "555-0101");
    let bob = ctx.person("Bob", None);
    ctx.add(bob, &Kind::Email, "bob@x.io");

    let query = ContactsQuery::new().where_data(
        email::ADDRESS
            .ends_with("@x.io")
            .and(phone::NUMBER.starts_with("555")),
    );
    assert_eq!(ctx.contact_ids(&query), vec![1]);
}

#[test]
fn test_include_restricts_values() {
    let ctx = TestContext::new();
    let raw = ctx.person("Ann", None);
    ctx.add(raw, &Kind::Email, "ann@x.io");

    let query = ContactsQuery::new().include(Include::only([name::GIVEN_NAME]));
    let result = ctx.contacts.find(&query).unwrap();
    let assembled = &result.contacts[0].raw_contacts[0];
    assert_eq!(
        assembled.name.as_ref().and_then(|n| n.given_name.as_deref()),
        Some("Ann")
    );
    assert!(assembled.emails.iter().all(|e| e.address.is_none()));
}

#[test]
fn test_search_and_order() {
    let ctx = TestContext::new();
    ctx.person("Ann", None);
    ctx.person("Anna", None);
    ctx.person("Bob", None);

    let query = ContactsQuery::new()
        .search("ann")
        .order_by(OrderSpec::desc(contacts::DISPLAY_NAME_PRIMARY));
    assert_eq!(ctx.contact_ids(&query), vec![2, 1]);
}

#[test]
fn test_contacts_predicate() {
    let ctx = TestContext::new();
    ctx.person("Ann", None);
    ctx.person("Bob", None);
    ctx.store.set_starred(2, true).unwrap();

    let query = ContactsQuery::new().where_contacts(contacts::STARRED.equal_to(true));
    assert_eq!(ctx.contact_ids(&query), vec![2]);
}

#[test]
fn test_photo_side_channel() {
    let ctx = TestContext::new();
    let raw = ctx.person("Ann", None);
    let photos = ctx.contacts.photos();
    assert!(photos.set_photo(raw, vec![0x89, 0x50, 0x4e, 0x47]).unwrap());
    assert_eq!(
        photos.thumbnail(raw).unwrap(),
        Some(vec![0x89, 0x50, 0x4e, 0x47])
    );

    let result = ctx.contacts.find(&ContactsQuery::new()).unwrap();
    let contact = &result.contacts[0];
    assert!(contact.photo_thumbnail_uri.is_some());
    assert!(!contact.raw_contacts[0].is_blank());

    assert!(photos.remove_photo(raw));
    assert_eq!(photos.thumbnail(raw).unwrap(), None);
}

#[test]
fn test_delete_last_raw_contact_removes_contact() {
    let ctx = TestContext::new();
    let ann = ctx.person("Ann", None);
    let bob = ctx.person("Bob", None);
    ctx.store.insert_raw_contact_into(2, None).unwrap();

    let result = ctx.contacts.delete().raw_contacts(&[ann, bob]);
    assert!(result.is_successful());
    assert_eq!(ctx.contact_ids(&ContactsQuery::new()), Vec::<i64>::new());
    assert_eq!(ctx.store.contact_count(), 1);

    let result = ctx.contacts.delete().contacts(&[2]);
    assert!(result.is_successful_for(2));
    assert_eq!(ctx.store.contact_count(), 0);
}

#[test]
fn test_permissions_gate_every_entry_point() {
    let ctx = TestContext::new();
    let raw = ctx.person("Ann", None);
    ctx.store.clear_journal();

    let denied = ctx
        .contacts
        .clone()
        .with_permissions(Arc::new(CapabilitySet::new()));
    assert!(denied.find(&ContactsQuery::new()).unwrap().is_empty());
    assert_eq!(
        denied.split(&Selection::new(), &|| false).unwrap(),
        Candidates::Only(IdSet::new())
    );
    assert_eq!(denied.photos().thumbnail(raw).unwrap(), None);
    assert!(!denied.delete().raw_contacts(&[raw]).is_successful());
    assert_eq!(ctx.store.query_count(), 0);
    assert_eq!(ctx.store.contact_count(), 1);

    let reader = ctx
        .contacts
        .clone()
        .with_permissions(Arc::new(CapabilitySet::from_strings(&["read"]).unwrap()));
    assert_eq!(reader.find(&ContactsQuery::new()).unwrap().len(), 1);
    assert!(!reader.delete().raw_contacts(&[raw]).is_successful());
}

#[test]
fn test_store_failure_propagates() {
    let ctx = TestContext::new();
    ctx.person("Ann", None);
    ctx.store.set_available(false);

    let err = ctx
        .contacts
        .find(&ContactsQuery::new().where_data(name::GIVEN_NAME.equal_to("Ann")))
        .unwrap_err();
    assert!(matches!(err, Error::Store(_)));
}

#[test]
fn test_invalid_pagination_rejected() {
    let ctx = TestContext::new();
    ctx.person("Ann", None);
    ctx.store.clear_journal();

    let err = ctx.contacts.find(&ContactsQuery::new().limit(-1)).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert_eq!(ctx.store.query_count(), 0);
}

#[test]
fn test_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rolodex.json");
    std::fs::write(&path, r##"{"include_blanks": true, "mask_char": "#"}"##).unwrap();

    let config = QueryConfig::load(&path).unwrap();
    assert!(config.include_blanks);
    assert_eq!(config.mask_char, '#');
    assert!(config.force_offset_and_limit);

    let ctx = TestContext::with_config(config);
    let predicate = ctx.contacts.redact(&name::GIVEN_NAME.equal_to("Ann"));
    assert!(predicate.to_string().contains("'###'"));
}
