//! Rolodex Core - predicate resolution and entity assembly over a contacts
//! store.
//!
//! The store keeps three relations: contacts, raw contacts and generic
//! attribute rows tagged with a kind. This crate resolves typed predicates
//! over those relations into candidate contact ids, reads the matching rows
//! and folds them into [`Contact`] values.
//!
//! # Modules
//!
//! - [`store`] - The store collaborator and an in-memory reference store
//! - [`query`] - Id resolution, projection, pagination and assembly
//! - [`entity`] - Typed result graph
//! - [`security`] - Capability checks and redaction
//! - [`mutation`] - Photo access and deletion
//! - [`config`] - Query configuration

pub mod config;
pub mod entity;
pub mod error;
pub mod mutation;
pub mod query;
pub mod security;
pub mod store;

use std::sync::Arc;

pub use config::QueryConfig;
pub use entity::{Account, Contact, CustomEntity, Lifecycle, RawContact};
pub use error::Error;
pub use mutation::{Delete, DeleteResult, PhotoAccess};
pub use query::{
    Candidates, ContactsQuery, CountRestriction, CustomKindHandler, Include, Includes,
    KindRegistry, QueryResult, Selection,
};
pub use security::{AllowAll, Capability, CapabilitySet, Permissions, Redact};
pub use store::{
    BatchOperation, BatchOutcome, ContactsStore, IdSet, MemoryStore, Row, StoreQuery,
};

/// Re-export protocol types.
pub use rolodex_proto as proto;

use query::{CancelCheck, IdResolver, QueryExecutor};

/// Entry point bundling a store, the kind registry, configuration and the
/// caller's permissions.
///
/// Cheap to clone. Every method checks permissions before the store is
/// touched and returns an empty result when they are missing.
#[derive(Clone)]
pub struct Contacts {
    store: Arc<dyn ContactsStore>,
    registry: Arc<KindRegistry>,
    config: QueryConfig,
    permissions: Arc<dyn Permissions>,
}

impl Contacts {
    pub fn new(store: Arc<dyn ContactsStore>) -> Self {
        Self {
            store,
            registry: Arc::new(KindRegistry::default()),
            config: QueryConfig::default(),
            permissions: Arc::new(AllowAll),
        }
    }

    pub fn with_registry(mut self, registry: KindRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_permissions(mut self, permissions: Arc<dyn Permissions>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    /// Resolve, paginate and assemble.
    pub fn resolve(
        &self,
        query: &ContactsQuery,
        cancel: CancelCheck<'_>,
    ) -> Result<QueryResult, Error> {
        if !self.permissions.can_read() {
            return Ok(QueryResult::empty());
        }
        QueryExecutor::new(self.store.as_ref(), &self.registry, &self.config).execute(query, cancel)
    }

    /// [`Contacts::resolve`] without cancellation.
    pub fn find(&self, query: &ContactsQuery) -> Result<QueryResult, Error> {
        self.resolve(query, &|| false)
    }

    /// Candidate contact ids of a selection.
    pub fn split(
        &self,
        selection: &Selection,
        cancel: CancelCheck<'_>,
    ) -> Result<Candidates, Error> {
        if !self.permissions.can_read() {
            return Ok(Candidates::Only(IdSet::new()));
        }
        IdResolver::new(self.store.as_ref(), &self.config).resolve(selection, cancel)
    }

    /// Assemble contacts from rows read elsewhere.
    pub fn assemble(
        &self,
        contact_rows: impl IntoIterator<Item = Result<Row, Error>>,
        raw_contact_rows: impl IntoIterator<Item = Result<Row, Error>>,
        data_rows: impl IntoIterator<Item = Result<Row, Error>>,
        includes: &Includes,
        cancel: CancelCheck<'_>,
    ) -> Result<Vec<Contact>, Error> {
        if !self.permissions.can_read() {
            return Ok(Vec::new());
        }
        query::assemble(
            &self.registry,
            includes,
            self.config.include_blanks,
            contact_rows,
            raw_contact_rows,
            data_rows,
            cancel,
        )
    }

    /// Redacted copy of a contact graph or predicate, masked with the
    /// configured character.
    pub fn redact<T: Redact>(&self, value: &T) -> T {
        security::redact(value, self.config.mask_char)
    }

    pub fn photos(&self) -> PhotoAccess<'_> {
        PhotoAccess::new(self.store.as_ref(), self.permissions.as_ref(), &self.config)
    }

    pub fn delete(&self) -> Delete<'_> {
        Delete::new(self.store.as_ref(), self.permissions.as_ref())
    }
}

impl std::fmt::Debug for Contacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contacts")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
