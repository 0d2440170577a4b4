//! Photo side channel.
//!
//! Photo rows are never assembled with the other attributes. Their blob is
//! read and written here, one raw contact at a time.

use rolodex_proto::fields::{data, photo};
use rolodex_proto::{Field, Kind, Relation, Slot};
use tracing::{debug, warn};

use crate::config::QueryConfig;
use crate::error::Error;
use crate::query::read;
use crate::security::Permissions;
use crate::store::{BatchOperation, ContactsStore, Row, StoreQuery};

/// Reads and writes raw contact photos.
pub struct PhotoAccess<'a> {
    store: &'a dyn ContactsStore,
    permissions: &'a dyn Permissions,
    config: &'a QueryConfig,
}

impl<'a> PhotoAccess<'a> {
    pub fn new(
        store: &'a dyn ContactsStore,
        permissions: &'a dyn Permissions,
        config: &'a QueryConfig,
    ) -> Self {
        Self {
            store,
            permissions,
            config,
        }
    }

    /// Thumbnail bytes of a raw contact, if it has a photo and the caller
    /// may read.
    pub fn thumbnail(&self, raw_contact_id: i64) -> Result<Option<Vec<u8>>, Error> {
        if !self.permissions.can_read() {
            return Ok(None);
        }
        let query = StoreQuery::new(Relation::Data)
            .with_columns(vec![photo::THUMBNAIL.column()])
            .with_selection(
                data::RAW_CONTACT_ID
                    .equal_to(raw_contact_id)
                    .and(photo::THUMBNAIL.is_not_null())
                    .into_expr(),
            );
        let rows = read(self.store, &query, self.config.mask_char)?;
        Ok(rows
            .iter()
            .find_map(|r| r.get(photo::THUMBNAIL.column()).as_bytes().map(<[u8]>::to_vec)))
    }

    /// Replace the photo of a raw contact. Returns whether the write was
    /// applied.
    pub fn set_photo(&self, raw_contact_id: i64, thumbnail: Vec<u8>) -> Result<bool, Error> {
        if thumbnail.is_empty() {
            return Err(Error::InvalidArgument("photo must not be empty".into()));
        }
        if !self.permissions.can_write() {
            return Ok(false);
        }
        let size = thumbnail.len();
        let insert = BatchOperation::Insert {
            relation: Relation::Data,
            values: Row::new()
                .with(data::RAW_CONTACT_ID.column(), raw_contact_id)
                .with(data::MIMETYPE.column(), Kind::Photo.tag())
                .with(Slot::Data15.column(), thumbnail),
        };
        let applied = self
            .store
            .apply_batch(vec![remove_existing(raw_contact_id), insert])
            .is_some();
        if applied {
            debug!(raw_contact_id, bytes = size, "photo set");
        } else {
            warn!(raw_contact_id, "photo write failed");
        }
        Ok(applied)
    }

    /// Remove the photo of a raw contact. Returns whether the write was
    /// applied.
    pub fn remove_photo(&self, raw_contact_id: i64) -> bool {
        if !self.permissions.can_write() {
            return false;
        }
        let applied = self
            .store
            .apply_batch(vec![remove_existing(raw_contact_id)])
            .is_some();
        if !applied {
            warn!(raw_contact_id, "photo removal failed");
        }
        applied
    }
}

fn remove_existing(raw_contact_id: i64) -> BatchOperation {
    BatchOperation::Delete {
        relation: Relation::Data,
        selection: data::RAW_CONTACT_ID
            .equal_to(raw_contact_id)
            .and(data::MIMETYPE.equal_to(Kind::Photo.tag()))
            .into_expr(),
    }
}
