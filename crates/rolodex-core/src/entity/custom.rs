//! Attribute values of kinds registered at runtime.

use std::any::Any;
use std::fmt;

use rolodex_proto::Kind;

use super::DataInfo;

/// An attribute value of a custom kind.
///
/// Implementors are usually plain structs; the object-safe helpers exist so
/// raw contacts holding custom values stay `Clone` and `PartialEq`.
pub trait CustomEntity: fmt::Debug + Send + Sync {
    fn kind(&self) -> Kind;

    fn info(&self) -> &DataInfo;

    fn is_blank(&self) -> bool;

    /// Copy with every string replaced by `mask` characters.
    fn redacted(&self, mask: char) -> Box<dyn CustomEntity>;

    fn clone_box(&self) -> Box<dyn CustomEntity>;

    fn as_any(&self) -> &dyn Any;

    fn dyn_eq(&self, other: &dyn CustomEntity) -> bool;
}

impl Clone for Box<dyn CustomEntity> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl PartialEq for Box<dyn CustomEntity> {
    fn eq(&self, other: &Self) -> bool {
        self.dyn_eq(other.as_ref())
    }
}
