//! Capability-based access control.
//!
//! Every public entry point asks a [`Permissions`] implementation first.
//! Lacking a capability is not an error: the operation returns its empty
//! result without touching the store.

use std::collections::HashSet;
use std::fmt;

use crate::error::Error;

/// Capability identifiers for access control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Read contacts, raw contacts and attribute rows.
    Read,
    /// Insert, update and delete.
    Write,
    /// Implies every other capability.
    Admin,
}

impl Capability {
    /// Parse a capability from `read`, `write` or `admin`.
    pub fn parse(s: &str) -> Result<Self, Error> {
        match s.trim() {
            "read" => Ok(Capability::Read),
            "write" => Ok(Capability::Write),
            "admin" => Ok(Capability::Admin),
            other => Err(Error::InvalidArgument(format!(
                "unknown capability: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Read => write!(f, "read"),
            Capability::Write => write!(f, "write"),
            Capability::Admin => write!(f, "admin"),
        }
    }
}

/// Answers whether the caller may read or write the store.
pub trait Permissions: Send + Sync {
    fn can_read(&self) -> bool;

    fn can_write(&self) -> bool;
}

/// A set of granted capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    capabilities: HashSet<Capability>,
}

impl CapabilitySet {
    /// Create an empty capability set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_capabilities(caps: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            capabilities: caps.into_iter().collect(),
        }
    }

    /// Parse capabilities from string representations.
    pub fn from_strings(strings: &[&str]) -> Result<Self, Error> {
        let capabilities: Result<HashSet<Capability>, Error> =
            strings.iter().map(|s| Capability::parse(s)).collect();
        Ok(Self {
            capabilities: capabilities?,
        })
    }

    pub fn add(&mut self, cap: Capability) {
        self.capabilities.insert(cap);
    }

    pub fn contains(&self, cap: Capability) -> bool {
        self.capabilities.contains(&cap)
    }

    pub fn has_admin(&self) -> bool {
        self.contains(Capability::Admin)
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }
}

impl Permissions for CapabilitySet {
    fn can_read(&self) -> bool {
        self.has_admin() || self.contains(Capability::Read)
    }

    fn can_write(&self) -> bool {
        self.has_admin() || self.contains(Capability::Write)
    }
}

/// Grants everything. For tests and trusted callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Permissions for AllowAll {
    fn can_read(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_parse() {
        assert_eq!(Capability::parse("admin").unwrap(), Capability::Admin);
        assert_eq!(Capability::parse(" read ").unwrap(), Capability::Read);
        assert_eq!(Capability::parse("write").unwrap(), Capability::Write);
        assert!(matches!(
            Capability::parse("delete"),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(Capability::Write.to_string(), "write");
    }

    #[test]
    fn test_capability_set_read_only() {
        let caps = CapabilitySet::from_strings(&["read"]).unwrap();
        assert!(caps.can_read());
        assert!(!caps.can_write());
        assert_eq!(caps.len(), 1);
    }

    #[test]
    fn test_capability_set_admin_grants_all() {
        let caps = CapabilitySet::from_strings(&["admin"]).unwrap();
        assert!(caps.can_read());
        assert!(caps.can_write());
        assert!(caps.has_admin());
    }

    #[test]
    fn test_empty_set_denies() {
        let caps = CapabilitySet::new();
        assert!(caps.is_empty());
        assert!(!caps.can_read());
        assert!(!caps.can_write());
        assert!(CapabilitySet::from_strings(&["read", "nope"]).is_err());
    }

    #[test]
    fn test_allow_all() {
        assert!(AllowAll.can_read());
        assert!(AllowAll.can_write());
    }
}
