//! Access control and redaction.

pub mod capability;
pub mod redact;

pub use capability::{AllowAll, Capability, CapabilitySet, Permissions};
pub use redact::{redact, Redact};
