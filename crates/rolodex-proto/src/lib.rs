//! Rolodex query IR.
//!
//! This crate defines the typed vocabulary used to query a contacts store
//! made of three relations: contacts, raw contacts and generic attribute
//! rows. It performs no I/O.
//!
//! # Modules
//!
//! - [`value`] - Runtime values held in row slots and predicate operands
//! - [`kind`] - Kind tags and the generic value slots they give meaning to
//! - [`field`] - Field descriptors and the three field families
//! - [`fields`] - Field constants for every relation and built-in kind
//! - [`predicate`] - Typed predicate trees and their store text
//! - [`order`] - Sort order and pagination
//! - [`error`] - Protocol error types

pub mod error;
pub mod field;
pub mod fields;
pub mod kind;
pub mod order;
pub mod predicate;
pub mod value;

pub use error::Error;

// Re-export commonly used types at crate root
pub use field::{ContactsField, DataField, Field, FieldDescriptor, RawContactsField, Relation};
pub use kind::{Kind, Slot};
pub use order::{OrderDirection, OrderSpec, Pagination};
pub use predicate::{where_and, where_or, CombineOp, Expr, MatchOp, Operand, Pattern, Predicate};
pub use value::Value;
