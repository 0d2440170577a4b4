//! Writes outside the query pipeline: photos and deletion.

mod delete;
mod photo;

pub use delete::{Delete, DeleteResult};
pub use photo::PhotoAccess;
