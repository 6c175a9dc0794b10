//! Domain entities and value types
//!
//! - Newtypes for validated identifiers
//! - Remote file metadata
//! - The extension to MIME type table
//! - Domain and operation error types

pub mod errors;
pub mod mime_types;
pub mod newtypes;
pub mod remote_file;

pub use errors::{DomainError, StorageError};
pub use mime_types::MimeTypeTable;
pub use newtypes::RemoteId;
pub use remote_file::RemoteFile;
