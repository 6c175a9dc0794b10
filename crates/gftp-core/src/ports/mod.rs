//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the core depends on; their implementations live
//! in adapter crates (`gftp-drive`).
//!
//! ## Ports Overview
//!
//! - [`IRemoteStorage`] - Remote file store operations (list, create, fetch, delete)
//! - [`ICredentialProvider`] - Supplies a valid bearer credential

pub mod credential_provider;
pub mod remote_storage;

pub use credential_provider::{Credential, ICredentialProvider};
pub use remote_storage::{ContentFormat, ContentSink, FileQuery, IRemoteStorage, NewFile};
