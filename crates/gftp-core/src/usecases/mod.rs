//! Use cases (interactors) for gftp
//!
//! Use cases are thin coordinators that delegate business rules to domain
//! methods and I/O to ports.
//!
//! ## Use Cases
//!
//! - [`RemoteFileOperations`] - List, find, upload, download and remove remote files

pub mod file_operations;

pub use file_operations::{DownloadReport, ProgressSink, RemoteFileOperations, StorageSettings};
