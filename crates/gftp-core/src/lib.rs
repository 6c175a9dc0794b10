//! gftp Core - Domain logic for the Google Drive file client
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `RemoteFile`, `RemoteId`, `MimeTypeTable`, typed errors
//! - **Port definitions** - `IRemoteStorage` and `ICredentialProvider`
//! - **Use cases** - `RemoteFileOperations` (list, find, upload, download, remove)
//! - **Configuration** - YAML-backed settings with validation
//!
//! # Architecture
//!
//! The domain module has no I/O. Ports define the trait interfaces that the
//! `gftp-drive` adapter crate implements, and the use case orchestrates a
//! single remote file operation through those ports.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
