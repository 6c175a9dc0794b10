//! Drive implementation of the remote storage port
//!
//! Wraps [`DriveClient`] and delegates to the [`files`](crate::files) and
//! [`upload`](crate::upload) modules.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use gftp_core::domain::{RemoteFile, RemoteId};
use gftp_core::ports::{ContentFormat, ContentSink, FileQuery, IRemoteStorage, NewFile};

use crate::client::DriveClient;
use crate::{files, upload};

/// [`IRemoteStorage`] backed by the Drive v3 API
pub struct DriveStorage {
    client: DriveClient,
}

impl DriveStorage {
    pub fn new(client: DriveClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client
    pub fn client(&self) -> &DriveClient {
        &self.client
    }
}

#[async_trait]
impl IRemoteStorage for DriveStorage {
    async fn list_files(&self, query: &FileQuery) -> Result<Vec<RemoteFile>> {
        files::list_files(&self.client, query).await
    }

    async fn create_file(&self, file: &NewFile, source: &Path) -> Result<RemoteFile> {
        upload::upload_file(&self.client, file, source).await
    }

    async fn fetch_content(
        &self,
        id: &RemoteId,
        format: &ContentFormat,
        sink: &mut dyn ContentSink,
    ) -> Result<u64> {
        files::fetch_content(&self.client, id, format, sink).await
    }

    async fn delete_file(&self, id: &RemoteId) -> Result<()> {
        files::delete_file(&self.client, id).await
    }
}
