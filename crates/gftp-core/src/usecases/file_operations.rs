//! Remote file operations use case
//!
//! Implements the four user-facing operations on top of the
//! [`IRemoteStorage`] port: listing, uploading a local file, downloading a
//! file by name, and removing a file by name. Every port failure is converted
//! into a [`StorageError`] here, so callers only deal with typed outcomes.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{DownloadPolicy, NameResolution};
use crate::domain::{MimeTypeTable, RemoteFile, StorageError};
use crate::ports::{ContentFormat, ContentSink, FileQuery, IRemoteStorage, NewFile};

/// Page size used for name lookups
const LOOKUP_PAGE_SIZE: u32 = 10;

/// Settings that shape the behaviour of [`RemoteFileOperations`]
#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// Default number of files returned by a listing
    pub page_size: u32,
    /// Raw or export selection for downloads
    pub download_policy: DownloadPolicy,
    /// Handling of several files sharing a name
    pub name_resolution: NameResolution,
    /// Extension to MIME type table
    pub mime_types: MimeTypeTable,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            page_size: 10,
            download_policy: DownloadPolicy::default(),
            name_resolution: NameResolution::default(),
            mime_types: MimeTypeTable::default(),
        }
    }
}

/// Receives download progress as an integer percentage
pub trait ProgressSink: Send {
    fn report(&mut self, percent: u8);
}

impl<F> ProgressSink for F
where
    F: FnMut(u8) + Send,
{
    fn report(&mut self, percent: u8) {
        self(percent)
    }
}

/// Outcome of a successful download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    /// The remote object that was downloaded
    pub file: RemoteFile,
    /// Bytes written to the destination
    pub bytes_written: u64,
    /// Export MIME type, if the content was converted by the service
    pub exported_as: Option<String>,
}

/// Use case for operations on remote files
pub struct RemoteFileOperations {
    storage: Arc<dyn IRemoteStorage>,
    settings: StorageSettings,
}

impl RemoteFileOperations {
    /// Creates the use case over a storage adapter
    pub fn new(storage: Arc<dyn IRemoteStorage>, settings: StorageSettings) -> Self {
        Self { storage, settings }
    }

    /// Lists non-trashed files in service order
    ///
    /// `page_size` overrides the configured page size.
    ///
    /// # Errors
    ///
    /// [`StorageError::NoFilesFound`] when the listing is empty,
    /// [`StorageError::Transport`] when the service call fails.
    pub async fn list_files(&self, page_size: Option<u32>) -> Result<Vec<RemoteFile>, StorageError> {
        let query = FileQuery::all(page_size.unwrap_or(self.settings.page_size));
        debug!(page_size = query.page_size, "Listing files");

        let files = self.storage.list_files(&query).await.map_err(|e| {
            warn!(error = %format!("{e:#}"), "Listing failed");
            StorageError::transport(&e)
        })?;

        if files.is_empty() {
            info!("Listing returned no files");
            return Err(StorageError::NoFilesFound);
        }

        debug!(count = files.len(), "Listing complete");
        Ok(files)
    }

    /// Looks up a non-trashed file by exact name
    ///
    /// With [`NameResolution::FirstMatch`] the first match in service order
    /// wins. With [`NameResolution::RequireUnique`] several matches are an
    /// error.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<RemoteFile>, StorageError> {
        let query = FileQuery::by_name(name, LOOKUP_PAGE_SIZE);
        let mut matches = self.storage.list_files(&query).await.map_err(|e| {
            warn!(name, error = %format!("{e:#}"), "Name lookup failed");
            StorageError::transport(&e)
        })?;

        debug!(name, count = matches.len(), "Name lookup complete");

        if matches.len() > 1 && self.settings.name_resolution == NameResolution::RequireUnique {
            return Err(StorageError::AmbiguousName {
                name: name.to_string(),
                count: matches.len(),
            });
        }

        if matches.is_empty() {
            Ok(None)
        } else {
            Ok(Some(matches.swap_remove(0)))
        }
    }

    /// Uploads a local file as a new remote object
    ///
    /// The remote name is the final segment of `local_path` and the MIME type
    /// comes from the extension table. An existing object of the same name is
    /// never replaced; a second object is created next to it.
    pub async fn upload(&self, local_path: &Path) -> Result<RemoteFile, StorageError> {
        let local_io = |source: io::Error| StorageError::LocalIo {
            path: local_path.to_path_buf(),
            source,
        };

        let metadata = std::fs::metadata(local_path).map_err(local_io)?;
        if !metadata.is_file() {
            return Err(local_io(io::Error::other("not a regular file")));
        }
        // Surface permission problems before any request is made
        File::open(local_path).map_err(local_io)?;

        let name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| local_io(io::Error::other("file name is not valid UTF-8")))?
            .to_string();

        let new_file = NewFile {
            mime_type: self.settings.mime_types.for_name(&name).map(str::to_string),
            name,
        };

        info!(
            name = %new_file.name,
            mime_type = new_file.mime_type.as_deref().unwrap_or("-"),
            size = metadata.len(),
            "Uploading file"
        );

        let created = self
            .storage
            .create_file(&new_file, local_path)
            .await
            .map_err(|e| {
                warn!(name = %new_file.name, error = %format!("{e:#}"), "Upload failed");
                StorageError::transport(&e)
            })?;

        info!(id = %created.id, name = %created.name, "Upload complete");
        Ok(created)
    }

    /// Downloads the file named `remote_name` to `save_path`
    ///
    /// Content is staged in a temporary file next to `save_path` and renamed
    /// into place only once complete. On any error `save_path` is left as it
    /// was. Progress is reported as a non-decreasing percentage that ends at
    /// 100 before the rename.
    pub async fn download(
        &self,
        remote_name: &str,
        save_path: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<DownloadReport, StorageError> {
        let file = self
            .find_by_name(remote_name)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                name: remote_name.to_string(),
            })?;

        let format = self.content_format(&file, save_path)?;
        let exported_as = match &format {
            ContentFormat::Raw => None,
            ContentFormat::Export { mime_type } => Some(mime_type.clone()),
        };

        info!(
            id = %file.id,
            name = %file.name,
            destination = %save_path.display(),
            export = exported_as.as_deref().unwrap_or("-"),
            "Downloading file"
        );

        let local_io = |source: io::Error| StorageError::LocalIo {
            path: save_path.to_path_buf(),
            source,
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix(".gftp-").suffix(".part");
        // Created like a plain file so the umask applies
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }
        let mut staging = builder
            .tempfile_in(staging_dir(save_path))
            .map_err(local_io)?;

        let mut sink = FileProgressSink::new(staging.as_file_mut(), progress);
        let fetched = self
            .storage
            .fetch_content(&file.id, &format, &mut sink)
            .await;

        let bytes_written = match fetched {
            Ok(n) => n,
            Err(e) => {
                if let Some(source) = sink.io_error.take() {
                    warn!(destination = %save_path.display(), error = %source, "Local write failed");
                    return Err(local_io(source));
                }
                warn!(id = %file.id, error = %format!("{e:#}"), "Download failed");
                return Err(StorageError::transport(&e));
            }
        };
        sink.finish();

        let staged = staging.as_file_mut();
        staged.flush().map_err(local_io)?;
        // A replaced destination keeps its mode
        if let Ok(existing) = std::fs::metadata(save_path) {
            staged
                .set_permissions(existing.permissions())
                .map_err(local_io)?;
        }
        staged.sync_all().map_err(local_io)?;
        staging
            .persist(save_path)
            .map_err(|e| local_io(e.error))?;

        info!(
            id = %file.id,
            bytes = bytes_written,
            destination = %save_path.display(),
            "Download complete"
        );

        Ok(DownloadReport {
            file,
            bytes_written,
            exported_as,
        })
    }

    /// Permanently deletes the file named `remote_name`
    ///
    /// Returns the object that was deleted.
    pub async fn remove(&self, remote_name: &str) -> Result<RemoteFile, StorageError> {
        let file = self
            .find_by_name(remote_name)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                name: remote_name.to_string(),
            })?;

        info!(id = %file.id, name = %file.name, "Deleting file");

        self.storage.delete_file(&file.id).await.map_err(|e| {
            warn!(id = %file.id, error = %format!("{e:#}"), "Delete failed");
            StorageError::transport(&e)
        })?;

        Ok(file)
    }

    /// Picks raw transfer or export for `file` according to the policy
    fn content_format(
        &self,
        file: &RemoteFile,
        save_path: &Path,
    ) -> Result<ContentFormat, StorageError> {
        let export = match self.settings.download_policy {
            DownloadPolicy::Auto => file.is_native_document(),
            DownloadPolicy::Raw => false,
            DownloadPolicy::Export => true,
        };
        if !export {
            return Ok(ContentFormat::Raw);
        }

        let file_name = save_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        match self.settings.mime_types.for_name(file_name) {
            Some(mime) => Ok(ContentFormat::Export {
                mime_type: mime.to_string(),
            }),
            None => Err(StorageError::UnsupportedExport {
                extension: MimeTypeTable::extension_key(file_name).to_string(),
            }),
        }
    }
}

/// Directory the staging file is created in: the destination's parent
fn staging_dir(save_path: &Path) -> PathBuf {
    match save_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Writes chunks to the staging file and turns byte counts into percentages
struct FileProgressSink<'a> {
    file: &'a mut File,
    progress: &'a mut dyn ProgressSink,
    received: u64,
    last_percent: Option<u8>,
    io_error: Option<io::Error>,
}

impl<'a> FileProgressSink<'a> {
    fn new(file: &'a mut File, progress: &'a mut dyn ProgressSink) -> Self {
        Self {
            file,
            progress,
            received: 0,
            last_percent: None,
            io_error: None,
        }
    }

    fn emit(&mut self, percent: u8) {
        // Non-decreasing
        if self.last_percent.map_or(true, |last| percent > last) {
            self.last_percent = Some(percent);
            self.progress.report(percent);
        }
    }

    /// Reports 100 if the stream ended below it
    fn finish(&mut self) {
        self.emit(100);
    }
}

impl ContentSink for FileProgressSink<'_> {
    fn write_chunk(&mut self, chunk: &[u8], total_len: Option<u64>) -> io::Result<()> {
        if let Err(e) = self.file.write_all(chunk) {
            let kind = e.kind();
            self.io_error = Some(e);
            return Err(io::Error::new(kind, "writing to the staging file failed"));
        }
        self.received += chunk.len() as u64;

        if let Some(total) = total_len.filter(|t| *t > 0) {
            let percent = (self.received.saturating_mul(100) / total).min(100) as u8;
            self.emit(percent);
        }
        Ok(())
    }
}
