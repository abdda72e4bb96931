//! Logger sessions: one open output file and its streams.

use std::path::{Path, PathBuf};

use h5stream_format::H5File;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::options::SessionOptions;
use crate::registry::{StreamHandle, StreamRegistry};
use crate::storage::Storage;

/// An open log file and the streams registered in it.
///
/// Sessions are single-writer: all operations take `&mut self`. The file is
/// released exactly once, by [`close`](Self::close) or on drop.
#[derive(Debug)]
pub struct LoggerSession<S: Storage = H5File> {
    storage: Option<S>,
    registry: StreamRegistry<S::Dataset>,
    options: SessionOptions,
    path: Option<PathBuf>,
}

impl LoggerSession<H5File> {
    /// Create (or truncate) the HDF5 file at `path` with default options.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::create_with(path, SessionOptions::default())
    }

    /// Create (or truncate) the HDF5 file at `path`.
    pub fn create_with(path: impl AsRef<Path>, options: SessionOptions) -> Result<Self> {
        let file = H5File::create(path)?;
        Ok(Self::with_storage(file, options))
    }
}

impl<S: Storage> LoggerSession<S> {
    /// Start a session on an already open storage backend.
    pub fn with_storage(storage: S, options: SessionOptions) -> Self {
        let path = storage.path().map(Path::to_path_buf);
        info!(path = ?path, axis = ?options.frame_axis, "opened logger session");
        Self {
            storage: Some(storage),
            registry: StreamRegistry::new(options.frame_axis),
            options,
            path,
        }
    }

    /// Declare a stream of `frame_count` frames shaped like `sample`.
    ///
    /// The leaf of `path` becomes the stream name used by
    /// [`append`](Self::append); intermediate groups are created as needed.
    ///
    /// With [`SessionOptions::flush_on_register`] set, a failed snapshot is
    /// returned as an error but the stream stays registered and writable.
    pub fn register<F: Frame + ?Sized>(
        &mut self,
        path: &str,
        sample: &F,
        frame_count: u64,
    ) -> Result<&StreamHandle<S::Dataset>> {
        let storage = self.storage.as_mut().ok_or(Error::SessionClosed)?;
        let handle = self.registry.register(storage, path, sample, frame_count)?;
        if self.options.flush_on_register {
            storage.flush()?;
        }
        Ok(handle)
    }

    /// Append one frame to stream `name`.
    pub fn append<F: Frame + ?Sized>(&mut self, name: &str, frame: &F) -> Result<()> {
        let storage = self.storage.as_mut().ok_or(Error::SessionClosed)?;
        self.registry.append(storage, name, frame)?;
        if self.options.sync_on_append {
            storage.sync_data()?;
        }
        Ok(())
    }

    /// Write a metadata snapshot so the file is readable as it stands.
    pub fn flush(&mut self) -> Result<()> {
        let storage = self.storage.as_mut().ok_or(Error::SessionClosed)?;
        storage.flush()?;
        debug!(path = ?self.path, streams = self.registry.len(), "flushed logger session");
        Ok(())
    }

    /// Finish the file and release it.
    ///
    /// The storage is released even when closing it fails; every later
    /// operation returns [`Error::SessionClosed`].
    pub fn close(&mut self) -> Result<()> {
        let storage = self.storage.take().ok_or(Error::SessionClosed)?;
        storage.close()?;
        info!(path = ?self.path, streams = self.registry.len(), "closed logger session");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.storage.is_none()
    }

    /// Path of the backing file, if the storage has one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// The registered stream named `name`.
    pub fn stream(&self, name: &str) -> Option<&StreamHandle<S::Dataset>> {
        self.registry.get(name)
    }

    /// All registered streams, ordered by name.
    pub fn streams(&self) -> impl Iterator<Item = &StreamHandle<S::Dataset>> {
        self.registry.iter()
    }

    /// The storage backend, while the session is open.
    pub fn storage(&self) -> Option<&S> {
        self.storage.as_ref()
    }

    pub fn storage_mut(&mut self) -> Option<&mut S> {
        self.storage.as_mut()
    }
}

impl<S: Storage> Drop for LoggerSession<S> {
    fn drop(&mut self) {
        if self.storage.is_none() {
            return;
        }
        warn!(path = ?self.path, "logger session dropped while open; closing");
        if let Err(e) = self.close() {
            warn!(path = ?self.path, error = %e, "failed to close logger session");
        }
    }
}
