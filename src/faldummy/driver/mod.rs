//! # Dummy Driver
//!
//! [`DummyDriver`] wraps a real [`StorageDriver`] and answers for files that
//! the host has indexed as images but that are missing from the volume. For
//! those it serves a placeholder: a bundled `<ext>.<ext>` dummy file when
//! local files are preferred and one exists, otherwise an image from a remote
//! placeholder service sized like the original (bounded by the configured
//! maxima). Everything else passes through to the real driver untouched.
//!
//! ```text
//! call ──► gate ──┬── Delegate ──► real driver
//!                 └── Intercept(record) ──► placeholder resolver
//! ```
//!
//! ## Re-entrancy
//!
//! The index may probe the driver for existence while resolving a record
//! (the host flags missing files that way). That probe lands in
//! [`DummyDriver::file_exists`], which would run the gate again, which would
//! look the record up again. To cut the loop, the lookup runs under a
//! `ProbeGuard`: while it is held, `file_exists` answers `true` without
//! consulting the gate. The guard is released on drop, so the flag is cleared
//! on every exit path, including errors and panics.
//!
//! The flag is a `Cell`, which makes the driver `!Sync`: one driver instance
//! serves one thread, and concurrent requests can never observe each
//! other's guard.

use crate::config::DriverConfig;
use crate::error::{DriverError, Result};
use crate::fetch::HttpFetcher;
use crate::hash::HashAlgorithm;
use crate::index::FileIndex;
use crate::model::{basename, FolderInfo, IndexedFileRecord, Permissions};
use crate::store::StorageDriver;
use std::cell::Cell;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::warn;

pub mod dimensions;
pub mod gate;
pub mod placeholder;

pub use gate::{DelegateReason, Route};
pub use placeholder::{DummyAsset, PlaceholderResolver};

/// Holds the probe flag for the duration of an index lookup.
struct ProbeGuard<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> ProbeGuard<'a> {
    fn engage(flag: &'a Cell<bool>) -> Self {
        let previous = flag.replace(true);
        Self { flag, previous }
    }
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

/// Storage driver decorator serving placeholders for missing indexed images.
pub struct DummyDriver<D, I, F> {
    real: D,
    index: I,
    placeholders: PlaceholderResolver<F>,
    probing: Cell<bool>,
}

impl<D, I, F> DummyDriver<D, I, F>
where
    D: StorageDriver,
    I: FileIndex,
    F: HttpFetcher,
{
    pub fn new(real: D, index: I, fetcher: F, config: DriverConfig) -> Self {
        Self {
            real,
            index,
            placeholders: PlaceholderResolver::new(config, fetcher),
            probing: Cell::new(false),
        }
    }

    /// Build the driver with configuration loaded from `config_dir`.
    pub fn initialize<P: AsRef<Path>>(
        real: D,
        index: I,
        fetcher: F,
        config_dir: P,
    ) -> Result<Self> {
        let config = DriverConfig::load(config_dir)?;
        Ok(Self::new(real, index, fetcher, config))
    }

    pub fn real(&self) -> &D {
        &self.real
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn fetcher(&self) -> &F {
        self.placeholders.fetcher()
    }

    pub fn config(&self) -> &DriverConfig {
        self.placeholders.config()
    }

    /// True only while a gate lookup is in flight.
    pub fn is_probing(&self) -> bool {
        self.probing.get()
    }

    /// Run the gate for `identifier`.
    pub fn route(&self, identifier: &str) -> Route {
        gate::evaluate(identifier, &self.real, || self.lookup(identifier))
    }

    pub fn should_delegate(&self, identifier: &str) -> bool {
        self.route(identifier).is_delegate()
    }

    fn lookup(&self, identifier: &str) -> Result<Option<IndexedFileRecord>> {
        let _guard = ProbeGuard::engage(&self.probing);
        self.index.find(self.real.storage_id(), identifier, self)
    }

    fn physically_present(&self, identifier: &str) -> bool {
        self.real.file_exists(identifier) || self.real.folder_exists(identifier)
    }

    fn write_local_copy(&self, identifier: &str, record: &IndexedFileRecord) -> Result<PathBuf> {
        let content = self.placeholders.content(record)?;
        let path = self.real.temporary_path(identifier);

        let written = fs::write(&path, content).and_then(|()| match record.modification_date {
            Some(modified) => fs::File::options()
                .write(true)
                .open(&path)
                .and_then(|file| file.set_modified(SystemTime::from(modified))),
            None => Ok(()),
        });
        let written = written.map_err(|source| DriverError::LocalWrite {
            path: path.clone(),
            source,
        });
        remove_on_error(&path, written)?;
        Ok(path)
    }
}

/// Deletes a half-written scratch file when `result` is an error.
fn remove_on_error<T>(path: &Path, result: Result<T>) -> Result<T> {
    if result.is_err() {
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "could not remove scratch file");
            }
        }
    }
    result
}

impl<D, I, F> StorageDriver for DummyDriver<D, I, F>
where
    D: StorageDriver,
    I: FileIndex,
    F: HttpFetcher,
{
    fn storage_id(&self) -> u32 {
        self.real.storage_id()
    }

    /// Intercepted files always exist. While a lookup is in flight, every
    /// file exists.
    fn file_exists(&self, identifier: &str) -> bool {
        if self.probing.get() {
            return true;
        }
        match self.route(identifier) {
            Route::Delegate(_) => self.real.file_exists(identifier),
            Route::Intercept(_) => true,
        }
    }

    fn folder_exists(&self, identifier: &str) -> bool {
        self.real.folder_exists(identifier)
    }

    fn is_within_processing_folder(&self, identifier: &str) -> bool {
        self.real.is_within_processing_folder(identifier)
    }

    fn get_file_contents(&self, identifier: &str) -> Result<Vec<u8>> {
        match self.route(identifier) {
            Route::Delegate(_) => self.real.get_file_contents(identifier),
            Route::Intercept(record) => self.placeholders.content(&record),
        }
    }

    fn get_file_for_local_processing(&self, identifier: &str, writable: bool) -> Result<PathBuf> {
        match self.route(identifier) {
            Route::Delegate(_) => self.real.get_file_for_local_processing(identifier, writable),
            Route::Intercept(record) => self.write_local_copy(identifier, &record),
        }
    }

    fn get_public_url(&self, identifier: &str) -> Result<String> {
        match self.route(identifier) {
            Route::Delegate(_) => self.real.get_public_url(identifier),
            Route::Intercept(record) => Ok(self.placeholders.public_url(&record)),
        }
    }

    /// Read and write are granted for anything not physically present.
    fn get_permissions(&self, identifier: &str) -> Result<Permissions> {
        if self.physically_present(identifier) {
            self.real.get_permissions(identifier)
        } else {
            Ok(Permissions::read_write())
        }
    }

    fn hash(&self, identifier: &str, algorithm: &str) -> Result<String> {
        let algorithm: HashAlgorithm = algorithm.parse()?;
        match self.route(identifier) {
            Route::Delegate(_) => self.real.hash(identifier, &algorithm.to_string()),
            Route::Intercept(record) => self.placeholders.hash(&record, algorithm),
        }
    }

    fn get_folder_info_by_identifier(&self, identifier: &str) -> Result<FolderInfo> {
        if self.real.folder_exists(identifier) {
            return self.real.get_folder_info_by_identifier(identifier);
        }
        Ok(FolderInfo {
            identifier: identifier.to_string(),
            name: basename(identifier).to_string(),
            storage: self.real.storage_id(),
        })
    }

    fn dump_file_contents(&self, identifier: &str, out: &mut dyn Write) -> Result<()> {
        match self.route(identifier) {
            Route::Delegate(_) => self.real.dump_file_contents(identifier, out),
            Route::Intercept(record) => {
                let content = self.placeholders.content(&record)?;
                out.write_all(&content).map_err(DriverError::Io)?;
                Ok(())
            }
        }
    }

    /// Folders that do not physically exist list as empty.
    fn get_folder_items(&self, identifier: &str) -> Result<Vec<String>> {
        if self.real.folder_exists(identifier) {
            self.real.get_folder_items(identifier)
        } else {
            Ok(Vec::new())
        }
    }

    fn temporary_path(&self, identifier: &str) -> PathBuf {
        self.real.temporary_path(identifier)
    }
}
