//! # Storage Drivers
//!
//! A storage driver presents file and folder operations over one storage
//! volume. Identifiers are paths relative to the volume root, starting with
//! `/`; folder identifiers end with `/`.
//!
//! ## Implementations
//!
//! - [`local::LocalDriver`]: Real files below a root directory.
//! - [`memory::InMemoryDriver`]: Map-backed driver for tests, records calls.
//! - [`crate::driver::DummyDriver`]: Decorator over any other driver that
//!   serves placeholders for indexed images missing from the volume.
//!
//! Because the decorator implements the same trait it wraps, callers never
//! need to know whether placeholder logic is in play.

use crate::error::Result;
use crate::model::{FolderInfo, Permissions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub mod local;
pub mod memory;

/// Abstract interface for a storage volume's driver.
pub trait StorageDriver {
    /// Numeric identity of the storage volume
    fn storage_id(&self) -> u32;

    /// Whether a file exists at the identifier
    fn file_exists(&self, identifier: &str) -> bool;

    /// Whether a folder exists at the identifier
    fn folder_exists(&self, identifier: &str) -> bool;

    /// Whether the identifier lies inside the processing (derived files) folder
    fn is_within_processing_folder(&self, identifier: &str) -> bool;

    fn get_file_contents(&self, identifier: &str) -> Result<Vec<u8>>;

    /// Path to a local copy of the file. A writable request always gets a
    /// scratch copy the caller may modify.
    fn get_file_for_local_processing(&self, identifier: &str, writable: bool) -> Result<PathBuf>;

    fn get_public_url(&self, identifier: &str) -> Result<String>;

    fn get_permissions(&self, identifier: &str) -> Result<Permissions>;

    /// Hash of the file contents; `algorithm` must be one of the supported set.
    fn hash(&self, identifier: &str, algorithm: &str) -> Result<String>;

    fn get_folder_info_by_identifier(&self, identifier: &str) -> Result<FolderInfo>;

    /// Write the file contents to `out`
    fn dump_file_contents(&self, identifier: &str, out: &mut dyn Write) -> Result<()>;

    /// Identifiers of the folder's direct children, sorted.
    fn get_folder_items(&self, identifier: &str) -> Result<Vec<String>>;

    /// A fresh scratch path for a local copy of the file
    fn temporary_path(&self, identifier: &str) -> PathBuf;
}

/// Existence check handed to index lookups that verify files on the fly.
pub trait FileProbe {
    fn probe(&self, identifier: &str) -> bool;
}

impl<T: StorageDriver + ?Sized> FileProbe for T {
    fn probe(&self, identifier: &str) -> bool {
        self.file_exists(identifier)
    }
}

/// Scratch file location in the system temp dir: `fal-dummy-<uuid>.<ext>`.
pub(crate) fn scratch_path(identifier: &str) -> PathBuf {
    scratch_path_in(&std::env::temp_dir(), identifier)
}

pub(crate) fn scratch_path_in(dir: &Path, identifier: &str) -> PathBuf {
    let suffix = crate::model::extension(identifier)
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();
    dir.join(format!("fal-dummy-{}{}", uuid::Uuid::new_v4(), suffix))
}
