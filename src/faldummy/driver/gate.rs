//! Decides, per identifier, whether a call goes to the real driver or to the
//! placeholder path. Rules are checked in order, first match wins:
//!
//! 1. folder identifier → delegate
//! 2. file physically exists → delegate
//! 3. inside the processing folder → delegate
//! 4. not indexed (or the lookup failed) → delegate
//! 5. indexed as an image → intercept
//! 6. anything else → delegate

use crate::error::Result;
use crate::model::{is_folder_identifier, IndexedFileRecord};
use crate::store::StorageDriver;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegateReason {
    Folder,
    PhysicalFile,
    ProcessingFolder,
    NotIndexed,
    LookupFailed,
    NotAnImage,
}

impl fmt::Display for DelegateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            DelegateReason::Folder => "folder identifier",
            DelegateReason::PhysicalFile => "file exists",
            DelegateReason::ProcessingFolder => "processing folder",
            DelegateReason::NotIndexed => "not indexed",
            DelegateReason::LookupFailed => "index lookup failed",
            DelegateReason::NotAnImage => "not an image",
        };
        f.write_str(reason)
    }
}

/// Outcome of a gate evaluation. An intercepted call carries the record the
/// gate found so the placeholder path does not look it up again.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Delegate(DelegateReason),
    Intercept(IndexedFileRecord),
}

impl Route {
    pub fn is_delegate(&self) -> bool {
        matches!(self, Route::Delegate(_))
    }
}

/// Evaluate the gate for `identifier` against the real driver. `lookup` is
/// only called once the cheap checks have passed.
pub fn evaluate<D, L>(identifier: &str, real: &D, lookup: L) -> Route
where
    D: StorageDriver + ?Sized,
    L: FnOnce() -> Result<Option<IndexedFileRecord>>,
{
    let route = decide(identifier, real, lookup);
    match &route {
        Route::Delegate(reason) => debug!(identifier, %reason, "delegating to real driver"),
        Route::Intercept(_) => debug!(identifier, "intercepting missing image"),
    }
    route
}

fn decide<D, L>(identifier: &str, real: &D, lookup: L) -> Route
where
    D: StorageDriver + ?Sized,
    L: FnOnce() -> Result<Option<IndexedFileRecord>>,
{
    if is_folder_identifier(identifier) {
        return Route::Delegate(DelegateReason::Folder);
    }

    if real.file_exists(identifier) {
        return Route::Delegate(DelegateReason::PhysicalFile);
    }

    if real.is_within_processing_folder(identifier) {
        return Route::Delegate(DelegateReason::ProcessingFolder);
    }

    let record = match lookup() {
        Ok(Some(record)) => record,
        Ok(None) => return Route::Delegate(DelegateReason::NotIndexed),
        Err(e) => {
            warn!(identifier, error = %e, "index lookup failed, delegating");
            return Route::Delegate(DelegateReason::LookupFailed);
        }
    };

    if record.is_image() {
        Route::Intercept(record)
    } else {
        Route::Delegate(DelegateReason::NotAnImage)
    }
}

/// Whether the call for `identifier` should pass through to the real driver.
pub fn should_delegate<D, L>(identifier: &str, real: &D, lookup: L) -> bool
where
    D: StorageDriver + ?Sized,
    L: FnOnce() -> Result<Option<IndexedFileRecord>>,
{
    evaluate(identifier, real, lookup).is_delegate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverError;
    use crate::model::FileType;
    use crate::store::memory::InMemoryDriver;
    use std::cell::Cell;

    fn image(identifier: &str) -> IndexedFileRecord {
        IndexedFileRecord::new(1, identifier, FileType::Image)
    }

    #[test]
    fn test_folder_identifiers_always_delegate() {
        let real = InMemoryDriver::default();
        let called = Cell::new(false);
        let route = evaluate("/user_upload/", &real, || {
            called.set(true);
            Ok(Some(image("/user_upload/")))
        });
        assert_eq!(route, Route::Delegate(DelegateReason::Folder));
        assert!(!called.get());
    }

    #[test]
    fn test_existing_file_delegates() {
        let real = InMemoryDriver::default();
        real.add_file("/photo.jpg", b"real");
        let route = evaluate("/photo.jpg", &real, || Ok(Some(image("/photo.jpg"))));
        assert_eq!(route, Route::Delegate(DelegateReason::PhysicalFile));
    }

    #[test]
    fn test_processing_folder_delegates_even_for_images() {
        let real = InMemoryDriver::default();
        let id = "/_processed_/1/csm_photo.jpg";
        let route = evaluate(id, &real, || Ok(Some(image(id))));
        assert_eq!(route, Route::Delegate(DelegateReason::ProcessingFolder));
    }

    #[test]
    fn test_unindexed_file_delegates() {
        let real = InMemoryDriver::default();
        assert!(should_delegate("/missing.jpg", &real, || Ok(None)));
    }

    #[test]
    fn test_failed_lookup_delegates() {
        let real = InMemoryDriver::default();
        let route = evaluate("/missing.jpg", &real, || {
            Err(DriverError::Index("down".to_string()))
        });
        assert_eq!(route, Route::Delegate(DelegateReason::LookupFailed));
    }

    #[test]
    fn test_indexed_image_is_intercepted() {
        let real = InMemoryDriver::default();
        let route = evaluate("/missing.jpg", &real, || Ok(Some(image("/missing.jpg"))));
        assert_eq!(route, Route::Intercept(image("/missing.jpg")));
        assert!(!route.is_delegate());
    }

    #[test]
    fn test_indexed_non_image_delegates() {
        let real = InMemoryDriver::default();
        for file_type in [
            FileType::Unknown,
            FileType::Text,
            FileType::Audio,
            FileType::Video,
            FileType::Application,
        ] {
            let record = IndexedFileRecord::new(1, "/missing.pdf", file_type);
            let route = evaluate("/missing.pdf", &real, || Ok(Some(record)));
            assert_eq!(route, Route::Delegate(DelegateReason::NotAnImage));
        }
    }
}
