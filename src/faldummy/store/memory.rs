use super::StorageDriver;
use crate::error::{DriverError, Result};
use crate::hash::HashAlgorithm;
use crate::model::{basename, FolderInfo, Permissions};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

/// In-memory storage driver for testing.
///
/// Uses `RefCell` for interior mutability since drivers are used from a
/// single thread. Every trait call is appended to a call log so tests can
/// assert whether a decorator delegated or not.
pub struct InMemoryDriver {
    storage_id: u32,
    files: RefCell<BTreeMap<String, Vec<u8>>>,
    folders: RefCell<BTreeSet<String>>,
    processing_folder: String,
    scratch_dir: Option<PathBuf>,
    calls: RefCell<Vec<String>>,
}

impl Default for InMemoryDriver {
    fn default() -> Self {
        Self::new(1)
    }
}

impl InMemoryDriver {
    pub fn new(storage_id: u32) -> Self {
        let mut folders = BTreeSet::new();
        folders.insert("/".to_string());
        Self {
            storage_id,
            files: RefCell::new(BTreeMap::new()),
            folders: RefCell::new(folders),
            processing_folder: "/_processed_/".to_string(),
            scratch_dir: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Place scratch files in `dir` instead of the system temp dir.
    pub fn with_scratch_dir(mut self, dir: &Path) -> Self {
        self.scratch_dir = Some(dir.to_path_buf());
        self
    }

    /// Add a file, creating its parent folders.
    pub fn add_file(&self, identifier: &str, content: &[u8]) {
        let mut parent = String::from("/");
        let segments: Vec<&str> = identifier.trim_start_matches('/').split('/').collect();
        for segment in &segments[..segments.len().saturating_sub(1)] {
            parent.push_str(segment);
            parent.push('/');
            self.folders.borrow_mut().insert(parent.clone());
        }
        self.files
            .borrow_mut()
            .insert(identifier.to_string(), content.to_vec());
    }

    pub fn add_folder(&self, identifier: &str) {
        self.folders.borrow_mut().insert(identifier.to_string());
    }

    /// Names of the trait methods called so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.calls.borrow().iter().any(|c| c == method)
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, method: &str) {
        self.calls.borrow_mut().push(method.to_string());
    }

    fn content(&self, identifier: &str) -> Result<Vec<u8>> {
        self.files
            .borrow()
            .get(identifier)
            .cloned()
            .ok_or_else(|| DriverError::FileNotFound(identifier.to_string()))
    }
}

impl StorageDriver for InMemoryDriver {
    fn storage_id(&self) -> u32 {
        self.storage_id
    }

    fn file_exists(&self, identifier: &str) -> bool {
        self.record("file_exists");
        self.files.borrow().contains_key(identifier)
    }

    fn folder_exists(&self, identifier: &str) -> bool {
        self.record("folder_exists");
        self.folders.borrow().contains(identifier)
    }

    fn is_within_processing_folder(&self, identifier: &str) -> bool {
        identifier.starts_with(&self.processing_folder)
    }

    fn get_file_contents(&self, identifier: &str) -> Result<Vec<u8>> {
        self.record("get_file_contents");
        self.content(identifier)
    }

    fn get_file_for_local_processing(&self, identifier: &str, _writable: bool) -> Result<PathBuf> {
        self.record("get_file_for_local_processing");
        self.content(identifier)?;
        Ok(PathBuf::from(format!("memory://{}", identifier)))
    }

    fn get_public_url(&self, identifier: &str) -> Result<String> {
        self.record("get_public_url");
        Ok(format!("memory://{}", identifier))
    }

    fn get_permissions(&self, identifier: &str) -> Result<Permissions> {
        self.record("get_permissions");
        if self.files.borrow().contains_key(identifier) || self.folders.borrow().contains(identifier)
        {
            Ok(Permissions {
                read: true,
                write: false,
            })
        } else {
            Err(DriverError::FileNotFound(identifier.to_string()))
        }
    }

    fn hash(&self, identifier: &str, algorithm: &str) -> Result<String> {
        self.record("hash");
        let algorithm: HashAlgorithm = algorithm.parse()?;
        Ok(algorithm.digest(&self.content(identifier)?))
    }

    fn get_folder_info_by_identifier(&self, identifier: &str) -> Result<FolderInfo> {
        self.record("get_folder_info_by_identifier");
        if !self.folders.borrow().contains(identifier) {
            return Err(DriverError::FolderNotFound(identifier.to_string()));
        }
        Ok(FolderInfo {
            identifier: identifier.to_string(),
            name: basename(identifier).to_string(),
            storage: self.storage_id,
        })
    }

    fn dump_file_contents(&self, identifier: &str, out: &mut dyn Write) -> Result<()> {
        self.record("dump_file_contents");
        out.write_all(&self.content(identifier)?)
            .map_err(DriverError::Io)?;
        Ok(())
    }

    fn get_folder_items(&self, identifier: &str) -> Result<Vec<String>> {
        self.record("get_folder_items");
        if !self.folders.borrow().contains(identifier) {
            return Err(DriverError::FolderNotFound(identifier.to_string()));
        }
        let is_child = |candidate: &str| {
            candidate
                .strip_prefix(identifier)
                .map(|rest| {
                    let rest = rest.trim_end_matches('/');
                    !rest.is_empty() && !rest.contains('/')
                })
                .unwrap_or(false)
        };
        let mut items: Vec<String> = self
            .files
            .borrow()
            .keys()
            .chain(self.folders.borrow().iter())
            .filter(|candidate| is_child(candidate))
            .cloned()
            .collect();
        items.sort();
        Ok(items)
    }

    fn temporary_path(&self, identifier: &str) -> PathBuf {
        match &self.scratch_dir {
            Some(dir) => super::scratch_path_in(dir, identifier),
            None => super::scratch_path(identifier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_file_creates_parents() {
        let driver = InMemoryDriver::default();
        driver.add_file("/a/b/c.jpg", b"x");
        assert!(driver.folder_exists("/a/"));
        assert!(driver.folder_exists("/a/b/"));
        assert!(driver.file_exists("/a/b/c.jpg"));
    }

    #[test]
    fn test_calls_are_recorded() {
        let driver = InMemoryDriver::default();
        driver.add_file("/a.txt", b"hello");
        assert_eq!(driver.get_file_contents("/a.txt").unwrap(), b"hello");
        assert!(driver.was_called("get_file_contents"));
        driver.clear_calls();
        assert!(driver.calls().is_empty());
    }

    #[test]
    fn test_folder_items() {
        let driver = InMemoryDriver::default();
        driver.add_file("/a/one.jpg", b"1");
        driver.add_file("/a/b/two.jpg", b"2");
        assert_eq!(
            driver.get_folder_items("/a/").unwrap(),
            vec!["/a/b/", "/a/one.jpg"]
        );
    }

    #[test]
    fn test_empty_folder() {
        let driver = InMemoryDriver::default();
        driver.add_folder("/empty/");
        assert!(driver.folder_exists("/empty/"));
        assert!(driver.get_folder_items("/empty/").unwrap().is_empty());
        assert_eq!(driver.get_folder_items("/").unwrap(), vec!["/empty/"]);
    }

    #[test]
    fn test_scratch_dir() {
        let dir = tempfile::tempdir().unwrap();
        let driver = InMemoryDriver::default().with_scratch_dir(dir.path());
        let path = driver.temporary_path("/a/photo.JPG");
        assert_eq!(path.parent(), Some(dir.path()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));
    }
}
