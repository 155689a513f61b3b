use super::{scratch_path, StorageDriver};
use crate::error::{DriverError, Result};
use crate::hash::HashAlgorithm;
use crate::model::{basename, FolderInfo, Permissions};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

const DEFAULT_PROCESSING_FOLDER: &str = "_processed_";

/// Everything but the RFC 3986 unreserved characters is encoded.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Driver over real files below a root directory.
pub struct LocalDriver {
    storage_id: u32,
    root: PathBuf,
    public_base_url: String,
    processing_folder: String,
}

impl LocalDriver {
    pub fn new(storage_id: u32, root: PathBuf) -> Self {
        Self {
            storage_id,
            root,
            public_base_url: "/fileadmin".to_string(),
            processing_folder: DEFAULT_PROCESSING_FOLDER.to_string(),
        }
    }

    pub fn with_public_base_url(mut self, url: &str) -> Self {
        self.public_base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_processing_folder(mut self, folder: &str) -> Self {
        self.processing_folder = folder.trim_matches('/').to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Physical location of an identifier below the root. `None` when the
    /// identifier would leave the root (`..` or an absolute component).
    pub fn absolute_path(&self, identifier: &str) -> Option<PathBuf> {
        let relative = Path::new(identifier.trim_start_matches('/'));
        let inside = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        inside.then(|| self.root.join(relative))
    }

    fn existing_file(&self, identifier: &str) -> Result<PathBuf> {
        self.absolute_path(identifier)
            .filter(|path| path.is_file())
            .ok_or_else(|| DriverError::FileNotFound(identifier.to_string()))
    }

    fn existing_folder(&self, identifier: &str) -> Result<PathBuf> {
        self.absolute_path(identifier)
            .filter(|path| path.is_dir())
            .ok_or_else(|| DriverError::FolderNotFound(identifier.to_string()))
    }
}

impl StorageDriver for LocalDriver {
    fn storage_id(&self) -> u32 {
        self.storage_id
    }

    fn file_exists(&self, identifier: &str) -> bool {
        self.absolute_path(identifier)
            .is_some_and(|path| path.is_file())
    }

    fn folder_exists(&self, identifier: &str) -> bool {
        self.absolute_path(identifier)
            .is_some_and(|path| path.is_dir())
    }

    fn is_within_processing_folder(&self, identifier: &str) -> bool {
        let relative = identifier.trim_start_matches('/');
        match relative.strip_prefix(self.processing_folder.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    fn get_file_contents(&self, identifier: &str) -> Result<Vec<u8>> {
        let path = self.existing_file(identifier)?;
        fs::read(path).map_err(DriverError::Io)
    }

    fn get_file_for_local_processing(&self, identifier: &str, writable: bool) -> Result<PathBuf> {
        let path = self.existing_file(identifier)?;
        if !writable {
            return Ok(path);
        }

        let target = self.temporary_path(identifier);
        fs::copy(&path, &target).map_err(|source| DriverError::LocalWrite {
            path: target.clone(),
            source,
        })?;
        Ok(target)
    }

    fn get_public_url(&self, identifier: &str) -> Result<String> {
        let encoded: Vec<String> = identifier
            .trim_start_matches('/')
            .split('/')
            .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
            .collect();
        Ok(format!("{}/{}", self.public_base_url, encoded.join("/")))
    }

    fn get_permissions(&self, identifier: &str) -> Result<Permissions> {
        let path = self
            .absolute_path(identifier)
            .filter(|path| path.exists())
            .ok_or_else(|| DriverError::FileNotFound(identifier.to_string()))?;
        let meta = fs::metadata(path).map_err(DriverError::Io)?;
        Ok(Permissions {
            read: true,
            write: !meta.permissions().readonly(),
        })
    }

    fn hash(&self, identifier: &str, algorithm: &str) -> Result<String> {
        let algorithm: HashAlgorithm = algorithm.parse()?;
        let content = self.get_file_contents(identifier)?;
        Ok(algorithm.digest(&content))
    }

    fn get_folder_info_by_identifier(&self, identifier: &str) -> Result<FolderInfo> {
        self.existing_folder(identifier)?;
        Ok(FolderInfo {
            identifier: identifier.to_string(),
            name: basename(identifier).to_string(),
            storage: self.storage_id,
        })
    }

    fn dump_file_contents(&self, identifier: &str, out: &mut dyn Write) -> Result<()> {
        let content = self.get_file_contents(identifier)?;
        out.write_all(&content).map_err(DriverError::Io)?;
        Ok(())
    }

    fn get_folder_items(&self, identifier: &str) -> Result<Vec<String>> {
        let path = self.existing_folder(identifier)?;
        let prefix = format!("/{}", identifier.trim_matches('/'));
        let prefix = prefix.trim_end_matches('/');

        let mut items = Vec::new();
        for entry in fs::read_dir(path).map_err(DriverError::Io)? {
            let entry = entry.map_err(DriverError::Io)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry.file_type().map_err(DriverError::Io)?.is_dir();
            if is_dir {
                items.push(format!("{}/{}/", prefix, name));
            } else {
                items.push(format!("{}/{}", prefix, name));
            }
        }
        items.sort();
        Ok(items)
    }

    fn temporary_path(&self, identifier: &str) -> PathBuf {
        scratch_path(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, LocalDriver) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("user_upload/nested")).unwrap();
        fs::write(dir.path().join("user_upload/photo.jpg"), b"jpeg bytes").unwrap();
        let driver = LocalDriver::new(1, dir.path().to_path_buf());
        (dir, driver)
    }

    #[test]
    fn test_exists() {
        let (_dir, driver) = setup();
        assert!(driver.file_exists("/user_upload/photo.jpg"));
        assert!(!driver.file_exists("/user_upload/missing.jpg"));
        assert!(!driver.file_exists("/user_upload/"));
        assert!(driver.folder_exists("/user_upload/"));
    }

    #[test]
    fn test_processing_folder() {
        let (_dir, driver) = setup();
        assert!(driver.is_within_processing_folder("/_processed_/a/csm_photo.jpg"));
        assert!(driver.is_within_processing_folder("/_processed_/"));
        assert!(!driver.is_within_processing_folder("/_processed_other/a.jpg"));
        assert!(!driver.is_within_processing_folder("/user_upload/photo.jpg"));

        let driver = driver.with_processing_folder("/_cache_/");
        assert!(driver.is_within_processing_folder("/_cache_/x.png"));
    }

    #[test]
    fn test_contents_and_missing_file() {
        let (_dir, driver) = setup();
        assert_eq!(
            driver.get_file_contents("/user_upload/photo.jpg").unwrap(),
            b"jpeg bytes"
        );
        assert!(matches!(
            driver.get_file_contents("/user_upload/missing.jpg"),
            Err(DriverError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_public_url_is_encoded() {
        let (_dir, driver) = setup();
        let driver = driver.with_public_base_url("https://cdn.example/fileadmin/");
        assert_eq!(
            driver.get_public_url("/user upload/ä.jpg").unwrap(),
            "https://cdn.example/fileadmin/user%20upload/%C3%A4.jpg"
        );
    }

    #[test]
    fn test_local_processing_copies_only_when_writable() {
        let (dir, driver) = setup();
        let read_only = driver
            .get_file_for_local_processing("/user_upload/photo.jpg", false)
            .unwrap();
        assert_eq!(read_only, dir.path().join("user_upload/photo.jpg"));
        assert_eq!(read_only, driver.root().join("user_upload/photo.jpg"));

        let copy = driver
            .get_file_for_local_processing("/user_upload/photo.jpg", true)
            .unwrap();
        assert_ne!(copy, read_only);
        assert_eq!(fs::read(&copy).unwrap(), b"jpeg bytes");
        assert_eq!(copy.extension().and_then(|e| e.to_str()), Some("jpg"));
        fs::remove_file(copy).unwrap();
    }

    #[test]
    fn test_hash() {
        let (_dir, driver) = setup();
        assert_eq!(
            driver.hash("/user_upload/photo.jpg", "sha1").unwrap(),
            HashAlgorithm::Sha1.digest(b"jpeg bytes")
        );
        assert!(matches!(
            driver.hash("/user_upload/photo.jpg", "crc99"),
            Err(DriverError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_folder_info_and_items() {
        let (_dir, driver) = setup();
        let info = driver.get_folder_info_by_identifier("/user_upload/").unwrap();
        assert_eq!(info.name, "user_upload");
        assert_eq!(info.storage, 1);

        let items = driver.get_folder_items("/user_upload/").unwrap();
        assert_eq!(
            items,
            vec!["/user_upload/nested/", "/user_upload/photo.jpg"]
        );

        assert!(matches!(
            driver.get_folder_info_by_identifier("/nope/"),
            Err(DriverError::FolderNotFound(_))
        ));
    }

    #[test]
    fn test_root_folder_items() {
        let (_dir, driver) = setup();
        assert_eq!(driver.get_folder_items("/").unwrap(), vec!["/user_upload/"]);
    }

    #[test]
    fn test_dump() {
        let (_dir, driver) = setup();
        let mut out = Vec::new();
        driver
            .dump_file_contents("/user_upload/photo.jpg", &mut out)
            .unwrap();
        assert_eq!(out, b"jpeg bytes");
    }

    #[test]
    fn test_identifiers_cannot_leave_the_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("root");
        fs::create_dir_all(root.join("user_upload")).unwrap();
        fs::write(dir.path().join("secret.txt"), b"outside the volume").unwrap();
        let driver = LocalDriver::new(1, root);

        assert!(driver.absolute_path("/../secret.txt").is_none());
        assert!(driver.absolute_path("/user_upload/../../secret.txt").is_none());
        assert!(!driver.file_exists("/../secret.txt"));
        assert!(!driver.folder_exists("/../"));
        assert!(matches!(
            driver.get_file_contents("/../secret.txt"),
            Err(DriverError::FileNotFound(_))
        ));
        assert!(matches!(
            driver.get_permissions("/user_upload/../../secret.txt"),
            Err(DriverError::FileNotFound(_))
        ));
        assert!(matches!(
            driver.get_folder_items("/user_upload/../../"),
            Err(DriverError::FolderNotFound(_))
        ));
    }
}
