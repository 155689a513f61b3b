use super::dimensions::clamp;
use crate::config::DriverConfig;
use crate::error::{DriverError, Result};
use crate::fetch::HttpFetcher;
use crate::hash::HashAlgorithm;
use crate::model::IndexedFileRecord;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// A bundled stand-in file, named `<ext>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummyAsset {
    pub path: PathBuf,
    pub public_url: String,
}

/// Produces placeholder URLs and content for intercepted files.
pub struct PlaceholderResolver<F> {
    config: DriverConfig,
    fetcher: F,
}

impl<F: HttpFetcher> PlaceholderResolver<F> {
    pub fn new(config: DriverConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// The dummy asset for the record's extension, if local files are
    /// preferred and the asset is present.
    pub fn dummy_asset(&self, record: &IndexedFileRecord) -> Option<DummyAsset> {
        if !self.config.use_local_files_if_available {
            return None;
        }

        let dir = &self.config.dummy_files_path;
        if !dir.is_dir() {
            return None;
        }

        let ext = record.file_extension()?;
        let file_name = format!("{}.{}", ext, ext);
        let path = dir.join(&file_name);
        if !path.is_file() {
            return None;
        }

        Some(DummyAsset {
            path,
            public_url: format!(
                "{}/{}",
                self.config.dummy_files_url.trim_end_matches('/'),
                file_name
            ),
        })
    }

    /// Remote placeholder URL sized to the record's clamped dimensions.
    pub fn remote_url(&self, record: &IndexedFileRecord) -> String {
        let (width, height) = clamp(
            record.width.unwrap_or(0),
            record.height.unwrap_or(0),
            i64::from(self.config.image_max_width),
            i64::from(self.config.image_max_height),
        );
        format_placeholder_url(&self.config.placeholder_service_url, width, height)
    }

    pub fn public_url(&self, record: &IndexedFileRecord) -> String {
        match self.dummy_asset(record) {
            Some(asset) => {
                info!(identifier = %record.identifier, url = %asset.public_url, "serving dummy file");
                asset.public_url
            }
            None => {
                let url = self.remote_url(record);
                info!(identifier = %record.identifier, %url, "serving remote placeholder");
                url
            }
        }
    }

    pub fn content(&self, record: &IndexedFileRecord) -> Result<Vec<u8>> {
        if let Some(asset) = self.dummy_asset(record) {
            info!(identifier = %record.identifier, path = %asset.path.display(), "reading dummy file");
            return fs::read(&asset.path).map_err(DriverError::Io);
        }

        let url = self.remote_url(record);
        info!(identifier = %record.identifier, %url, "fetching remote placeholder");
        self.fetcher
            .get(&url)
            .map_err(|e| DriverError::PlaceholderFetch {
                url,
                message: e.message,
            })
    }

    /// Hash of the placeholder. An indexed sha1 is returned as is.
    pub fn hash(&self, record: &IndexedFileRecord, algorithm: HashAlgorithm) -> Result<String> {
        if algorithm == HashAlgorithm::Sha1 {
            if let Some(sha1) = record.sha1.as_deref().filter(|s| !s.is_empty()) {
                return Ok(sha1.to_string());
            }
        }
        let content = self.content(record)?;
        Ok(algorithm.digest(&content))
    }
}

/// Fill the template's `%d` slots with width then height. `%%` is a literal
/// percent sign; surplus `%d` slots are left as they are.
pub fn format_placeholder_url(template: &str, width: i64, height: i64) -> String {
    let mut args = [width, height].into_iter();
    let mut out = String::with_capacity(template.len() + 8);
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('d') => {
                chars.next();
                match args.next() {
                    Some(value) => out.push_str(&value.to_string()),
                    None => out.push_str("%d"),
                }
            }
            Some('%') => {
                chars.next();
                out.push('%');
            }
            _ => out.push('%'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileType;
    use crate::test_utils::{dummy_dir, RecordingFetcher};

    fn photo(width: i64, height: i64) -> IndexedFileRecord {
        IndexedFileRecord::new(1, "/user_upload/photo.jpg", FileType::Image)
            .with_dimensions(width, height)
    }

    fn remote_only() -> DriverConfig {
        DriverConfig {
            use_local_files_if_available: false,
            placeholder_service_url: "https://img.example/%d/%d".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_format_placeholder_url() {
        assert_eq!(
            format_placeholder_url("http://www.placecage.com/c/%d/%d", 640, 480),
            "http://www.placecage.com/c/640/480"
        );
        assert_eq!(
            format_placeholder_url("https://x/%dx%d.png?q=100%%", 1, 2),
            "https://x/1x2.png?q=100%"
        );
        assert_eq!(format_placeholder_url("https://x/%d/%d/%d", 1, 2), "https://x/1/2/%d");
        assert_eq!(format_placeholder_url("https://x/static", 1, 2), "https://x/static");
        assert_eq!(format_placeholder_url("https://x/50%", 1, 2), "https://x/50%");
    }

    #[test]
    fn test_remote_url_uses_clamped_dimensions() {
        let resolver = PlaceholderResolver::new(remote_only(), RecordingFetcher::ok(b"img"));
        assert_eq!(resolver.public_url(&photo(2048, 1024)), "https://img.example/1024/512");
        assert_eq!(resolver.public_url(&photo(500, 2000)), "https://img.example/256/1024");
    }

    #[test]
    fn test_missing_dimensions_default_to_zero() {
        let resolver = PlaceholderResolver::new(remote_only(), RecordingFetcher::ok(b"img"));
        let record = IndexedFileRecord::new(1, "/a.jpg", FileType::Image);
        assert_eq!(resolver.public_url(&record), "https://img.example/0/0");
    }

    #[test]
    fn test_dummy_asset_wins_when_preferred() {
        let (_dir, path) = dummy_dir(&[("jpg.jpg", "dummy jpg")]);
        let config = DriverConfig {
            use_local_files_if_available: true,
            dummy_files_path: path.clone(),
            dummy_files_url: "/assets/dummy/".to_string(),
            ..remote_only()
        };
        let resolver = PlaceholderResolver::new(config, RecordingFetcher::ok(b"remote"));

        let record = photo(2048, 1024);
        assert_eq!(resolver.public_url(&record), "/assets/dummy/jpg.jpg");
        assert_eq!(resolver.content(&record).unwrap(), b"dummy jpg");
        assert_eq!(resolver.fetcher().calls(), 0);
        assert_eq!(
            resolver.dummy_asset(&record),
            Some(DummyAsset {
                path: path.join("jpg.jpg"),
                public_url: "/assets/dummy/jpg.jpg".to_string(),
            })
        );
    }

    #[test]
    fn test_dummy_asset_ignored_when_not_preferred() {
        let (_dir, path) = dummy_dir(&[("jpg.jpg", "dummy jpg")]);
        let config = DriverConfig {
            dummy_files_path: path,
            ..remote_only()
        };
        let resolver = PlaceholderResolver::new(config, RecordingFetcher::ok(b"remote"));
        assert!(resolver.dummy_asset(&photo(10, 10)).is_none());
        assert_eq!(resolver.content(&photo(10, 10)).unwrap(), b"remote");
        assert_eq!(resolver.fetcher().urls(), vec!["https://img.example/10/10"]);
    }

    #[test]
    fn test_no_asset_for_other_extension_or_missing_dir() {
        let (dir, path) = dummy_dir(&[("png.png", "dummy png")]);
        let config = DriverConfig {
            use_local_files_if_available: true,
            dummy_files_path: path,
            ..remote_only()
        };
        let resolver = PlaceholderResolver::new(config.clone(), RecordingFetcher::ok(b"remote"));
        assert!(resolver.dummy_asset(&photo(10, 10)).is_none());

        drop(dir);
        let resolver = PlaceholderResolver::new(config, RecordingFetcher::ok(b"remote"));
        let png = IndexedFileRecord::new(1, "/a.png", FileType::Image);
        assert!(resolver.dummy_asset(&png).is_none());
    }

    #[test]
    fn test_fetch_failure_carries_url_and_message() {
        let resolver =
            PlaceholderResolver::new(remote_only(), RecordingFetcher::failing("connection refused"));
        let err = resolver.content(&photo(300, 200)).unwrap_err();
        match err {
            DriverError::PlaceholderFetch { url, message } => {
                assert_eq!(url, "https://img.example/300/200");
                assert_eq!(message, "connection refused");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(resolver.fetcher().calls(), 1);
    }

    #[test]
    fn test_sha1_uses_indexed_value_without_fetching() {
        let resolver = PlaceholderResolver::new(remote_only(), RecordingFetcher::ok(b"remote"));
        let record = photo(10, 10).with_sha1("0123abcd");
        assert_eq!(
            resolver.hash(&record, HashAlgorithm::Sha1).unwrap(),
            "0123abcd"
        );
        assert_eq!(resolver.fetcher().calls(), 0);
    }

    #[test]
    fn test_hash_without_indexed_sha1_hashes_content() {
        let resolver = PlaceholderResolver::new(remote_only(), RecordingFetcher::ok(b"remote"));
        assert_eq!(
            resolver.hash(&photo(10, 10), HashAlgorithm::Sha1).unwrap(),
            HashAlgorithm::Sha1.digest(b"remote")
        );
        let record = photo(10, 10).with_sha1("0123abcd");
        assert_eq!(
            resolver.hash(&record, HashAlgorithm::Md5).unwrap(),
            HashAlgorithm::Md5.digest(b"remote")
        );
        assert_eq!(resolver.fetcher().calls(), 2);
    }
}
