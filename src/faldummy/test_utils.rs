use crate::fetch::{HttpFetcher, TransportError};
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Fetcher double that records every requested URL.
pub struct RecordingFetcher {
    response: Result<Vec<u8>, TransportError>,
    urls: RefCell<Vec<String>>,
}

impl RecordingFetcher {
    pub fn ok(body: &[u8]) -> Self {
        Self {
            response: Ok(body.to_vec()),
            urls: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(TransportError::new(message)),
            urls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.urls.borrow().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.borrow().clone()
    }
}

impl HttpFetcher for RecordingFetcher {
    fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.urls.borrow_mut().push(url.to_string());
        self.response.clone()
    }
}

/// A temp directory holding the given dummy files. Keep the `TempDir` alive
/// for as long as the path is used.
pub fn dummy_dir(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    for (name, content) in files {
        fs::write(dir.path().join(name), content).expect("failed to write dummy file");
    }
    let path = dir.path().to_path_buf();
    (dir, path)
}
