use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Error fetching placeholder image {url}, occurred error was: {message}")]
    PlaceholderFetch { url: String, message: String },

    #[error("Copying file to temporary path {} failed: {source}", path.display())]
    LocalWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Hash algorithm \"{0}\" is not supported")]
    UnsupportedAlgorithm(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DriverError>;
