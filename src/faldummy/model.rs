use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Returns true if the identifier denotes a folder (trailing separator).
pub fn is_folder_identifier(identifier: &str) -> bool {
    identifier.ends_with('/')
}

/// Last path segment of an identifier, ignoring a trailing separator.
pub fn basename(identifier: &str) -> &str {
    let trimmed = identifier.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed,
    }
}

/// Lower-cased extension of the identifier's basename, if any.
pub fn extension(identifier: &str) -> Option<String> {
    let name = basename(identifier);
    match name.rfind('.') {
        Some(pos) if pos + 1 < name.len() => Some(name[pos + 1..].to_lowercase()),
        _ => None,
    }
}

/// The host's numeric file type-kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "u8", into = "u8")]
pub enum FileType {
    #[default]
    Unknown,
    Text,
    Image,
    Audio,
    Video,
    Application,
}

impl From<u8> for FileType {
    fn from(value: u8) -> Self {
        match value {
            1 => FileType::Text,
            2 => FileType::Image,
            3 => FileType::Audio,
            4 => FileType::Video,
            5 => FileType::Application,
            _ => FileType::Unknown,
        }
    }
}

impl From<FileType> for u8 {
    fn from(value: FileType) -> Self {
        match value {
            FileType::Unknown => 0,
            FileType::Text => 1,
            FileType::Image => 2,
            FileType::Audio => 3,
            FileType::Video => 4,
            FileType::Application => 5,
        }
    }
}

/// Metadata the host keeps about a file, independent of the physical file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedFileRecord {
    pub storage: u32,
    pub identifier: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub extension: String,
    #[serde(default, rename = "type")]
    pub file_type: FileType,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub modification_date: Option<DateTime<Utc>>,
    /// Set by the index when the physical file could not be found.
    #[serde(default)]
    pub missing: bool,
}

impl IndexedFileRecord {
    pub fn new(storage: u32, identifier: &str, file_type: FileType) -> Self {
        Self {
            storage,
            identifier: identifier.to_string(),
            name: basename(identifier).to_string(),
            extension: extension(identifier).unwrap_or_default(),
            file_type,
            width: None,
            height: None,
            sha1: None,
            size: None,
            modification_date: None,
            missing: false,
        }
    }

    pub fn with_dimensions(mut self, width: i64, height: i64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_sha1(mut self, sha1: &str) -> Self {
        self.sha1 = Some(sha1.to_string());
        self
    }

    pub fn with_modification_date(mut self, date: DateTime<Utc>) -> Self {
        self.modification_date = Some(date);
        self
    }

    pub fn is_image(&self) -> bool {
        self.file_type == FileType::Image
    }

    /// The record's extension, falling back to the identifier's.
    pub fn file_extension(&self) -> Option<String> {
        if self.extension.is_empty() {
            extension(&self.identifier)
        } else {
            Some(self.extension.to_lowercase())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(rename = "r")]
    pub read: bool,
    #[serde(rename = "w")]
    pub write: bool,
}

impl Permissions {
    pub fn read_write() -> Self {
        Self {
            read: true,
            write: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderInfo {
    pub identifier: String,
    pub name: String,
    pub storage: u32,
}
