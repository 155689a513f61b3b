use clap::{Parser, Subcommand};
use once_cell::sync::Lazy;
use std::path::PathBuf;

pub static LONG_VERSION: Lazy<String> = Lazy::new(|| {
    let version = env!("CARGO_PKG_VERSION");
    if env!("IS_RELEASE") == "true" || env!("GIT_HASH").is_empty() {
        version.to_string()
    } else {
        format!("{} ({} {})", version, env!("GIT_HASH"), env!("GIT_COMMIT_DATE"))
    }
});

#[derive(Parser, Debug)]
#[command(name = "fal-dummy")]
#[command(version, long_version = LONG_VERSION.as_str())]
#[command(about = "Serve placeholder images for files missing from a storage volume", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Storage root directory (defaults to the current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Index file with the known file records (defaults to <root>/.fal_dummy/index.json)
    #[arg(long, global = true)]
    pub index: Option<PathBuf>,

    /// Numeric id of the storage volume
    #[arg(long, global = true, default_value_t = 1)]
    pub storage: u32,

    /// Public base URL of the storage root
    #[arg(long, global = true, default_value = "/fileadmin")]
    pub public_url: String,

    /// Directory holding config.json (defaults to FAL_DUMMY_CONFIG_DIR, then the OS config dir)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Timeout in seconds for remote placeholder requests
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether a file exists (placeholders count as existing)
    Exists { identifier: String },

    /// Write a file's contents to stdout
    Cat { identifier: String },

    /// Print a file's public URL
    Url { identifier: String },

    /// Print a file's hash
    Hash {
        identifier: String,

        /// Hash algorithm (sha1 or md5)
        #[arg(short, long, default_value = "sha1")]
        algorithm: String,
    },

    /// Materialize a file locally and print the path
    Local {
        identifier: String,

        /// Always produce a scratch copy that may be modified
        #[arg(long)]
        writable: bool,
    },

    /// Print a file's permissions
    Perms { identifier: String },

    /// Print information about a folder
    Folder { identifier: String },

    /// List a folder's entries
    #[command(alias = "ls")]
    List {
        #[arg(default_value = "/")]
        identifier: String,
    },

    /// Explain whether a file is served by the real driver or a placeholder
    Route { identifier: String },

    /// Get or set configuration
    Config {
        /// Configuration key (e.g., imageMaxWidth)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}
