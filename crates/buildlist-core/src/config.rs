//! Synchronizer configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use buildlist_schema::HashType;
use serde::{Deserialize, Serialize};

use crate::error::{BuildListError, Result};
use crate::store::StoreLayout;

/// Settings for a [`crate::sync::Synchronizer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Directory holding the local listing, build log, and version file,
    /// relative to the working directory unless absolute.
    #[serde(default = "default_meta_dir")]
    pub meta_dir: PathBuf,
    /// File name of the last published listing inside `meta_dir`.
    #[serde(default = "default_list_file")]
    pub list_file: String,
    /// File name of the append-only build log inside `meta_dir`.
    #[serde(default = "default_log_file")]
    pub log_file: String,
    /// RSA private key used by `list_gen`.
    #[serde(default)]
    pub key_path: Option<PathBuf>,
    /// Glob patterns matched against file and directory names.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    /// Append a line to the build log on every publish.
    #[serde(default)]
    pub logging: bool,
    /// Content hash algorithm for new trees.
    #[serde(default)]
    pub hash_type: HashType,
    /// Root of the local blob store.
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    /// Sharding of the local blob store.
    #[serde(default)]
    pub store_layout: StoreLayout,
    /// Refuse data directories whose path contains `.` or `..`.
    #[serde(default)]
    pub reject_dot_segments: bool,
}

fn default_meta_dir() -> PathBuf {
    PathBuf::from(".dvcz")
}

fn default_list_file() -> String {
    "lastBuildList".to_string()
}

fn default_log_file() -> String {
    "builds".to_string()
}

fn default_exclude() -> Vec<String> {
    vec!["build".to_string()]
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            meta_dir: default_meta_dir(),
            list_file: default_list_file(),
            log_file: default_log_file(),
            key_path: None,
            exclude: default_exclude(),
            logging: false,
            hash_type: HashType::default(),
            store_path: None,
            store_layout: StoreLayout::default(),
            reject_dot_segments: false,
        }
    }
}

impl SyncConfig {
    /// Read a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`BuildListError::NotFound`] if the file is missing and
    /// [`BuildListError::Config`] if it is not valid.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| BuildListError::from_io_at(e, path))?;
        toml::from_str(&content).map_err(|source| BuildListError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`SyncConfig::load`], but a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|source| BuildListError::Config {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Where the last published listing is written.
    pub fn listing_path(&self) -> PathBuf {
        self.meta_dir.join(&self.list_file)
    }

    /// Where build log lines are appended.
    pub fn log_path(&self) -> PathBuf {
        self.meta_dir.join(&self.log_file)
    }

    /// Version file consulted by `list_gen`.
    pub fn version_path(&self) -> PathBuf {
        self.meta_dir.join("version")
    }
}
