pub mod check;
pub mod generate;
pub mod keygen;
pub mod populate;
pub mod publish;
pub mod verify;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use buildlist_core::{BlobStore, BuildList, SyncConfig, paths};
use buildlist_schema::HashType;

use crate::DEFAULT_CONFIG;

/// Configuration shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: SyncConfig,
}

impl Context {
    /// Load `path` if given (it must exist), else `./buildlist.toml` if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => SyncConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => SyncConfig::load_or_default(Path::new(DEFAULT_CONFIG))
                .context("Failed to load buildlist.toml")?,
        };
        Ok(Self { config })
    }

    /// The key given on the command line, else the configured one, else the
    /// default location.
    pub fn key_path(&self, flag: Option<PathBuf>) -> Result<PathBuf> {
        flag.or_else(|| self.config.key_path.clone())
            .or_else(paths::default_key_path)
            .context("No signing key given and no home directory to look in")
    }

    pub fn hash_type(&self, flag: Option<HashType>) -> HashType {
        flag.unwrap_or(self.config.hash_type)
    }

    pub fn open_store(&self, flag: Option<PathBuf>, hash_type: HashType) -> Result<BlobStore> {
        let Some(root) = flag.or_else(|| self.config.store_path.clone()) else {
            bail!("No store given: pass --store or set store_path in the config");
        };
        BlobStore::open(&root, hash_type, self.config.store_layout)
            .with_context(|| format!("Failed to open store {}", root.display()))
    }

    pub fn read_list(&self, path: &Path, hash_type: HashType) -> Result<BuildList> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read build list {}", path.display()))?;
        BuildList::parse(&text, hash_type)
            .with_context(|| format!("Failed to parse build list {}", path.display()))
    }
}
