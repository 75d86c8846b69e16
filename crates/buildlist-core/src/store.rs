//! Content-Addressable Store
//!
//! Blobs are kept under their content hash in a directory tree sharded by
//! hash prefix. Build lists are stored the same way as the files they
//! describe.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use buildlist_schema::hash::BLOCK_SIZE;
use buildlist_schema::{ContentHash, HashType};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::paths::create_dir_0711;

/// Errors raised by a content store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// No blob is stored under the hash.
    #[error("not found in store: {0}")]
    NotFound(ContentHash),

    /// The store root exists but is not a directory.
    #[error("store root is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Content-addressed blob storage.
///
/// `put` is idempotent: storing identical bytes twice is harmless. It
/// reports the hash the store actually computed so callers can detect
/// content that changed under them.
pub trait ContentStore {
    /// Algorithm addressing this store.
    fn hash_type(&self) -> HashType;

    /// Store `data`, returning its length and the hash it is stored under.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the blob cannot be written.
    fn put(&self, data: &[u8], expected: &ContentHash) -> Result<(u64, ContentHash), StoreError>;

    /// Whether a blob is stored under `hash`.
    fn has(&self, hash: &ContentHash) -> bool;

    /// Read the blob stored under `hash`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the blob is absent.
    fn fetch(&self, hash: &ContentHash) -> Result<Vec<u8>, StoreError>;

    /// Store the contents of the file at `path`, like [`ContentStore::put`].
    ///
    /// The default reads the whole file; stores that can stream override it.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the file cannot be read or the blob cannot
    /// be written.
    fn put_file(
        &self,
        path: &Path,
        expected: &ContentHash,
    ) -> Result<(u64, ContentHash), StoreError> {
        let data = fs::read(path)?;
        self.put(&data, expected)
    }
}

/// How blob paths are derived from their hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreLayout {
    /// `root/<hash>`
    Flat,
    /// `root/ab/<hash>`
    #[default]
    Shard256,
    /// `root/a/b/<hash>`
    Shard16x16,
}

/// A [`ContentStore`] backed by a local directory.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
    hash_type: HashType,
    layout: StoreLayout,
}

impl BlobStore {
    /// Open a store at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Fails if `root` cannot be created or is not a directory.
    pub fn open(
        root: impl Into<PathBuf>,
        hash_type: HashType,
        layout: StoreLayout,
    ) -> Result<Self, StoreError> {
        let root = root.into();
        create_dir_0711(&root)?;
        if !root.is_dir() {
            return Err(StoreError::NotADirectory(root));
        }
        Ok(Self {
            root,
            hash_type,
            layout,
        })
    }

    /// Store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sharding scheme.
    pub fn layout(&self) -> StoreLayout {
        self.layout
    }

    /// Path a blob with `hash` lives at.
    pub fn blob_path(&self, hash: &ContentHash) -> PathBuf {
        let hex = hash.as_str();
        match (self.layout, hex.get(..1), hex.get(1..2)) {
            (StoreLayout::Shard256, Some(_), Some(_)) => self.root.join(&hex[..2]).join(hex),
            (StoreLayout::Shard16x16, Some(a), Some(b)) => self.root.join(a).join(b).join(hex),
            _ => self.root.join(hex),
        }
    }

    fn blob_parent(&self, blob: &Path) -> Result<PathBuf, StoreError> {
        let parent = blob.parent().unwrap_or(&self.root).to_path_buf();
        create_dir_0711(&parent)?;
        Ok(parent)
    }
}

impl ContentStore for BlobStore {
    fn hash_type(&self) -> HashType {
        self.hash_type
    }

    fn put(&self, data: &[u8], expected: &ContentHash) -> Result<(u64, ContentHash), StoreError> {
        let actual = self.hash_type.digest(data);
        if &actual != expected {
            warn!("expected {expected} but content hashes to {actual}");
        }

        let blob = self.blob_path(&actual);
        // Content-addressed blobs are immutable
        if !blob.exists() {
            let parent = self.blob_parent(&blob)?;
            let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
            tmp.write_all(data)?;
            tmp.persist(&blob).map_err(|e| e.error)?;
            debug!("stored {} bytes as {actual}", data.len());
        }

        Ok((data.len() as u64, actual))
    }

    /// Hashes while copying into a temporary file beside the shards, so the
    /// file is read once and the blob always matches its name.
    fn put_file(
        &self,
        path: &Path,
        expected: &ContentHash,
    ) -> Result<(u64, ContentHash), StoreError> {
        let mut src = fs::File::open(path)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        let mut hasher = self.hash_type.hasher();
        let mut buffer = vec![0u8; BLOCK_SIZE];
        let mut len: u64 = 0;
        loop {
            let n = src.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
            tmp.write_all(&buffer[..n])?;
            len += n as u64;
        }

        let actual = hasher.finalize();
        if &actual != expected {
            warn!("expected {expected} but {} hashes to {actual}", path.display());
        }

        let blob = self.blob_path(&actual);
        if !blob.exists() {
            self.blob_parent(&blob)?;
            tmp.persist(&blob).map_err(|e| e.error)?;
            debug!("stored {} as {actual}", path.display());
        }
        Ok((len, actual))
    }

    fn has(&self, hash: &ContentHash) -> bool {
        self.blob_path(hash).is_file()
    }

    fn fetch(&self, hash: &ContentHash) -> Result<Vec<u8>, StoreError> {
        match fs::read(self.blob_path(hash)) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound(hash.clone())),
            Err(e) => Err(e.into()),
        }
    }
}
