//! Domain-specific errors for build list operations

use std::path::PathBuf;

use buildlist_schema::{ContentHash, HashType, TreeError};
use thiserror::Error;

use crate::store::StoreError;

/// Result alias used throughout the crate.
pub type Result<T, E = BuildListError> = std::result::Result<T, E>;

/// Everything that can go wrong building, signing, parsing, or reconciling
/// a build list.
///
/// Audits never produce these for ordinary mismatches; they return the
/// mismatches as data instead.
#[derive(Error, Debug)]
pub enum BuildListError {
    /// Serialized text is malformed, truncated, or out of order.
    #[error("parse failed at {field}: {detail}")]
    Parse {
        /// The field the parser expected.
        field: &'static str,
        /// What it found instead.
        detail: String,
    },

    /// The timestamp line is not `YYYY-MM-DD HH:MM:SS`.
    #[error("bad timestamp '{value}': {source}")]
    BadTimestamp {
        /// The rejected line.
        value: String,
        /// Underlying format error.
        #[source]
        source: chrono::ParseError,
    },

    /// `sign()` was called on a list that already carries a signature.
    #[error("build list is already signed")]
    AlreadySigned,

    /// The private key is not the counterpart of the list's public key.
    #[error("private key does not match the build list's public key")]
    KeyMismatch,

    /// The populate target's directory name differs from the tree's root.
    #[error("name mismatch: tree is '{tree}' but target directory is '{dir}'")]
    NameMismatch {
        /// Root name recorded in the tree.
        tree: String,
        /// Final segment of the target directory.
        dir: String,
    },

    /// Content hashed to something other than what was expected.
    #[error("integrity check failed for {what}: expected {expected}, got {actual}")]
    Integrity {
        /// What was being written or read.
        what: String,
        /// Locally computed or recorded hash.
        expected: ContentHash,
        /// Hash reported by the store or recomputed from the bytes.
        actual: ContentHash,
    },

    /// An expected path or blob is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// A title contained a line terminator.
    #[error("invalid title {0:?}: titles must be a single line")]
    InvalidTitle(String),

    /// Tree and store are addressed by different algorithms.
    #[error("hash type mismatch: expected {expected}, got {actual}")]
    HashTypeMismatch {
        /// Algorithm of the build list.
        expected: HashType,
        /// Algorithm of the store.
        actual: HashType,
    },

    /// A path failed the optional dot-segment check.
    #[error("path contains '.' or '..' segments: {0}")]
    DotSegment(PathBuf),

    /// Key material could not be encoded or decoded.
    #[error("key encoding error: {0}")]
    KeyEncoding(String),

    /// RSA signing failed.
    #[error("RSA error: {0}")]
    Rsa(#[from] rsa::Error),

    /// A configuration file could not be parsed.
    #[error("invalid config {path}: {source}")]
    Config {
        /// The config file.
        path: PathBuf,
        /// TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// Content tree failure.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Content store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Any other I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildListError {
    /// Shorthand for a [`BuildListError::Parse`].
    pub fn parse(field: &'static str, detail: impl std::fmt::Display) -> Self {
        Self::Parse {
            field,
            detail: detail.to_string(),
        }
    }

    /// Map a `NotFound` I/O error on `path` to [`BuildListError::NotFound`].
    pub(crate) fn from_io_at(err: std::io::Error, path: &std::path::Path) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path.display().to_string())
        } else {
            Self::Io(err)
        }
    }
}

impl From<rsa::pkcs1::Error> for BuildListError {
    fn from(err: rsa::pkcs1::Error) -> Self {
        Self::KeyEncoding(err.to_string())
    }
}

impl From<rsa::pkcs8::Error> for BuildListError {
    fn from(err: rsa::pkcs8::Error) -> Self {
        Self::KeyEncoding(err.to_string())
    }
}

impl From<rsa::pkcs8::spki::Error> for BuildListError {
    fn from(err: rsa::pkcs8::spki::Error) -> Self {
        Self::KeyEncoding(err.to_string())
    }
}
