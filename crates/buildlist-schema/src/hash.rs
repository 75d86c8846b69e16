//! Content hash algorithms and the hex digests they produce.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

use blake2::Blake2b;
use blake2::digest::consts::U32;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use sha3::Sha3_256;

type Blake2b256 = Blake2b<U32>;

/// Read size used when hashing files.
pub const BLOCK_SIZE: usize = 256 * 1024;

/// Errors raised while naming or validating content hashes.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    /// The string does not name a supported hash algorithm.
    #[error("unknown hash type '{0}'")]
    UnknownType(String),

    /// The string is not a well-formed hex digest for the algorithm.
    #[error("invalid {hash_type} hash: '{value}'")]
    InvalidHash {
        /// Algorithm the value was checked against.
        hash_type: HashType,
        /// The rejected value.
        value: String,
    },
}

/// Algorithm used to address content in trees and stores.
///
/// This is independent of the digest used for signing a build list, which is
/// always SHA-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashType {
    /// SHA-1, 20 bytes.
    Sha1,
    /// SHA2-256, 32 bytes.
    #[default]
    Sha2,
    /// SHA3-256, 32 bytes.
    Sha3,
    /// BLAKE2b with a 256-bit output.
    Blake2b,
}

impl HashType {
    /// Every supported algorithm.
    pub const ALL: [HashType; 4] = [
        HashType::Sha1,
        HashType::Sha2,
        HashType::Sha3,
        HashType::Blake2b,
    ];

    /// Conventional display name, e.g. `SHA2-256`.
    pub fn name(self) -> &'static str {
        match self {
            HashType::Sha1 => "SHA1",
            HashType::Sha2 => "SHA2-256",
            HashType::Sha3 => "SHA3-256",
            HashType::Blake2b => "BLAKE2b-256",
        }
    }

    /// Length of a hex-encoded digest.
    pub fn hex_len(self) -> usize {
        match self {
            HashType::Sha1 => 40,
            HashType::Sha2 | HashType::Sha3 | HashType::Blake2b => 64,
        }
    }

    /// Start an incremental hash.
    pub fn hasher(self) -> ContentHasher {
        match self {
            HashType::Sha1 => ContentHasher::Sha1(Sha1::new()),
            HashType::Sha2 => ContentHasher::Sha2(Sha256::new()),
            HashType::Sha3 => ContentHasher::Sha3(Sha3_256::new()),
            HashType::Blake2b => ContentHasher::Blake2b(Blake2b256::new()),
        }
    }

    /// Hash a byte slice.
    pub fn digest(self, data: &[u8]) -> ContentHash {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finalize()
    }

    /// Hash everything readable from `reader`.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised by the reader.
    pub fn digest_reader<R: Read>(self, mut reader: R) -> io::Result<ContentHash> {
        let mut hasher = self.hasher();
        let mut buffer = vec![0u8; BLOCK_SIZE];

        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(hasher.finalize())
    }

    /// Hash a file in `BLOCK_SIZE` reads.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened or read.
    pub fn digest_file(self, path: &Path) -> io::Result<ContentHash> {
        self.digest_reader(File::open(path)?)
    }
}

impl fmt::Display for HashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashType {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(HashType::Sha1),
            "sha2" | "sha256" | "sha2-256" => Ok(HashType::Sha2),
            "sha3" | "sha3-256" => Ok(HashType::Sha3),
            "blake2b" | "blake2b-256" => Ok(HashType::Blake2b),
            _ => Err(HashError::UnknownType(s.to_string())),
        }
    }
}

/// Incremental hasher for any [`HashType`].
#[derive(Clone)]
pub enum ContentHasher {
    /// SHA-1 state.
    Sha1(Sha1),
    /// SHA2-256 state.
    Sha2(Sha256),
    /// SHA3-256 state.
    Sha3(Sha3_256),
    /// BLAKE2b-256 state.
    Blake2b(Blake2b256),
}

impl fmt::Debug for ContentHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContentHasher")
            .field(&self.hash_type())
            .finish()
    }
}

impl ContentHasher {
    /// Algorithm this hasher computes.
    pub fn hash_type(&self) -> HashType {
        match self {
            ContentHasher::Sha1(_) => HashType::Sha1,
            ContentHasher::Sha2(_) => HashType::Sha2,
            ContentHasher::Sha3(_) => HashType::Sha3,
            ContentHasher::Blake2b(_) => HashType::Blake2b,
        }
    }

    /// Feed more bytes.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            ContentHasher::Sha1(h) => h.update(data),
            ContentHasher::Sha2(h) => h.update(data),
            ContentHasher::Sha3(h) => h.update(data),
            ContentHasher::Blake2b(h) => h.update(data),
        }
    }

    /// Finish and hex-encode the digest.
    pub fn finalize(self) -> ContentHash {
        let bytes = match self {
            ContentHasher::Sha1(h) => h.finalize().to_vec(),
            ContentHasher::Sha2(h) => h.finalize().to_vec(),
            ContentHasher::Sha3(h) => h.finalize().to_vec(),
            ContentHasher::Blake2b(h) => h.finalize().to_vec(),
        };
        ContentHash(hex::encode(bytes))
    }
}

/// Lowercase hex digest addressing a blob of content.
///
/// Values built with [`ContentHash::new`] are trusted as-is; values coming
/// from untrusted text should go through [`ContentHash::validated`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Wrap a hex string without validation.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Validate `s` as a hex digest of `hash_type` and normalise it to lowercase.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::InvalidHash`] if `s` has the wrong length or
    /// contains non-hex characters.
    pub fn validated(s: &str, hash_type: HashType) -> Result<Self, HashError> {
        if s.len() == hash_type.hex_len() && s.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(s.to_ascii_lowercase()))
        } else {
            Err(HashError::InvalidHash {
                hash_type,
                value: s.to_string(),
            })
        }
    }

    /// Return the hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(
            HashType::Sha1.digest(b"abc").as_str(),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            HashType::Sha2.digest(b"abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            HashType::Sha3.digest(b"abc").as_str(),
            "3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532"
        );
    }

    #[test]
    fn digest_lengths_match_hex_len() {
        for hash_type in HashType::ALL {
            assert_eq!(hash_type.digest(b"data").as_str().len(), hash_type.hex_len());
        }
    }

    #[test]
    fn file_digest_spans_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big");
        let data: Vec<u8> = (0..BLOCK_SIZE * 2 + 17).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        for hash_type in HashType::ALL {
            assert_eq!(hash_type.digest_file(&path).unwrap(), hash_type.digest(&data));
        }
    }

    #[test]
    fn parse_names() {
        assert_eq!("SHA2".parse::<HashType>().unwrap(), HashType::Sha2);
        assert_eq!("sha3-256".parse::<HashType>().unwrap(), HashType::Sha3);
        assert_eq!("blake2b".parse::<HashType>().unwrap(), HashType::Blake2b);
        assert!("md5".parse::<HashType>().is_err());
    }

    #[test]
    fn validated_checks_length_and_case() {
        let upper = "A9993E364706816ABA3E25717850C26C9CD0D89D";
        let hash = ContentHash::validated(upper, HashType::Sha1).unwrap();
        assert_eq!(hash.as_str(), upper.to_ascii_lowercase());

        assert!(ContentHash::validated(upper, HashType::Sha2).is_err());
        assert!(ContentHash::validated("zz", HashType::Sha1).is_err());
    }
}
