//! The build list: a signed description of a directory's content.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use buildlist_schema::{ContentTree, HashType, NlhTree};
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::debug;

use crate::codec;
use crate::error::{BuildListError, Result};
use crate::signing;
use crate::timestamp;

/// A title, an RSA public key, and a content tree, optionally signed.
///
/// A list starts unsigned with a zero timestamp. [`BuildList::sign`] stamps
/// the current time and attaches an RSA-PSS signature; after that nothing
/// about the list can change.
#[derive(Debug, Clone)]
pub struct BuildList<T = NlhTree> {
    title: String,
    public_key: RsaPublicKey,
    tree: T,
    when: i64,
    signature: Option<Vec<u8>>,
}

fn checked_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.contains(['\n', '\r']) {
        return Err(BuildListError::InvalidTitle(title.to_string()));
    }
    Ok(title.to_string())
}

impl<T: ContentTree> BuildList<T> {
    /// Create an unsigned list. The title is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`BuildListError::InvalidTitle`] if the trimmed title still
    /// contains a line terminator.
    pub fn new(title: &str, public_key: RsaPublicKey, tree: T) -> Result<Self> {
        Ok(Self {
            title: checked_title(title)?,
            public_key,
            tree,
            when: 0,
            signature: None,
        })
    }

    pub(crate) fn from_parts(
        title: &str,
        public_key: RsaPublicKey,
        tree: T,
        when: i64,
        signature: Option<Vec<u8>>,
    ) -> Result<Self> {
        Ok(Self {
            title: checked_title(title)?,
            public_key,
            tree,
            when,
            signature,
        })
    }

    /// Parse the text form; see [`codec::decode`].
    ///
    /// # Errors
    ///
    /// See [`codec::decode`].
    pub fn parse(text: &str, hash_type: HashType) -> Result<Self> {
        codec::decode(text, hash_type)
    }

    /// Serialize to the text form; see [`codec::encode`].
    ///
    /// # Errors
    ///
    /// Fails only if the public key cannot be PEM-encoded.
    pub fn to_text(&self) -> Result<String> {
        codec::encode(self)
    }

    /// The trimmed title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The signer's public key.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// The content tree.
    pub fn tree(&self) -> &T {
        &self.tree
    }

    /// Algorithm addressing the tree's content.
    pub fn hash_type(&self) -> HashType {
        self.tree.hash_type()
    }

    /// Seconds since the epoch at signing, or 0 if unsigned.
    pub fn when(&self) -> i64 {
        self.when
    }

    /// The timestamp as written in the text form.
    pub fn timestamp_string(&self) -> String {
        timestamp::format(self.when)
    }

    /// Raw signature bytes.
    pub fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    /// Signature as it appears in the text form.
    pub fn signature_b64(&self) -> Option<String> {
        self.signature.as_ref().map(|s| STANDARD.encode(s))
    }

    /// Whether `sign` has succeeded.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    fn digest(&self) -> Result<Vec<u8>> {
        let body = codec::canonical_body(self)?;
        Ok(signing::canonical_digest(body.as_bytes()))
    }

    /// Stamp the current time and sign with `key`.
    ///
    /// The timestamp is part of what is signed, so it is set here and not
    /// before.
    ///
    /// # Errors
    ///
    /// Returns [`BuildListError::AlreadySigned`] on a signed list,
    /// [`BuildListError::KeyMismatch`] if `key` does not belong to the list's
    /// public key, or an RSA error if signing fails. On error the list is left
    /// unchanged.
    pub fn sign(&mut self, key: &RsaPrivateKey) -> Result<()> {
        if self.signature.is_some() {
            return Err(BuildListError::AlreadySigned);
        }
        if key.to_public_key() != self.public_key {
            return Err(BuildListError::KeyMismatch);
        }

        self.when = timestamp::now();
        let signed = self
            .digest()
            .and_then(|digest| signing::sign_digest(key, &digest));
        match signed {
            Ok(sig) => {
                debug!("signed build list '{}' at {}", self.title, self.when);
                self.signature = Some(sig);
                Ok(())
            }
            Err(e) => {
                self.when = 0;
                Err(e)
            }
        }
    }

    /// Whether the list is signed and the signature matches its current
    /// content. A bad signature is `false`, not an error.
    pub fn verify(&self) -> bool {
        let Some(sig) = &self.signature else {
            return false;
        };
        match self.digest() {
            Ok(digest) => signing::verify_digest(&self.public_key, &digest, sig),
            Err(_) => false,
        }
    }
}

impl<T: ContentTree> PartialEq for BuildList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title
            && self.public_key == other.public_key
            && self.tree == other.tree
            && self.when == other.when
            && self.signature == other.signature
    }
}

impl<T: ContentTree> fmt::Display for BuildList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_text().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
