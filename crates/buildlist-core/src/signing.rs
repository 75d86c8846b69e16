//! RSA-PSS signatures over a SHA-1 digest of the canonical body.
//!
//! The signing digest is always SHA-1, whatever algorithm addresses the
//! tree's content. Changing it would invalidate every existing signature.

use rsa::{Pss, RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};

use crate::error::Result;

/// SHA-1 of the canonical body bytes.
pub fn canonical_digest(body: &[u8]) -> Vec<u8> {
    Sha1::digest(body).to_vec()
}

/// Sign a precomputed digest with RSA-PSS.
///
/// # Errors
///
/// Returns [`crate::BuildListError::Rsa`] if the key is too small for the
/// padding or signing otherwise fails.
pub fn sign_digest(key: &RsaPrivateKey, digest: &[u8]) -> Result<Vec<u8>> {
    let mut rng = rand::thread_rng();
    Ok(key.sign_with_rng(&mut rng, Pss::new::<Sha1>(), digest)?)
}

/// Check an RSA-PSS signature over a precomputed digest.
pub fn verify_digest(key: &RsaPublicKey, digest: &[u8], signature: &[u8]) -> bool {
    key.verify(Pss::new::<Sha1>(), digest, signature).is_ok()
}
