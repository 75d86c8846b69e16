//! Shared fixtures for unit tests.

use std::fs;
use std::sync::OnceLock;

use buildlist_schema::{ContentTree, Exclusions, HashType, NlhTree};
use rsa::RsaPrivateKey;
use tempfile::TempDir;

use crate::manifest::BuildList;

fn generate() -> RsaPrivateKey {
    RsaPrivateKey::new(&mut rand::thread_rng(), 1024).expect("generate test key")
}

/// Key signing every sample list. Generated once per test binary.
pub(crate) fn test_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(generate)
}

/// A key unrelated to [`test_key`].
pub(crate) fn other_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(generate)
}

/// Write a small fixed directory named `dataDir` inside `root`.
pub(crate) fn write_data_dir(root: &TempDir) -> std::path::PathBuf {
    let data = root.path().join("dataDir");
    fs::create_dir_all(data.join("sub").join("deeper")).unwrap();
    fs::write(data.join("a.txt"), b"alpha\n").unwrap();
    fs::write(data.join("sub").join("b.txt"), b"bravo\n").unwrap();
    fs::write(data.join("sub").join("deeper").join("c.bin"), [0u8, 1, 2, 3]).unwrap();
    data
}

/// An unsigned list titled `a trial list` over a fresh `dataDir`.
///
/// The directory lives as long as the returned `TempDir`.
pub(crate) fn sample_list(hash_type: HashType) -> (TempDir, BuildList<NlhTree>) {
    let root = tempfile::tempdir().unwrap();
    let data = write_data_dir(&root);
    let tree = NlhTree::from_dir(&data, hash_type, &Exclusions::none()).unwrap();
    let list = BuildList::new("a trial list", test_key().to_public_key(), tree).unwrap();
    (root, list)
}
