//! Reconciling directories and content stores against a build list.
//!
//! The free functions are the pure operations: building an unsigned list,
//! auditing a directory or a store, and repopulating a directory. The
//! [`Synchronizer`] adds what needs configuration: exclusions, the local
//! listing, the build log, and the signing key.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use buildlist_schema::{ContentHash, ContentTree, Exclusions, HashType, NlhTree};
use rsa::RsaPublicKey;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::{BuildListError, Result};
use crate::keys;
use crate::manifest::BuildList;
use crate::paths::{create_dir_0711, create_parent_dirs, has_dot_segments};
use crate::store::{ContentStore, StoreError};

/// A leaf that failed an audit: its recorded hash and relative path.
pub type Mismatch = (ContentHash, String);

/// Version assumed in the build log when no version file exists.
pub const DEFAULT_VERSION: &str = "0.0.0";

fn leaf_path(root: &Path, rel: &str) -> PathBuf {
    rel.split('/').fold(root.to_path_buf(), |p, seg| p.join(seg))
}

/// Build an unsigned list describing `path`.
///
/// # Errors
///
/// Returns [`BuildListError::NotFound`] if `path` is not an existing
/// directory, or a tree error if a pattern is invalid or a file cannot be
/// hashed.
pub fn build_from_directory<T: ContentTree, S: AsRef<str>>(
    title: &str,
    path: &Path,
    public_key: RsaPublicKey,
    hash_type: HashType,
    exclude: &[S],
) -> Result<BuildList<T>> {
    if !path.is_dir() {
        return Err(BuildListError::NotFound(path.display().to_string()));
    }
    let exclusions = Exclusions::new(exclude)?;
    let tree = T::from_dir(path, hash_type, &exclusions)?;
    BuildList::new(title, public_key, tree)
}

/// Leaves whose file under `data_dir` is missing or hashes differently.
///
/// An empty result means the directory matches the list.
pub fn check_against_directory<T: ContentTree>(
    list: &BuildList<T>,
    data_dir: &Path,
) -> Vec<Mismatch> {
    let hash_type = list.hash_type();
    let mismatches: Vec<Mismatch> = list
        .tree()
        .leaves()
        .into_iter()
        .filter(|leaf| match hash_type.digest_file(&leaf_path(data_dir, &leaf.path)) {
            Ok(actual) => actual != leaf.hash,
            Err(_) => true,
        })
        .map(|leaf| (leaf.hash, leaf.path))
        .collect();

    if !mismatches.is_empty() {
        info!(
            "{} files under {} differ from the build list",
            mismatches.len(),
            data_dir.display()
        );
    }
    mismatches
}

/// Leaves whose content is not present in `store`.
pub fn check_against_store<T: ContentTree, S: ContentStore>(
    list: &BuildList<T>,
    store: &S,
) -> Vec<Mismatch> {
    if store.hash_type() != list.hash_type() {
        warn!(
            "auditing a {} list against a {} store",
            list.hash_type(),
            store.hash_type()
        );
    }
    let missing: Vec<Mismatch> = list
        .tree()
        .leaves()
        .into_iter()
        .filter(|leaf| !store.has(&leaf.hash))
        .map(|leaf| (leaf.hash, leaf.path))
        .collect();

    if !missing.is_empty() {
        info!("{} leaves are missing from the store", missing.len());
    }
    missing
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .or_else(|| {
            fs::canonicalize(dir)
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
        .unwrap_or_default()
}

/// Write every leaf of `list` from `store` into `dest_dir`.
///
/// The last segment of `dest_dir` must be the tree's root name. Fetched
/// bytes are hashed before they are written. A failure partway through
/// leaves `dest_dir` partially populated.
///
/// # Errors
///
/// Returns [`BuildListError::NameMismatch`] if the names differ,
/// [`BuildListError::NotFound`] if the store lacks a leaf, and
/// [`BuildListError::Integrity`] if a blob hashes differently from its leaf.
pub fn populate<T: ContentTree, S: ContentStore>(
    list: &BuildList<T>,
    store: &S,
    dest_dir: &Path,
) -> Result<()> {
    let dir = dir_name(dest_dir);
    if dir != list.tree().name() {
        return Err(BuildListError::NameMismatch {
            tree: list.tree().name().to_string(),
            dir,
        });
    }

    let leaves = list.tree().leaves();
    if let Some(leaf) = leaves.iter().find(|l| has_dot_segments(Path::new(&l.path))) {
        return Err(BuildListError::DotSegment(PathBuf::from(&leaf.path)));
    }

    create_dir_0711(dest_dir)?;
    let hash_type = list.hash_type();
    for leaf in &leaves {
        let data = store.fetch(&leaf.hash).map_err(|e| match e {
            StoreError::NotFound(hash) => {
                BuildListError::NotFound(format!("{} ({hash})", leaf.path))
            }
            other => other.into(),
        })?;

        let actual = hash_type.digest(&data);
        if actual != leaf.hash {
            return Err(BuildListError::Integrity {
                what: leaf.path.clone(),
                expected: leaf.hash.clone(),
                actual,
            });
        }

        let target = leaf_path(dest_dir, &leaf.path);
        create_parent_dirs(&target)?;
        fs::write(&target, &data)?;
    }

    info!("populated {} files into {}", leaves.len(), dest_dir.display());
    Ok(())
}

/// Build, publish, and record build lists according to a [`SyncConfig`].
#[derive(Debug, Clone, Default)]
pub struct Synchronizer {
    config: SyncConfig,
}

impl Synchronizer {
    /// Wrap a configuration.
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// First line of the version file, if there is one.
    ///
    /// # Errors
    ///
    /// Fails if the version file exists but cannot be read.
    pub fn version(&self) -> Result<Option<String>> {
        let path = self.config.version_path();
        match fs::read_to_string(&path) {
            Ok(content) => Ok(content
                .lines()
                .next()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// [`build_from_directory`] with the configured hash type and exclusions.
    ///
    /// # Errors
    ///
    /// Returns [`BuildListError::DotSegment`] when `reject_dot_segments` is
    /// set and `data_dir` contains `.` or `..`, otherwise as
    /// [`build_from_directory`].
    pub fn build<T: ContentTree>(
        &self,
        title: &str,
        data_dir: &Path,
        public_key: RsaPublicKey,
    ) -> Result<BuildList<T>> {
        if self.config.reject_dot_segments && has_dot_segments(data_dir) {
            return Err(BuildListError::DotSegment(data_dir.to_path_buf()));
        }
        build_from_directory(
            title,
            data_dir,
            public_key,
            self.config.hash_type,
            &self.config.exclude,
        )
    }

    /// Copy every leaf from `data_dir` into `store`, then the serialized
    /// list itself, and record the listing locally.
    ///
    /// Returns the hash the list is stored under.
    ///
    /// # Errors
    ///
    /// Returns [`BuildListError::HashTypeMismatch`] if the store uses another
    /// algorithm, [`BuildListError::NotFound`] for a missing source file, and
    /// [`BuildListError::Integrity`] if the store reports a hash other than
    /// the one computed here.
    pub fn publish<T: ContentTree, S: ContentStore>(
        &self,
        list: &BuildList<T>,
        store: &S,
        data_dir: &Path,
    ) -> Result<ContentHash> {
        if store.hash_type() != list.hash_type() {
            return Err(BuildListError::HashTypeMismatch {
                expected: list.hash_type(),
                actual: store.hash_type(),
            });
        }

        let leaves = list.tree().leaves();
        for leaf in &leaves {
            let path = leaf_path(data_dir, &leaf.path);
            let (_, actual) = store.put_file(&path, &leaf.hash).map_err(|e| match e {
                StoreError::Io(io) => BuildListError::from_io_at(io, &path),
                other => other.into(),
            })?;
            if actual != leaf.hash {
                return Err(BuildListError::Integrity {
                    what: leaf.path.clone(),
                    expected: leaf.hash.clone(),
                    actual,
                });
            }
        }

        let text = list.to_text()?;
        let digest = store.hash_type().digest(text.as_bytes());
        let (_, actual) = store.put(text.as_bytes(), &digest)?;
        if actual != digest {
            return Err(BuildListError::Integrity {
                what: format!("build list '{}'", list.title()),
                expected: digest,
                actual,
            });
        }

        self.record(list, &text, &digest)?;
        info!(
            "published {} files and build list {digest}",
            leaves.len()
        );
        Ok(digest)
    }

    /// Write the local listing and, if enabled, append to the build log.
    fn record<T: ContentTree>(
        &self,
        list: &BuildList<T>,
        text: &str,
        digest: &ContentHash,
    ) -> Result<()> {
        let listing = self.config.listing_path();
        create_parent_dirs(&listing)?;
        fs::write(&listing, text)?;
        debug!("wrote listing to {}", listing.display());

        if self.config.logging {
            let version = self
                .version()?
                .unwrap_or_else(|| DEFAULT_VERSION.to_string());
            let log = self.config.log_path();
            create_parent_dirs(&log)?;
            let mut file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log)?;
            writeln!(file, "{} v{version} {digest}", list.timestamp_string())?;
        }
        Ok(())
    }

    /// Build and sign a list for `data_dir`, then publish it to `store` if
    /// one is given. Without a store only the local listing and log are
    /// written.
    ///
    /// A version file in the metadata directory is appended to the title as
    /// `" v<version>"`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildListError::NotFound`] if no signing key is configured
    /// or the key file is missing, otherwise as [`Synchronizer::build`],
    /// [`BuildList::sign`] and [`Synchronizer::publish`].
    pub fn list_gen<T: ContentTree, S: ContentStore>(
        &self,
        title: &str,
        data_dir: &Path,
        store: Option<&S>,
    ) -> Result<BuildList<T>> {
        let title = match self.version()? {
            Some(version) => format!("{} v{version}", title.trim()),
            None => title.to_string(),
        };

        let key_path = self
            .config
            .key_path
            .as_ref()
            .ok_or_else(|| BuildListError::NotFound("signing key (key_path is not set)".into()))?;
        let key = keys::read_private_key(key_path)?;

        let mut list = self.build::<T>(&title, data_dir, key.to_public_key())?;
        list.sign(&key)?;

        match store {
            Some(store) => {
                self.publish(&list, store, data_dir)?;
            }
            None => {
                let text = list.to_text()?;
                let digest = list.hash_type().digest(text.as_bytes());
                self.record(&list, &text, &digest)?;
            }
        }
        Ok(list)
    }

    /// Read back the last listing written by this synchronizer.
    ///
    /// # Errors
    ///
    /// Returns [`BuildListError::NotFound`] if nothing has been recorded, or
    /// a parse error if the listing is malformed.
    pub fn last_listing(&self) -> Result<BuildList<NlhTree>> {
        let path = self.config.listing_path();
        let text = fs::read_to_string(&path).map_err(|e| BuildListError::from_io_at(e, &path))?;
        BuildList::parse(&text, self.config.hash_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BlobStore, StoreLayout};
    use buildlist_schema::NlhNode;
    use crate::test_support::{test_key, write_data_dir};
    use tempfile::TempDir;

    fn config_in(root: &TempDir) -> SyncConfig {
        SyncConfig {
            meta_dir: root.path().join(".dvcz"),
            store_path: Some(root.path().join("u")),
            ..SyncConfig::default()
        }
    }

    fn store_for(config: &SyncConfig) -> BlobStore {
        BlobStore::open(
            config.store_path.clone().unwrap(),
            config.hash_type,
            config.store_layout,
        )
        .unwrap()
    }

    fn key_file(root: &TempDir) -> PathBuf {
        let path = root.path().join("keys").join("skPriv.pem");
        keys::write_private_key(&path, test_key()).unwrap();
        path
    }

    /// Stores everything, but claims a different hash for every write.
    struct LyingStore(BlobStore);

    impl ContentStore for LyingStore {
        fn hash_type(&self) -> HashType {
            self.0.hash_type()
        }

        fn put(
            &self,
            data: &[u8],
            expected: &ContentHash,
        ) -> std::result::Result<(u64, ContentHash), StoreError> {
            let (len, _) = self.0.put(data, expected)?;
            Ok((len, self.0.hash_type().digest(b"something else")))
        }

        fn has(&self, hash: &ContentHash) -> bool {
            self.0.has(hash)
        }

        fn fetch(&self, hash: &ContentHash) -> std::result::Result<Vec<u8>, StoreError> {
            self.0.fetch(hash)
        }
    }

    /// Returns bytes that do not match the requested hash.
    struct CorruptStore(BlobStore);

    impl ContentStore for CorruptStore {
        fn hash_type(&self) -> HashType {
            self.0.hash_type()
        }

        fn put(
            &self,
            data: &[u8],
            expected: &ContentHash,
        ) -> std::result::Result<(u64, ContentHash), StoreError> {
            self.0.put(data, expected)
        }

        fn has(&self, hash: &ContentHash) -> bool {
            self.0.has(hash)
        }

        fn fetch(&self, hash: &ContentHash) -> std::result::Result<Vec<u8>, StoreError> {
            let mut data = self.0.fetch(hash)?;
            data.push(b'!');
            Ok(data)
        }
    }

    /// Counts how blobs arrive.
    struct CountingStore {
        inner: BlobStore,
        files: std::cell::Cell<usize>,
        buffers: std::cell::Cell<usize>,
    }

    impl ContentStore for CountingStore {
        fn hash_type(&self) -> HashType {
            self.inner.hash_type()
        }

        fn put(
            &self,
            data: &[u8],
            expected: &ContentHash,
        ) -> std::result::Result<(u64, ContentHash), StoreError> {
            self.buffers.set(self.buffers.get() + 1);
            self.inner.put(data, expected)
        }

        fn put_file(
            &self,
            path: &Path,
            expected: &ContentHash,
        ) -> std::result::Result<(u64, ContentHash), StoreError> {
            self.files.set(self.files.get() + 1);
            self.inner.put_file(path, expected)
        }

        fn has(&self, hash: &ContentHash) -> bool {
            self.inner.has(hash)
        }

        fn fetch(&self, hash: &ContentHash) -> std::result::Result<Vec<u8>, StoreError> {
            self.inner.fetch(hash)
        }
    }

    #[test]
    fn publish_streams_leaves_from_disk() {
        let root = tempfile::tempdir().unwrap();
        let data = write_data_dir(&root);
        let config = config_in(&root);
        let store = CountingStore {
            inner: store_for(&config),
            files: std::cell::Cell::new(0),
            buffers: std::cell::Cell::new(0),
        };
        let sync = Synchronizer::new(config);

        let mut list: BuildList = sync.build("t", &data, test_key().to_public_key()).unwrap();
        list.sign(test_key()).unwrap();
        sync.publish(&list, &store, &data).unwrap();

        // one put_file per leaf, one put for the list itself
        assert_eq!(store.files.get(), 3);
        assert_eq!(store.buffers.get(), 1);
        assert!(check_against_store(&list, &store).is_empty());
    }

    #[test]
    fn fresh_build_audits_clean() {
        let root = tempfile::tempdir().unwrap();
        let data = write_data_dir(&root);
        let list: BuildList = build_from_directory(
            "fresh",
            &data,
            test_key().to_public_key(),
            HashType::Sha2,
            &["build"],
        )
        .unwrap();

        assert_eq!(list.tree().name(), "dataDir");
        assert_eq!(list.tree().leaves().len(), 3);
        assert!(check_against_directory(&list, &data).is_empty());
    }

    #[test]
    fn build_requires_a_directory() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("plain");
        fs::write(&file, b"x").unwrap();

        for path in [root.path().join("absent"), file] {
            let err = build_from_directory::<NlhTree, &str>(
                "t",
                &path,
                test_key().to_public_key(),
                HashType::Sha2,
                &[],
            )
            .unwrap_err();
            assert!(matches!(err, BuildListError::NotFound(_)));
        }
    }

    #[test]
    fn exclusions_leave_files_out() {
        let root = tempfile::tempdir().unwrap();
        let data = write_data_dir(&root);
        fs::create_dir_all(data.join("build")).unwrap();
        fs::write(data.join("build").join("out.o"), b"object").unwrap();

        let list: BuildList = build_from_directory(
            "t",
            &data,
            test_key().to_public_key(),
            HashType::Sha1,
            &["build"],
        )
        .unwrap();
        assert!(list.tree().leaves().iter().all(|l| !l.path.starts_with("build")));
    }

    #[test]
    fn audit_reports_changed_and_missing_files() {
        let root = tempfile::tempdir().unwrap();
        let data = write_data_dir(&root);
        let list: BuildList = build_from_directory(
            "t",
            &data,
            test_key().to_public_key(),
            HashType::Sha2,
            &[] as &[&str],
        )
        .unwrap();

        fs::write(data.join("a.txt"), b"tampered").unwrap();
        fs::remove_file(data.join("sub").join("b.txt")).unwrap();

        let mut paths: Vec<String> = check_against_directory(&list, &data)
            .into_iter()
            .map(|(_, p)| p)
            .collect();
        paths.sort();
        assert_eq!(paths, vec!["a.txt", "sub/b.txt"]);
    }

    #[test]
    fn publish_then_audit_store() {
        let root = tempfile::tempdir().unwrap();
        let data = write_data_dir(&root);
        let config = config_in(&root);
        let store = store_for(&config);
        let sync = Synchronizer::new(config);

        let mut list: BuildList = sync.build("t", &data, test_key().to_public_key()).unwrap();
        assert_eq!(check_against_store(&list, &store).len(), 3);

        list.sign(test_key()).unwrap();
        let digest = sync.publish(&list, &store, &data).unwrap();

        assert!(check_against_store(&list, &store).is_empty());
        let stored = store.fetch(&digest).unwrap();
        assert_eq!(stored, list.to_text().unwrap().into_bytes());
        assert_eq!(sync.last_listing().unwrap(), list);
    }

    #[test]
    fn publish_refuses_other_hash_type() {
        let root = tempfile::tempdir().unwrap();
        let data = write_data_dir(&root);
        let config = config_in(&root);
        let store =
            BlobStore::open(root.path().join("u1"), HashType::Sha1, StoreLayout::Flat).unwrap();
        let sync = Synchronizer::new(config);

        let list: BuildList = sync.build("t", &data, test_key().to_public_key()).unwrap();
        let err = sync.publish(&list, &store, &data).unwrap_err();
        assert!(matches!(err, BuildListError::HashTypeMismatch { .. }));
    }

    #[test]
    fn publish_mismatch_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let data = write_data_dir(&root);
        let config = config_in(&root);
        let store = LyingStore(store_for(&config));
        let sync = Synchronizer::new(config);

        let list: BuildList = sync.build("t", &data, test_key().to_public_key()).unwrap();
        let err = sync.publish(&list, &store, &data).unwrap_err();
        assert!(matches!(err, BuildListError::Integrity { .. }));
        assert!(!sync.config().listing_path().exists());
    }

    #[test]
    fn publish_missing_source_file() {
        let root = tempfile::tempdir().unwrap();
        let data = write_data_dir(&root);
        let config = config_in(&root);
        let store = store_for(&config);
        let sync = Synchronizer::new(config);

        let list: BuildList = sync.build("t", &data, test_key().to_public_key()).unwrap();
        fs::remove_file(data.join("a.txt")).unwrap();
        let err = sync.publish(&list, &store, &data).unwrap_err();
        assert!(matches!(err, BuildListError::NotFound(_)));
    }

    #[test]
    fn populate_restores_directory() {
        let root = tempfile::tempdir().unwrap();
        let data = write_data_dir(&root);
        let config = config_in(&root);
        let store = store_for(&config);
        let sync = Synchronizer::new(config);

        let list: BuildList = sync.build("t", &data, test_key().to_public_key()).unwrap();
        sync.publish(&list, &store, &data).unwrap();

        let dest = root.path().join("restore").join("dataDir");
        populate(&list, &store, &dest).unwrap();
        assert!(check_against_directory(&list, &dest).is_empty());
        assert_eq!(
            fs::read(dest.join("sub").join("deeper").join("c.bin")).unwrap(),
            [0u8, 1, 2, 3]
        );
    }

    #[test]
    fn populate_checks_target_name() {
        let root = tempfile::tempdir().unwrap();
        let data = write_data_dir(&root);
        let config = config_in(&root);
        let store = store_for(&config);
        let sync = Synchronizer::new(config);

        let list: BuildList = sync.build("t", &data, test_key().to_public_key()).unwrap();
        let dest = root.path().join("elsewhere");
        let err = populate(&list, &store, &dest).unwrap_err();
        match err {
            BuildListError::NameMismatch { tree, dir } => {
                assert_eq!(tree, "dataDir");
                assert_eq!(dir, "elsewhere");
            }
            other => panic!("expected name mismatch, got {other:?}"),
        }
        assert!(!dest.exists());
    }

    #[test]
    fn populate_stays_inside_target() {
        let root = tempfile::tempdir().unwrap();
        let config = config_in(&root);
        let store = store_for(&config);
        let hash = store.put(b"payload", &HashType::Sha2.digest(b"payload")).unwrap().1;

        let tree = NlhTree::new(
            "dataDir",
            HashType::Sha2,
            vec![NlhNode::Dir {
                name: "..".into(),
                children: vec![NlhNode::File {
                    name: "escaped.txt".into(),
                    hash,
                }],
            }],
        );
        let list = BuildList::new("t", test_key().to_public_key(), tree).unwrap();

        let dest = root.path().join("out").join("dataDir");
        let err = populate(&list, &store, &dest).unwrap_err();
        assert!(matches!(err, BuildListError::DotSegment(_)), "{err:?}");
        assert!(!root.path().join("out").join("escaped.txt").exists());
        assert!(!dest.exists());

        // the same tree never gets this far as text
        let text = list.tree().to_canonical_string();
        let lines: Vec<&str> = text.lines().collect();
        assert!(NlhTree::from_lines(&lines, HashType::Sha2).is_err());
    }

    #[test]
    fn populate_from_empty_store() {
        let root = tempfile::tempdir().unwrap();
        let data = write_data_dir(&root);
        let config = config_in(&root);
        let store = store_for(&config);
        let sync = Synchronizer::new(config);

        let list: BuildList = sync.build("t", &data, test_key().to_public_key()).unwrap();
        let dest = root.path().join("restore").join("dataDir");
        let err = populate(&list, &store, &dest).unwrap_err();
        assert!(matches!(err, BuildListError::NotFound(_)));
    }

    #[test]
    fn populate_detects_corrupt_blobs() {
        let root = tempfile::tempdir().unwrap();
        let data = write_data_dir(&root);
        let config = config_in(&root);
        let store = CorruptStore(store_for(&config));
        let sync = Synchronizer::new(config);

        let list: BuildList = sync.build("t", &data, test_key().to_public_key()).unwrap();
        sync.publish(&list, &store, &data).unwrap();

        let dest = root.path().join("restore").join("dataDir");
        let err = populate(&list, &store, &dest).unwrap_err();
        assert!(matches!(err, BuildListError::Integrity { .. }));
    }

    #[test]
    fn dot_segments_are_optional() {
        let root = tempfile::tempdir().unwrap();
        let data = write_data_dir(&root);
        let dotted = root.path().join(".").join("dataDir");
        assert!(dotted.is_dir());

        let lenient = Synchronizer::new(config_in(&root));
        let list: BuildList = lenient
            .build("t", &dotted, test_key().to_public_key())
            .unwrap();
        assert!(check_against_directory(&list, &data).is_empty());

        let strict = Synchronizer::new(SyncConfig {
            reject_dot_segments: true,
            ..config_in(&root)
        });
        let err = strict
            .build::<NlhTree>("t", &dotted, test_key().to_public_key())
            .unwrap_err();
        assert!(matches!(err, BuildListError::DotSegment(_)));
    }

    #[test]
    fn publish_appends_log_line() {
        let root = tempfile::tempdir().unwrap();
        let data = write_data_dir(&root);
        let config = SyncConfig {
            logging: true,
            ..config_in(&root)
        };
        let store = store_for(&config);
        let sync = Synchronizer::new(config);

        let mut list: BuildList = sync.build("t", &data, test_key().to_public_key()).unwrap();
        list.sign(test_key()).unwrap();
        let first = sync.publish(&list, &store, &data).unwrap();
        let second = sync.publish(&list, &store, &data).unwrap();
        assert_eq!(first, second);

        let log = fs::read_to_string(sync.config().log_path()).unwrap();
        let expected = format!("{} v0.0.0 {first}\n", list.timestamp_string());
        assert_eq!(log, expected.repeat(2));
    }

    #[test]
    fn list_gen_uses_version_and_key() {
        let root = tempfile::tempdir().unwrap();
        let data = write_data_dir(&root);
        let config = SyncConfig {
            key_path: Some(key_file(&root)),
            logging: true,
            ..config_in(&root)
        };
        fs::create_dir_all(&config.meta_dir).unwrap();
        fs::write(config.version_path(), "1.2.3\nignored\n").unwrap();
        let store = store_for(&config);
        let sync = Synchronizer::new(config);

        let list: BuildList = sync.list_gen("release", &data, Some(&store)).unwrap();
        assert_eq!(list.title(), "release v1.2.3");
        assert!(list.verify());
        assert!(check_against_store(&list, &store).is_empty());

        let log = fs::read_to_string(sync.config().log_path()).unwrap();
        assert!(log.contains(" v1.2.3 "));
    }

    #[test]
    fn list_gen_without_store_records_locally() {
        let root = tempfile::tempdir().unwrap();
        let data = write_data_dir(&root);
        let config = SyncConfig {
            key_path: Some(key_file(&root)),
            ..config_in(&root)
        };
        let sync = Synchronizer::new(config);

        let list: BuildList = sync
            .list_gen::<NlhTree, BlobStore>("local", &data, None)
            .unwrap();
        assert_eq!(list.title(), "local");
        assert_eq!(sync.last_listing().unwrap(), list);
        assert!(!root.path().join("u").exists());
    }

    #[test]
    fn list_gen_needs_a_key() {
        let root = tempfile::tempdir().unwrap();
        let data = write_data_dir(&root);
        let sync = Synchronizer::new(config_in(&root));
        let err = sync
            .list_gen::<NlhTree, BlobStore>("t", &data, None)
            .unwrap_err();
        assert!(matches!(err, BuildListError::NotFound(_)));
    }
}
