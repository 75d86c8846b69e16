//! Content trees: a directory described as indented names and content hashes.
//!
//! The serialized form of [`NlhTree`] is part of what gets signed, so its
//! layout and ordering are fixed:
//!
//! ```text
//! dataDir
//!   a.txt 9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08
//!   sub
//!     b.txt 60303ae22b998861bce3b28f33eec1be758a213c86c93c076dbe9f558c11c752
//! ```

use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::exclude::Exclusions;
use crate::hash::{ContentHash, HashError, HashType};

/// Indentation added per tree level.
pub const INDENT: &str = "  ";

/// Errors building or parsing a content tree.
#[derive(thiserror::Error, Debug)]
pub enum TreeError {
    /// Reading the filesystem failed.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Walking the directory failed.
    #[error("walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    /// The root of a build is not a directory.
    #[error("{0} does not exist or is not a directory")]
    NotADirectory(PathBuf),

    /// A file or directory name cannot be represented in the serialized form.
    #[error("unrepresentable name: {0:?}")]
    BadName(String),

    /// A serialized tree had no lines.
    #[error("empty tree")]
    Empty,

    /// A serialized line could not be understood.
    #[error("line {line_no}: {reason}: '{line}'")]
    BadLine {
        /// One-based line number within the tree body.
        line_no: usize,
        /// The offending line.
        line: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// An exclusion pattern failed to compile.
    #[error("invalid exclusion pattern '{pattern}': {source}")]
    BadPattern {
        /// The pattern as given.
        pattern: String,
        /// Compilation error.
        #[source]
        source: glob::PatternError,
    },

    /// A content hash did not match the tree's algorithm.
    #[error(transparent)]
    Hash(#[from] HashError),
}

impl TreeError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn bad_line(line_no: usize, line: &str, reason: &'static str) -> Self {
        Self::BadLine {
            line_no,
            line: line.to_string(),
            reason,
        }
    }
}

/// A single file within a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    /// Content hash of the file.
    pub hash: ContentHash,
    /// Path relative to the tree's root directory, `/`-separated.
    pub path: String,
}

/// Hierarchical, hash-addressed description of a directory.
///
/// Implementations must serialize deterministically: the canonical text is
/// hashed and signed by build lists.
pub trait ContentTree: Sized + PartialEq + fmt::Debug {
    /// Hash every file below `path`, skipping names matched by `exclusions`.
    ///
    /// # Errors
    ///
    /// Fails if `path` is not a directory, a file cannot be read, or a name
    /// cannot be serialized.
    fn from_dir(path: &Path, hash_type: HashType, exclusions: &Exclusions)
    -> Result<Self, TreeError>;

    /// Rebuild a tree from its canonical lines (without line terminators).
    ///
    /// # Errors
    ///
    /// Fails on malformed lines or hashes that do not fit `hash_type`.
    fn from_lines(lines: &[&str], hash_type: HashType) -> Result<Self, TreeError>;

    /// Name of the root directory.
    fn name(&self) -> &str;

    /// Algorithm addressing the leaves.
    fn hash_type(&self) -> HashType;

    /// Canonical serialization, every line terminated by `\n`.
    fn to_canonical_string(&self) -> String;

    /// Every file, in serialization order.
    fn leaves(&self) -> Vec<Leaf>;
}

/// A node below the root of an [`NlhTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NlhNode {
    /// A directory and its sorted children.
    Dir {
        /// Directory name.
        name: String,
        /// Children in file-name order.
        children: Vec<NlhNode>,
    },
    /// A regular file.
    File {
        /// File name.
        name: String,
        /// Content hash.
        hash: ContentHash,
    },
}

impl NlhNode {
    /// The node's own name.
    pub fn name(&self) -> &str {
        match self {
            NlhNode::Dir { name, .. } | NlhNode::File { name, .. } => name,
        }
    }
}

/// Named, indented tree of directories and file content hashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NlhTree {
    name: String,
    hash_type: HashType,
    nodes: Vec<NlhNode>,
}

type OpenDir = (String, Vec<NlhNode>);

impl NlhTree {
    /// Assemble a tree from already-ordered nodes.
    pub fn new(name: impl Into<String>, hash_type: HashType, nodes: Vec<NlhNode>) -> Self {
        Self {
            name: name.into(),
            hash_type,
            nodes,
        }
    }

    /// Top-level nodes.
    pub fn nodes(&self) -> &[NlhNode] {
        &self.nodes
    }

    fn write_nodes(out: &mut String, nodes: &[NlhNode], depth: usize) {
        let indent = INDENT.repeat(depth);
        for node in nodes {
            match node {
                NlhNode::Dir { name, children } => {
                    out.push_str(&format!("{indent}{name}\n"));
                    Self::write_nodes(out, children, depth + 1);
                }
                NlhNode::File { name, hash } => {
                    out.push_str(&format!("{indent}{name} {hash}\n"));
                }
            }
        }
    }

    fn collect_leaves(nodes: &[NlhNode], prefix: &str, out: &mut Vec<Leaf>) {
        for node in nodes {
            let path = if prefix.is_empty() {
                node.name().to_string()
            } else {
                format!("{prefix}/{}", node.name())
            };
            match node {
                NlhNode::Dir { children, .. } => Self::collect_leaves(children, &path, out),
                NlhNode::File { hash, .. } => out.push(Leaf {
                    hash: hash.clone(),
                    path,
                }),
            }
        }
    }
}

/// Pop the innermost open directory into its parent.
fn close_dir(stack: &mut Vec<OpenDir>) {
    if stack.len() < 2 {
        return;
    }
    if let Some((name, children)) = stack.pop() {
        if let Some((_, parent)) = stack.last_mut() {
            parent.push(NlhNode::Dir { name, children });
        }
    }
}

/// Whether `name` is a single path segment the serialized form can carry.
fn is_plain_name(name: &str) -> bool {
    !matches!(name, "" | "." | "..")
        && !name.starts_with(' ')
        && !name.contains(['/', '\\', '\n', '\r'])
}

fn looks_like_hash(token: &str) -> bool {
    token.len() >= HashType::Sha1.hex_len() && token.chars().all(|c| c.is_ascii_hexdigit())
}

fn checked_name(name: &OsStr) -> Result<String, TreeError> {
    match name.to_str() {
        Some(name) if is_plain_name(name) => Ok(name.to_string()),
        _ => Err(TreeError::BadName(name.to_string_lossy().into_owned())),
    }
}

/// Directory lines carry no hash, so a name ending in a hash-like token
/// would read back as a file.
fn checked_dir_name(name: &OsStr) -> Result<String, TreeError> {
    let name = checked_name(name)?;
    match name.rsplit_once(' ') {
        Some((_, token)) if looks_like_hash(token) => Err(TreeError::BadName(name)),
        _ => Ok(name),
    }
}

fn parsed_name(name: &str) -> Result<String, TreeError> {
    if is_plain_name(name) {
        Ok(name.to_string())
    } else {
        Err(TreeError::BadName(name.to_string()))
    }
}

fn root_name(path: &Path) -> Result<String, TreeError> {
    match path.file_name() {
        Some(name) => checked_name(name),
        None => {
            // "." and ".." have no file name of their own
            let canonical = fs::canonicalize(path).map_err(|e| TreeError::io(path, e))?;
            let name = canonical
                .file_name()
                .ok_or_else(|| TreeError::BadName(canonical.display().to_string()))?;
            checked_name(name)
        }
    }
}

/// Split a body line into `(name, hash)` if it looks like a file entry.
///
/// A trailing all-hex token of at least SHA-1 length is taken as a hash and
/// must fit `hash_type`; a tree parsed with the wrong algorithm fails here
/// rather than turning files into oddly named directories.
fn split_file_line(
    body: &str,
    hash_type: HashType,
) -> Option<Result<(&str, ContentHash), HashError>> {
    let (name, token) = body.rsplit_once(' ')?;
    if !looks_like_hash(token) || name.is_empty() {
        return None;
    }
    Some(ContentHash::validated(token, hash_type).map(|hash| (name, hash)))
}

impl ContentTree for NlhTree {
    fn from_dir(
        path: &Path,
        hash_type: HashType,
        exclusions: &Exclusions,
    ) -> Result<Self, TreeError> {
        let meta = fs::metadata(path).map_err(|_| TreeError::NotADirectory(path.to_path_buf()))?;
        if !meta.is_dir() {
            return Err(TreeError::NotADirectory(path.to_path_buf()));
        }

        let mut stack: Vec<OpenDir> = vec![(root_name(path)?, Vec::new())];

        let walker = WalkDir::new(path)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !exclusions.is_excluded(&e.file_name().to_string_lossy()));

        for entry in walker {
            let entry = entry?;
            while stack.len() > entry.depth() {
                close_dir(&mut stack);
            }

            let file_type = entry.file_type();
            if file_type.is_dir() {
                stack.push((checked_dir_name(entry.file_name())?, Vec::new()));
            } else if file_type.is_file() {
                let name = checked_name(entry.file_name())?;
                let hash = hash_type
                    .digest_file(entry.path())
                    .map_err(|e| TreeError::io(entry.path(), e))?;
                if let Some((_, children)) = stack.last_mut() {
                    children.push(NlhNode::File { name, hash });
                }
            } else {
                debug!("skipping non-regular file {}", entry.path().display());
            }
        }

        while stack.len() > 1 {
            close_dir(&mut stack);
        }
        let (name, nodes) = stack.pop().ok_or(TreeError::Empty)?;
        debug!("built {hash_type} tree '{name}' from {}", path.display());

        Ok(Self {
            name,
            hash_type,
            nodes,
        })
    }

    fn from_lines(lines: &[&str], hash_type: HashType) -> Result<Self, TreeError> {
        let (first, rest) = lines.split_first().ok_or(TreeError::Empty)?;
        if first.is_empty() || first.starts_with(' ') {
            return Err(TreeError::bad_line(1, first, "expected root directory name"));
        }

        let mut stack: Vec<OpenDir> = vec![(parsed_name(first)?, Vec::new())];
        // A file line cannot be followed by one of its own "children".
        let mut max_depth = 1;

        for (idx, line) in rest.iter().enumerate() {
            let line_no = idx + 2;
            let body = line.trim_start_matches(' ');
            let indent = line.len() - body.len();

            if body.is_empty() {
                return Err(TreeError::bad_line(line_no, line, "empty line"));
            }
            if indent == 0 || indent % INDENT.len() != 0 {
                return Err(TreeError::bad_line(line_no, line, "bad indentation"));
            }
            let depth = indent / INDENT.len();
            if depth > max_depth {
                return Err(TreeError::bad_line(line_no, line, "indented too deeply"));
            }

            while stack.len() > depth {
                close_dir(&mut stack);
            }

            match split_file_line(body, hash_type) {
                Some(Ok((name, hash))) => {
                    if let Some((_, children)) = stack.last_mut() {
                        children.push(NlhNode::File {
                            name: parsed_name(name)?,
                            hash,
                        });
                    }
                    max_depth = depth;
                }
                Some(Err(e)) => return Err(e.into()),
                None => {
                    stack.push((parsed_name(body)?, Vec::new()));
                    max_depth = depth + 1;
                }
            }
        }

        while stack.len() > 1 {
            close_dir(&mut stack);
        }
        let (name, nodes) = stack.pop().ok_or(TreeError::Empty)?;

        Ok(Self {
            name,
            hash_type,
            nodes,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn hash_type(&self) -> HashType {
        self.hash_type
    }

    fn to_canonical_string(&self) -> String {
        let mut out = format!("{}\n", self.name);
        Self::write_nodes(&mut out, &self.nodes, 1);
        out
    }

    fn leaves(&self) -> Vec<Leaf> {
        let mut out = Vec::new();
        Self::collect_leaves(&self.nodes, "", &mut out);
        out
    }
}

impl fmt::Display for NlhTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}
