//! Shared types for buildlist: content hash algorithms, content trees, and
//! the glob exclusions used when building a tree from a directory.

pub mod exclude;
pub mod hash;
pub mod tree;

// Re-exports
pub use exclude::Exclusions;
pub use hash::{ContentHash, ContentHasher, HashError, HashType};
pub use tree::{ContentTree, Leaf, NlhNode, NlhTree, TreeError};
