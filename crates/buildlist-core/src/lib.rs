//! Signed build lists.
//!
//! A [`BuildList`] binds a title, an RSA public key, and a content tree
//! under an RSA-PSS signature. This crate holds its canonical text
//! [`codec`], the [`signing`] protocol, and the [`sync`] operations that
//! publish, audit, and repopulate directories against a [`ContentStore`].

pub mod codec;
pub mod config;
pub mod error;
pub mod keys;
pub mod manifest;
pub mod paths;
pub mod signing;
pub mod store;
pub mod sync;
pub mod timestamp;

#[cfg(test)]
mod test_support;

pub use config::SyncConfig;
pub use error::{BuildListError, Result};
pub use manifest::BuildList;
pub use store::{BlobStore, ContentStore, StoreError, StoreLayout};
pub use sync::{
    Mismatch, Synchronizer, build_from_directory, check_against_directory, check_against_store,
    populate,
};
