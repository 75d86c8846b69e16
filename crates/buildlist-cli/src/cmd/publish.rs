//! Publish a directory into a store
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use buildlist_core::Synchronizer;
use buildlist_schema::HashType;

use super::Context;

pub fn publish(
    ctx: &Context,
    list: &Path,
    data_dir: &Path,
    store: Option<PathBuf>,
    hash: Option<HashType>,
) -> Result<()> {
    let hash_type = ctx.hash_type(hash);
    let parsed = ctx.read_list(list, hash_type)?;
    let store = ctx.open_store(store, hash_type)?;

    let digest = Synchronizer::new(ctx.config.clone())
        .publish(&parsed, &store, data_dir)
        .with_context(|| format!("Failed to publish {}", data_dir.display()))?;
    println!("{digest}");
    Ok(())
}
