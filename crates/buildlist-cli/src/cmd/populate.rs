//! Restore a directory from a store
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use buildlist_schema::{ContentTree, HashType};

use super::Context;

pub fn populate(
    ctx: &Context,
    list: &Path,
    dest: &Path,
    store: Option<PathBuf>,
    hash: Option<HashType>,
) -> Result<()> {
    let hash_type = ctx.hash_type(hash);
    let parsed = ctx.read_list(list, hash_type)?;
    let store = ctx.open_store(store, hash_type)?;

    buildlist_core::populate(&parsed, &store, dest)
        .with_context(|| format!("Failed to populate {}", dest.display()))?;
    eprintln!(
        "  restored {} files into {}",
        parsed.tree().leaves().len(),
        dest.display()
    );
    Ok(())
}
