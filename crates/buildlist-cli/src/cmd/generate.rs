//! Build, sign, and optionally publish a list
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use buildlist_core::{BlobStore, BuildList, Synchronizer};
use buildlist_schema::{ContentTree, HashType};

use super::Context;

#[allow(clippy::too_many_arguments)]
pub fn generate(
    ctx: &Context,
    data_dir: &Path,
    title: &str,
    key: Option<PathBuf>,
    out: Option<&Path>,
    hash: Option<HashType>,
    exclude: Vec<String>,
    store: Option<PathBuf>,
) -> Result<()> {
    let mut config = ctx.config.clone();
    config.key_path = Some(ctx.key_path(key)?);
    config.hash_type = ctx.hash_type(hash);
    if !exclude.is_empty() {
        config.exclude = exclude;
    }

    let store = match store {
        Some(root) => Some(ctx.open_store(Some(root), config.hash_type)?),
        None => None,
    };

    let sync = Synchronizer::new(config);
    let list: BuildList = sync
        .list_gen::<_, BlobStore>(title, data_dir, store.as_ref())
        .with_context(|| format!("Failed to generate build list for {}", data_dir.display()))?;
    let text = list.to_text()?;

    match out {
        Some(path) => {
            fs::write(path, &text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "  wrote '{}' ({} files) to {}",
                list.title(),
                list.tree().leaves().len(),
                path.display()
            );
        }
        None => print!("{text}"),
    }
    Ok(())
}
