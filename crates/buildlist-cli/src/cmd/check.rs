//! Audit directories and stores
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use buildlist_core::sync::Mismatch;
use buildlist_core::{check_against_directory, check_against_store};
use buildlist_schema::HashType;

use super::Context;

fn report(kind: &str, mismatches: &[Mismatch]) {
    for (hash, path) in mismatches {
        println!("  {kind} {path} {hash}");
    }
}

pub fn check(
    ctx: &Context,
    list: &Path,
    dir: Option<&Path>,
    store: Option<PathBuf>,
    hash: Option<HashType>,
) -> Result<()> {
    let hash_type = ctx.hash_type(hash);
    let parsed = ctx.read_list(list, hash_type)?;

    let mut failed = 0;
    if let Some(dir) = dir {
        let mismatches = check_against_directory(&parsed, dir);
        report("differs", &mismatches);
        failed += mismatches.len();
    }
    if store.is_some() || (dir.is_none() && ctx.config.store_path.is_some()) {
        let store = ctx.open_store(store, hash_type)?;
        let missing = check_against_store(&parsed, &store);
        report("missing", &missing);
        failed += missing.len();
    } else if dir.is_none() {
        bail!("Nothing to check: pass --dir and/or --store");
    }

    if failed > 0 {
        bail!("{failed} entries do not match {}", list.display());
    }
    println!("  ok");
    Ok(())
}
