//! Generate a signing key
use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use buildlist_core::keys;

use super::Context;

pub fn keygen(ctx: &Context, key: Option<PathBuf>, bits: usize, force: bool) -> Result<()> {
    let path = ctx.key_path(key)?;
    if path.exists() && !force {
        bail!(
            "{} already exists; pass --force to replace it",
            path.display()
        );
    }

    let private = keys::generate_key(&path, bits)
        .with_context(|| format!("Failed to generate key at {}", path.display()))?;
    println!("{}", keys::public_key_pem(&private.to_public_key())?);
    eprintln!("  wrote {bits}-bit key to {}", path.display());
    Ok(())
}
