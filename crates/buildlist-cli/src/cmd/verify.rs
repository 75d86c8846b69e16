//! Check a list's signature
use std::path::Path;

use anyhow::{Result, bail};
use buildlist_schema::HashType;

use super::Context;

pub fn verify(ctx: &Context, list: &Path, hash: Option<HashType>) -> Result<()> {
    let parsed = ctx.read_list(list, ctx.hash_type(hash))?;
    if !parsed.is_signed() {
        bail!("{} is not signed", list.display());
    }
    if !parsed.verify() {
        bail!("signature on {} does not verify", list.display());
    }
    println!(
        "  ok '{}' signed {}",
        parsed.title(),
        parsed.timestamp_string()
    );
    Ok(())
}
