//! buildlist CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use buildlist_cli::cmd::{self, Context};
use buildlist_cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Context::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Keygen { key, bits, force } => cmd::keygen::keygen(&ctx, key, bits, force),
        Commands::Gen {
            data_dir,
            title,
            key,
            out,
            hash,
            exclude,
            store,
        } => cmd::generate::generate(
            &ctx,
            &data_dir,
            &title,
            key,
            out.as_deref(),
            hash,
            exclude,
            store,
        ),
        Commands::Verify { list, hash } => cmd::verify::verify(&ctx, &list, hash),
        Commands::Check {
            list,
            dir,
            store,
            hash,
        } => cmd::check::check(&ctx, &list, dir.as_deref(), store, hash),
        Commands::Publish {
            list,
            data_dir,
            store,
            hash,
        } => cmd::publish::publish(&ctx, &list, &data_dir, store, hash),
        Commands::Populate {
            list,
            dest,
            store,
            hash,
        } => cmd::populate::populate(&ctx, &list, &dest, store, hash),
    }
}
