//! buildlist - signed build lists from the command line
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! A build list records the content hash of every file below a directory,
//! signed with an RSA key. The CLI generates and verifies lists, audits
//! directories and stores against them, and publishes or restores content
//! through a local content-addressed store.
//!
//! # Layout
//!
//! ```text
//! ~/.buildlist/
//! └── keys/skPriv.pem     # default signing key
//!
//! ./.dvcz/
//! ├── lastBuildList       # last list generated or published here
//! ├── builds              # append-only build log (when logging = true)
//! └── version             # optional, appended to list titles
//! ```

pub mod cmd;

use buildlist_core::keys::DEFAULT_KEY_BITS;
use buildlist_schema::HashType;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "buildlist.toml";

#[derive(Debug, Parser)]
#[command(name = "buildlist")]
#[command(author, version, about = "buildlist - signed build lists")]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "BUILDLIST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate an RSA signing key
    Keygen {
        /// Where to write the key (default ~/.buildlist/keys/skPriv.pem)
        #[arg(short, long, env = "BUILDLIST_KEY")]
        key: Option<PathBuf>,
        /// Key size in bits
        #[arg(long, default_value_t = DEFAULT_KEY_BITS)]
        bits: usize,
        /// Replace an existing key
        #[arg(short, long)]
        force: bool,
    },
    /// Build and sign a list for a directory
    #[command(name = "gen")]
    Gen {
        /// Directory to describe
        data_dir: PathBuf,
        /// Title of the list
        #[arg(short, long)]
        title: String,
        /// Signing key
        #[arg(short, long, env = "BUILDLIST_KEY")]
        key: Option<PathBuf>,
        /// Write the list here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Content hash algorithm (sha1, sha2, sha3, blake2b)
        #[arg(long)]
        hash: Option<HashType>,
        /// Glob matched against file names to leave out (repeatable)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,
        /// Also publish to this store
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// Check a list's signature
    Verify {
        /// Build list file
        list: PathBuf,
        /// Content hash algorithm of the list
        #[arg(long)]
        hash: Option<HashType>,
    },
    /// Audit a directory and/or a store against a list
    Check {
        /// Build list file
        list: PathBuf,
        /// Directory to audit
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Store to audit
        #[arg(long)]
        store: Option<PathBuf>,
        /// Content hash algorithm of the list
        #[arg(long)]
        hash: Option<HashType>,
    },
    /// Copy a directory's content and its list into a store
    Publish {
        /// Build list file
        list: PathBuf,
        /// Directory the list describes
        data_dir: PathBuf,
        /// Store root (default: store_path from the config)
        #[arg(long)]
        store: Option<PathBuf>,
        /// Content hash algorithm of the list
        #[arg(long)]
        hash: Option<HashType>,
    },
    /// Restore a directory from a store
    Populate {
        /// Build list file
        list: PathBuf,
        /// Target directory, named like the list's root
        dest: PathBuf,
        /// Store root (default: store_path from the config)
        #[arg(long)]
        store: Option<PathBuf>,
        /// Content hash algorithm of the list
        #[arg(long)]
        hash: Option<HashType>,
    },
}
