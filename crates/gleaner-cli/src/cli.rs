//! CLI argument definitions for gleaner.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fetch` | Run a retrieval batch over a source list |
//! | `cache` | Inspect or clear the local cache |
//! | `proxies` | Show proxy pool status |
//!
//! # Examples
//!
//! ```bash
//! # Fetch every configured source
//! gleaner fetch sources.txt
//!
//! # Same, through a proxy list and with pretty output
//! gleaner fetch sources.txt --proxy-file proxies.txt --pretty
//!
//! # Cache maintenance
//! gleaner cache stats
//! gleaner cache clear
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Resilient multi-source page retrieval.
///
/// Fetches raw page bodies from configured sources with caching, proxy
/// rotation, per-source circuit breaking, and retry with backoff. Outcomes
/// and metrics are reported as JSON on stdout.
#[derive(Debug, Parser)]
#[command(name = "gleaner", version, about = "Resilient multi-source page retrieval")]
pub struct Cli {
    /// Cache directory (default: ./cache, or GLEANER_CACHE_DIR).
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Proxy list file (default: ./proxies.txt, or GLEANER_PROXY_FILE).
    #[arg(long, global = true)]
    pub proxy_file: Option<PathBuf>,

    /// Pretty-print JSON output.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch all sources in the list and report per-source outcomes.
    Fetch {
        /// Source list: one `name url` pair per line, `#` comments and
        /// blank lines ignored; repeated names group their URLs.
        sources: PathBuf,
    },
    /// Cache maintenance.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Show proxy pool status.
    Proxies,
}

#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Entry counts: total, valid, expired.
    Stats,
    /// Remove every cached record.
    Clear,
}
