//! Command-line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Keep working directories in sync with remote git revisions through a
/// local mirror cache.
#[derive(Parser, Debug)]
#[command(name = "mirrorsync")]
#[command(
    author,
    version,
    about,
    long_about = r#"mirrorsync keeps one bare mirror per remote under a cache root and
hard-resets working directories to requested revisions from it.

Examples:
    mirrorsync --cache-root /var/cache/mirrorsync deploy deploy.yaml
    mirrorsync sync https://github.com/org/site.git production /srv/site
    mirrorsync cache --manifest deploy.yaml
    mirrorsync branches https://github.com/org/site.git --refresh
"#
)]
pub struct Cli {
    /// Configuration file (TOML or YAML, chosen by extension).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Root directory of the mirror cache. Caching is off when unset.
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_root: Option<PathBuf>,

    /// More diagnostics (-v debug, -vv trace). RUST_LOG wins when set.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log filter for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bring every module of a manifest to its configured revision.
    Deploy(DeployArgs),

    /// Bring one directory to a revision of a remote.
    Sync(SyncArgs),

    /// Create or refresh mirrors.
    Cache(CacheArgs),

    /// List the branches of a remote.
    Branches(BranchesArgs),
}

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Manifest listing the modules to deploy.
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Sync from the mirrors as they are, without refreshing them first.
    #[arg(long)]
    pub no_cache_update: bool,

    /// Log the full cause and command output of failed modules.
    #[arg(long)]
    pub trace: bool,

    /// Print the deploy report as JSON on stdout.
    #[arg(long)]
    pub json: bool,

    /// Modules deployed concurrently.
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Remote repository location.
    pub remote: String,

    /// Branch, tag or commit to check out.
    #[arg(value_name = "REF")]
    pub reference: String,

    /// Working directory to synchronize.
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Sync from the mirror as it is, without refreshing it first.
    #[arg(long)]
    pub no_cache_update: bool,
}

#[derive(Args, Debug)]
pub struct CacheArgs {
    /// Remotes whose mirrors to refresh.
    #[arg(value_name = "REMOTE", required_unless_present = "manifest")]
    pub remotes: Vec<String>,

    /// Refresh the mirror of every remote named in a manifest.
    #[arg(long, value_name = "MANIFEST", conflicts_with = "remotes")]
    pub manifest: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BranchesArgs {
    /// Remote repository location.
    pub remote: String,

    /// Refresh the mirror before listing.
    #[arg(long)]
    pub refresh: bool,
}
