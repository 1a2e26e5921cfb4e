use chrono::{DateTime, TimeZone, Utc};
use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;
use taghistory::{Backend, RootHash, UpdateChannel};

/// Returns the version string, including git hash and commit date for non-release builds.
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            format!("v{}", VERSION)
        } else {
            format!("v{}\ndev: {} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "taghist",
    bin_name = "taghist",
    version = get_version(),
    disable_help_subcommand = true
)]
#[command(about = "Inspect and maintain a repository's tag history", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// History store to operate on (overrides configuration)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub database: Option<PathBuf>,

    /// Storage backend: sqlite or json (overrides configuration)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub backend: Option<Backend>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count, help_heading = "Options")]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an empty history store for a repository
    Create {
        /// Fully-qualified repository name, e.g. atlas.example.org
        fqrn: String,
    },

    /// Show repository name, tag count and the previous-revision link
    Info,

    /// List all tags, newest first
    #[command(alias = "ls")]
    List {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Add a tag
    Add(AddArgs),

    /// Remove tags by name
    #[command(alias = "rm")]
    Remove {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Discard every tag newer than a revision or a named tag
    Rollback(RollbackArgs),

    /// Look up a single tag
    Find(FindArgs),

    /// Show the head of every channel, newest release first
    Channels,

    /// Print every root hash still referenced by a tag, newest first
    Referenced,

    /// Record the hash of the previous history snapshot
    SetPrevious {
        hash: RootHash,
    },
}

#[derive(Args, Debug)]
pub struct AddArgs {
    pub name: String,

    /// Root hash of the published tree
    pub hash: RootHash,

    /// Revision number (defaults to one past the newest tag)
    #[arg(short, long)]
    pub revision: Option<u32>,

    /// Update channel: trunk, devel, test or prod
    #[arg(short, long, default_value = "trunk")]
    pub channel: UpdateChannel,

    /// Size in bytes of the snapshot metadata
    #[arg(short, long, default_value_t = 0)]
    pub size: u64,

    #[arg(short = 'm', long, default_value = "")]
    pub description: String,

    /// Creation time (RFC 3339 or seconds since the epoch; defaults to now)
    #[arg(short, long, value_parser = parse_time)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["revision", "tag"])))]
pub struct RollbackArgs {
    /// Keep tags up to and including this revision
    pub revision: Option<u32>,

    /// Keep tags up to and including this tag's revision
    #[arg(long)]
    pub tag: Option<String>,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("query").required(true).args(["name", "date", "revision", "hash"])))]
pub struct FindArgs {
    #[arg(long)]
    pub name: Option<String>,

    /// Tag current at this time (RFC 3339 or seconds since the epoch)
    #[arg(long, value_parser = parse_time)]
    pub date: Option<DateTime<Utc>>,

    #[arg(long)]
    pub revision: Option<u32>,

    #[arg(long)]
    pub hash: Option<RootHash>,
}

pub fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(secs) = s.parse::<i64>() {
        return Utc
            .timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| format!("timestamp out of range: {}", secs));
    }
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected RFC 3339 or epoch seconds: {}", e))
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
