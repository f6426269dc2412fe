//! CLI argument parsing using clap
//!
//! Value flags are `Option`s so a TOML file can fill whatever the command
//! line leaves out; defaults are applied last, in `cli_convert`.

use clap::Parser;
use std::path::PathBuf;

/// objpulse - object storage throughput and request-rate benchmark
#[derive(Parser, Debug, Default)]
#[command(name = "objpulse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    // === Mode ===
    /// Upload synthetic objects
    #[arg(long)]
    pub upload: bool,

    /// Download objects into a discarding sink
    #[arg(long)]
    pub download: bool,

    /// Probe object metadata for a fixed time
    #[arg(long)]
    pub query: bool,

    // === Workload Options ===
    /// Number of objects to read/write
    #[arg(short = 'n', long)]
    pub files: Option<usize>,

    /// Upload/download parts in flight per object (query: number of workers)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Seconds to run the query benchmark
    #[arg(long)]
    pub sec: Option<u64>,

    /// Part size per upload/download thread (e.g., 5M, 64M)
    #[arg(long)]
    pub chunksize: Option<String>,

    /// Upload object size (e.g., 10M, 1G)
    #[arg(long)]
    pub objectsize: Option<String>,

    /// Object name prefix
    #[arg(long)]
    pub prefix: Option<String>,

    /// Use random data (default is all 0s)
    #[arg(long)]
    pub rand: bool,

    /// Delete objects after uploading
    #[arg(long)]
    pub delete: bool,

    // === Backend Options ===
    /// Bucket to benchmark
    #[arg(long)]
    pub bucket: Option<String>,

    /// Access key
    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access: Option<String>,

    /// Secret key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret: Option<String>,

    /// Bucket region
    #[arg(long)]
    pub region: Option<String>,

    /// S3 server endpoint, default AWS ("memory" for an in-process store)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Use path-style bucket addressing
    #[arg(long)]
    pub pathstyle: bool,

    // === Output Options ===
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    // === Configuration File ===
    /// TOML configuration file
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
