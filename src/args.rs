use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://api.cloudflare.com/client/v4/graphql";
pub const DEFAULT_TARGET_PATH: &str = "/free/detail/supabase.html";
pub const DEFAULT_TARGET_IP: &str = "115.194.149.254";

#[derive(Parser, Debug)]
#[command(
    name = "cfstats",
    about = "Query Cloudflare GraphQL analytics for a zone and save daily JSON snapshots",
    version,
    long_about = None
)]
pub struct Args {
    /// Cloudflare account email (overrides CLOUDFLARE_AUTH_EMAIL)
    #[arg(long)]
    pub email: Option<String>,

    /// Cloudflare API key (overrides CLOUDFLARE_API_KEY)
    #[arg(long)]
    pub key: Option<String>,

    /// Cloudflare zone ID (overrides CLOUDFLARE_ZONE_ID)
    #[arg(long)]
    pub zone: Option<String>,

    /// First day of the window, YYYY-MM-DD (defaults to yesterday)
    #[arg(long, alias = "yesterday")]
    pub start: Option<NaiveDate>,

    /// Day after the window, YYYY-MM-DD (defaults to today)
    #[arg(long, alias = "today")]
    pub end: Option<NaiveDate>,

    /// Settings file with KEY=VALUE lines
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,

    /// Directory the JSON snapshots are written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// GraphQL endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: Url,

    /// Request path to inspect in detail
    #[arg(long, default_value = DEFAULT_TARGET_PATH)]
    pub target_path: String,

    /// Client address to inspect in detail
    #[arg(long, default_value = DEFAULT_TARGET_IP)]
    pub target_ip: String,

    /// Substring marking a hot path
    #[arg(long, default_value = "/case/")]
    pub hot_marker: String,

    /// Suffix marking a hot path
    #[arg(long, default_value = ".html")]
    pub hot_suffix: String,

    /// Number of hot paths to display
    #[arg(short, long, default_value_t = 10)]
    pub top: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
