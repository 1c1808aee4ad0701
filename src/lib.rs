pub mod args;
pub mod client;
pub mod config;
pub mod detail;
pub mod output;
pub mod queries;
pub mod runner;
pub mod settings;
pub mod stats;
pub mod utils;
pub mod window;

pub use args::Args;
pub use client::{GraphqlClient, QueryExecutor, QueryOutcome};
pub use config::{Credentials, RunConfig};
pub use runner::{print_summary, run, run_with};
pub use stats::{DailyTotals, RunSummary};
