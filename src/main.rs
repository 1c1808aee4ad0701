use cfstats::utils::{setup_logging, validate_args};
use cfstats::{print_summary, run, Args, RunConfig};
use clap::Parser;
use std::collections::HashMap;
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let env: HashMap<String, String> = std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect();

    let config = match RunConfig::from_args(&args, &env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    println!("Window: {}", config.window);

    match run(&config) {
        Ok(summary) => {
            print_summary(&summary, &config);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(action = "run", component = "main", error = %format!("{e:#}"), "Run aborted");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
