use anyhow::Result;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::client::{GraphqlClient, QueryExecutor, QueryOutcome};
use crate::config::RunConfig;
use crate::detail::{self, LogEntry};
use crate::output::{write_json, OutputFiles};
use crate::queries::{self, QuerySpec};
use crate::stats::{DailyTotals, QueryStatus, RunSummary};
use crate::utils::format_number;

const SAMPLE_LINES: usize = 5;

/// Run every query against the live endpoint.
pub fn run(config: &RunConfig) -> Result<RunSummary> {
    let client = GraphqlClient::new(config.endpoint.clone(), config.credentials.clone())?;
    Ok(run_with(config, &client))
}

/// Execute the daily, hourly and detail queries, then derive and persist
/// every output. Query and write failures are logged and skipped.
pub fn run_with(config: &RunConfig, executor: &dyn QueryExecutor) -> RunSummary {
    let total_start_time = Instant::now();
    info!(action = "start", component = "run", window = %config.window, "Starting statistics run");

    let zone_id = &config.credentials.zone_id;
    let window = &config.window;
    let files = OutputFiles::new(&config.output_dir, window);
    let mut files_written = Vec::new();

    let daily_query = queries::daily_summary(zone_id, window);
    let hourly_query = queries::hourly_summary(zone_id, window);
    let detail_query = queries::detail_log(zone_id, window);

    let daily = execute(executor, &daily_query);
    let hourly = execute(executor, &hourly_query);
    let detail_log = execute(executor, &detail_query);

    let entries = detail_log
        .data()
        .map(detail::extract_log_entries)
        .unwrap_or_default();

    let mut top_paths = Vec::new();
    if let Some(response) = detail_log.data() {
        info!(action = "extract", component = "detail_log", entry_count = entries.len(), "Flattened detail log");
        save(files.detailed_logs(), &entries, &mut files_written);

        top_paths = detail::aggregate_hot_paths(&entries, &config.hot_paths);
        if !top_paths.is_empty() {
            save(files.top_hits(), &top_paths, &mut files_written);
        }

        let hot = detail::hot_entries(&entries, &config.hot_paths);
        match detail::with_adaptive_groups(response, &hot) {
            Some(pages) => save(files.pages(), &pages, &mut files_written),
            None => warn!(action = "extract", component = "detail_log", "Response has no adaptive groups, skipping page stats"),
        }
    }

    if let Some(response) = daily.data() {
        save(files.daily(), response, &mut files_written);
    }
    if let Some(response) = hourly.data() {
        save(files.hourly(), response, &mut files_written);
    }

    let page_hits = detail::filter_by_path(&entries, &config.target_path);
    info!(action = "filter", component = "path_filter", target = %config.target_path, match_count = page_hits.len(), "Filtered detail log by path");
    if !page_hits.is_empty() {
        save(files.page_detail(&config.target_path), &page_hits, &mut files_written);
    }

    let client_hits = detail::filter_by_client(&entries, &config.target_ip);
    info!(action = "filter", component = "client_filter", target = %config.target_ip, match_count = client_hits.len(), "Filtered detail log by client");
    if !client_hits.is_empty() {
        save(files.ip_activity(&config.target_ip), &client_hits, &mut files_written);
    }

    let daily_totals = daily.data().and_then(DailyTotals::from_response);
    let queries = vec![
        QueryStatus { name: daily_query.name, outcome: daily },
        QueryStatus { name: hourly_query.name, outcome: hourly },
        QueryStatus { name: detail_query.name, outcome: detail_log },
    ];

    let summary = RunSummary {
        window: *window,
        queries,
        daily_totals,
        detail_entries: entries.len(),
        top_paths,
        page_hits,
        client_hits,
        files_written,
    };

    info!(
        action = "complete",
        component = "run",
        failed_queries = summary.failed_queries(),
        files_written = summary.files_written.len(),
        duration_ms = total_start_time.elapsed().as_millis(),
        "Statistics run finished"
    );
    summary
}

fn execute(executor: &dyn QueryExecutor, query: &QuerySpec) -> QueryOutcome {
    let outcome = QueryOutcome::from_response(executor.execute(query));
    match &outcome {
        QueryOutcome::Data(_) => {
            info!(action = "query", component = "runner", query = query.name, "Query succeeded");
            if let Some(errors) = outcome.partial_errors() {
                warn!(
                    action = "query",
                    component = "runner",
                    query = query.name,
                    errors = %errors,
                    "API reported errors alongside data"
                );
            }
        }
        QueryOutcome::ApiErrors(errors) => {
            error!(action = "query", component = "runner", query = query.name, errors = %errors, "API reported errors")
        }
        QueryOutcome::Failed => {
            error!(action = "query", component = "runner", query = query.name, "Query returned no data")
        }
    }
    outcome
}

fn save<T: Serialize + ?Sized>(path: PathBuf, value: &T, written: &mut Vec<PathBuf>) {
    match write_json(&path, value) {
        Ok(()) => written.push(path),
        Err(e) => {
            error!(action = "write", component = "output", file_path = ?path, error = %format!("{e:#}"), "Failed to save output")
        }
    }
}

fn sample_lines(out: &mut String, entries: &[LogEntry], describe: impl Fn(&LogEntry) -> String) {
    for entry in entries.iter().take(SAMPLE_LINES) {
        let _ = writeln!(out, "  {} | {}", entry.datetime, describe(entry));
    }
    if entries.len() > SAMPLE_LINES {
        let _ = writeln!(out, "  ... {} more", entries.len() - SAMPLE_LINES);
    }
}

/// Human-readable report of a finished run.
pub fn format_summary(summary: &RunSummary, config: &RunConfig) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "\n--- Cloudflare Stats: {} ---", summary.window);

    let _ = writeln!(out, "\nQueries:");
    for status in &summary.queries {
        let _ = writeln!(out, "- {}: {}", status.name, status.outcome.label());
    }

    match &summary.daily_totals {
        Some(totals) => {
            let _ = writeln!(out, "\nTotal page views: {}", format_number(totals.page_views));
            let _ = writeln!(out, "Total requests: {}", format_number(totals.requests));
        }
        None => {
            let _ = writeln!(out, "\nNo daily totals available");
        }
    }

    let _ = writeln!(
        out,
        "Detail log entries: {}",
        format_number(summary.detail_entries as u64)
    );

    if !summary.top_paths.is_empty() {
        let _ = writeln!(
            out,
            "\nTop {} hot paths:",
            std::cmp::min(config.top, summary.top_paths.len())
        );
        for hits in summary.top_paths.iter().take(config.top) {
            let _ = writeln!(out, "- {}: {} views", hits.path, format_number(hits.views.into()));
        }
    }

    let _ = writeln!(
        out,
        "\nRequests to {}: {}",
        config.target_path,
        summary.page_hits.len()
    );
    sample_lines(&mut out, &summary.page_hits, |entry| format!("IP: {}", entry.client_ip));

    let _ = writeln!(
        out,
        "\nRequests from {}: {}",
        config.target_ip,
        summary.client_hits.len()
    );
    sample_lines(&mut out, &summary.client_hits, |entry| format!("path: {}", entry.path));

    if summary.files_written.is_empty() {
        let _ = writeln!(out, "\nNo files written");
    } else {
        let _ = writeln!(out, "\nFiles written:");
        for path in &summary.files_written {
            let _ = writeln!(out, "- {}", path.display());
        }
    }

    out
}

pub fn print_summary(summary: &RunSummary, config: &RunConfig) {
    print!("{}", format_summary(summary, config));
}
