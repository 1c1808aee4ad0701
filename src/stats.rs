use serde_json::Value;
use std::path::PathBuf;

use crate::client::QueryOutcome;
use crate::detail::{LogEntry, PathHits};
use crate::window::QueryWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTotals {
    pub page_views: u64,
    pub requests: u64,
}

impl DailyTotals {
    /// Read the first daily group's sums. Absent fields count as zero; an
    /// absent group means there is nothing to report.
    pub fn from_response(response: &Value) -> Option<Self> {
        let sum = response.pointer("/data/viewer/zones/0/httpRequests1dGroups/0/sum")?;
        let count = |key: &str| sum.get(key).and_then(Value::as_u64).unwrap_or(0);

        Some(Self {
            page_views: count("pageViews"),
            requests: count("requests"),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryStatus {
    pub name: &'static str,
    pub outcome: QueryOutcome,
}

#[derive(Debug)]
pub struct RunSummary {
    pub window: QueryWindow,
    pub queries: Vec<QueryStatus>,
    pub daily_totals: Option<DailyTotals>,
    pub detail_entries: usize,
    pub top_paths: Vec<PathHits>,
    pub page_hits: Vec<LogEntry>,
    pub client_hits: Vec<LogEntry>,
    pub files_written: Vec<PathBuf>,
}

impl RunSummary {
    pub fn failed_queries(&self) -> usize {
        self.queries
            .iter()
            .filter(|status| !status.outcome.is_success())
            .count()
    }
}
