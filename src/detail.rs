use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

const ADAPTIVE_GROUPS_POINTER: &str = "/data/viewer/zones/0/httpRequestsAdaptiveGroups";

/// One request from the detail log. `page_views` is always 1 since the
/// adaptive groups carry no count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub datetime: String,
    pub path: String,
    #[serde(rename = "clientIP")]
    pub client_ip: String,
    pub user_agent: String,
    pub page_views: u32,
}

impl LogEntry {
    fn from_group(group: &Value) -> Option<Self> {
        let dimensions = group.get("dimensions")?;
        let text = |key: &str| dimensions.get(key).and_then(Value::as_str);

        Some(Self {
            datetime: text("datetime")?.to_string(),
            path: text("clientRequestPath")?.to_string(),
            client_ip: text("clientIP").unwrap_or_default().to_string(),
            user_agent: text("userAgent").unwrap_or_default().to_string(),
            page_views: 1,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathHits {
    pub path: String,
    pub views: u32,
}

/// Paths containing `marker` or ending with `suffix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotPathRule {
    pub marker: String,
    pub suffix: String,
}

impl HotPathRule {
    pub fn new(marker: &str, suffix: &str) -> Self {
        Self {
            marker: marker.to_string(),
            suffix: suffix.to_string(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        (!self.marker.is_empty() && path.contains(&self.marker))
            || (!self.suffix.is_empty() && path.ends_with(&self.suffix))
    }
}

impl Default for HotPathRule {
    fn default() -> Self {
        Self::new("/case/", ".html")
    }
}

/// The raw adaptive groups of a detail-log response, if the shape is there.
pub fn adaptive_groups(response: &Value) -> Option<&Vec<Value>> {
    response.pointer(ADAPTIVE_GROUPS_POINTER)?.as_array()
}

/// Flatten a detail-log response into entries, keeping API order. Groups
/// without a timestamp or path are dropped.
pub fn extract_log_entries(response: &Value) -> Vec<LogEntry> {
    adaptive_groups(response)
        .map(|groups| groups.iter().filter_map(LogEntry::from_group).collect())
        .unwrap_or_default()
}

pub fn filter_by_path(entries: &[LogEntry], target_path: &str) -> Vec<LogEntry> {
    entries
        .iter()
        .filter(|entry| entry.path == target_path)
        .cloned()
        .collect()
}

pub fn filter_by_client(entries: &[LogEntry], target_ip: &str) -> Vec<LogEntry> {
    entries
        .iter()
        .filter(|entry| entry.client_ip == target_ip)
        .cloned()
        .collect()
}

pub fn hot_entries(entries: &[LogEntry], rule: &HotPathRule) -> Vec<LogEntry> {
    entries
        .iter()
        .filter(|entry| rule.matches(&entry.path))
        .cloned()
        .collect()
}

/// Group hot entries by path and rank by summed views, highest first. Equal
/// counts keep no particular order.
pub fn aggregate_hot_paths(entries: &[LogEntry], rule: &HotPathRule) -> Vec<PathHits> {
    let mut path_counts: HashMap<&str, u32> = HashMap::new();
    for entry in entries.iter().filter(|entry| rule.matches(&entry.path)) {
        *path_counts.entry(entry.path.as_str()).or_insert(0) += entry.page_views;
    }

    let mut ranked: Vec<PathHits> = path_counts
        .into_iter()
        .map(|(path, views)| PathHits {
            path: path.to_string(),
            views,
        })
        .collect();
    ranked.sort_by(|a, b| b.views.cmp(&a.views));
    ranked
}

/// Copy of the detail response with its adaptive groups replaced by `entries`.
pub fn with_adaptive_groups(response: &Value, entries: &[LogEntry]) -> Option<Value> {
    let mut replaced = response.clone();
    let groups = replaced.pointer_mut(ADAPTIVE_GROUPS_POINTER)?;
    *groups = serde_json::to_value(entries).ok()?;
    Some(replaced)
}
