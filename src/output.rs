use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::window::QueryWindow;

const EMPTY_SLUG: &str = "root";

/// Make `value` safe for use inside a file name. A value with no safe
/// characters at all, such as `/`, becomes `root`.
pub fn slug(value: &str) -> String {
    let slug = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect::<String>()
        .trim_matches('-')
        .to_string();

    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug
    }
}

/// Deterministic output file names for one window.
#[derive(Debug, Clone)]
pub struct OutputFiles {
    dir: PathBuf,
    date: String,
}

impl OutputFiles {
    pub fn new(dir: &Path, window: &QueryWindow) -> Self {
        Self {
            dir: dir.to_path_buf(),
            date: window.start_date(),
        }
    }

    fn file(&self, name: String) -> PathBuf {
        self.dir.join(name)
    }

    pub fn daily(&self) -> PathBuf {
        self.file(format!("cloudflare-stats-daily-{}.json", self.date))
    }

    pub fn hourly(&self) -> PathBuf {
        self.file(format!("cloudflare-stats-hourly-{}.json", self.date))
    }

    pub fn pages(&self) -> PathBuf {
        self.file(format!("cloudflare-stats-pages-{}.json", self.date))
    }

    pub fn detailed_logs(&self) -> PathBuf {
        self.file(format!("detailed-logs-{}.json", self.date))
    }

    pub fn top_hits(&self) -> PathBuf {
        self.file(format!("top_hits-{}.json", self.date))
    }

    pub fn page_detail(&self, target_path: &str) -> PathBuf {
        self.file(format!("page-detail-{}-{}.json", self.date, slug(target_path)))
    }

    pub fn ip_activity(&self, target_ip: &str) -> PathBuf {
        self.file(format!("ip-activity-{}-{}.json", self.date, slug(target_ip)))
    }
}

/// Write `value` as indented JSON, replacing any existing file.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }

    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;

    info!(action = "write", component = "output", file_path = ?path, "Saved JSON output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    fn files() -> OutputFiles {
        let window = QueryWindow::ending_on(NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
        OutputFiles::new(Path::new("out"), &window)
    }

    #[test]
    fn slug_replaces_unsafe_characters() {
        assert_eq!(slug("115.194.149.254"), "115-194-149-254");
        assert_eq!(slug("/free/detail/supabase.html"), "free-detail-supabase-html");
        assert_eq!(slug("2001:db8::1"), "2001-db8--1");
        assert_eq!(slug("plain_name"), "plain_name");
        assert_eq!(slug("/"), "root");
        assert_eq!(slug("::"), "root");
    }

    #[test]
    fn site_root_target_is_named() {
        assert_eq!(
            files().page_detail("/"),
            Path::new("out/page-detail-2024-06-01-root.json")
        );
    }

    #[test]
    fn names_are_deterministic() {
        let files = files();
        assert_eq!(files.daily(), Path::new("out/cloudflare-stats-daily-2024-06-01.json"));
        assert_eq!(files.hourly(), Path::new("out/cloudflare-stats-hourly-2024-06-01.json"));
        assert_eq!(files.pages(), Path::new("out/cloudflare-stats-pages-2024-06-01.json"));
        assert_eq!(files.detailed_logs(), Path::new("out/detailed-logs-2024-06-01.json"));
        assert_eq!(files.top_hits(), Path::new("out/top_hits-2024-06-01.json"));
        assert_eq!(
            files.page_detail("/free/detail/supabase.html"),
            Path::new("out/page-detail-2024-06-01-free-detail-supabase-html.json")
        );
        assert_eq!(
            files.ip_activity("115.194.149.254"),
            Path::new("out/ip-activity-2024-06-01-115-194-149-254.json")
        );
        assert_eq!(files.ip_activity("1.2.3.4"), files.ip_activity("1.2.3.4"));
    }

    #[test]
    fn write_json_creates_directory_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");

        write_json(&path, &json!({"first": true})).unwrap();
        write_json(&path, &json!({"second": [1, 2]})).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n  \"second\""));
        let value: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value, json!({"second": [1, 2]}));
    }

    #[test]
    fn empty_array_is_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        write_json(&path, &Vec::<u32>::new()).unwrap();
        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value, json!([]));
    }
}
