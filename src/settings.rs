use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Parse `KEY=VALUE` lines. Blank lines and `#` comments are skipped, a value
/// wrapped in matching quotes is unwrapped, and later keys win.
pub fn parse_settings(content: &str) -> HashMap<String, String> {
    let mut settings = HashMap::new();

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line.split_once('=') {
            Some((key, value)) => {
                let key = key.trim();
                if key.is_empty() {
                    warn!(
                        action = "parse",
                        component = "settings_file",
                        line_number = line_num + 1,
                        "Skipping line with empty key"
                    );
                    continue;
                }
                settings.insert(key.to_string(), unquote(value.trim()).to_string());
            }
            None => {
                warn!(
                    action = "parse",
                    component = "settings_file",
                    line_number = line_num + 1,
                    "Skipping line without '='"
                )
            }
        }
    }

    settings
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Load the settings file at `path`. A missing file yields no settings.
pub fn load_settings_file(path: &Path) -> HashMap<String, String> {
    let start_time = Instant::now();

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(
                action = "skip",
                component = "settings_file",
                file_path = ?path,
                "No settings file found"
            );
            return HashMap::new();
        }
        Err(e) => {
            warn!(
                action = "load",
                component = "settings_file",
                file_path = ?path,
                error = %e,
                "Failed to read settings file"
            );
            return HashMap::new();
        }
    };

    let settings = parse_settings(&content);
    info!(
        action = "loaded",
        component = "settings_file",
        file_path = ?path,
        key_count = settings.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Loaded settings file"
    );
    settings
}
