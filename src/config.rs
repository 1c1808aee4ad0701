use anyhow::Result;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use tracing::{error, info};
use url::Url;

use crate::detail::HotPathRule;
use crate::settings;
use crate::window::QueryWindow;
use crate::Args;

pub const EMAIL_VAR: &str = "CLOUDFLARE_AUTH_EMAIL";
pub const KEY_VAR: &str = "CLOUDFLARE_API_KEY";
pub const ZONE_VAR: &str = "CLOUDFLARE_ZONE_ID";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub auth_email: String,
    pub auth_key: String,
    pub zone_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("auth_email", &self.auth_email)
            .field("auth_key", &"<redacted>")
            .field("zone_id", &self.zone_id)
            .finish()
    }
}

impl Credentials {
    /// Merge `layers` in order, later layers overriding earlier ones, and
    /// require all three credentials to be non-empty.
    pub fn resolve(layers: &[&HashMap<String, String>]) -> Result<Self> {
        let lookup = |var: &str| {
            layers
                .iter()
                .rev()
                .find_map(|layer| layer.get(var))
                .cloned()
                .unwrap_or_default()
        };

        let credentials = Self {
            auth_email: lookup(EMAIL_VAR),
            auth_key: lookup(KEY_VAR),
            zone_id: lookup(ZONE_VAR),
        };

        let missing: Vec<&str> = [
            (EMAIL_VAR, &credentials.auth_email),
            (KEY_VAR, &credentials.auth_key),
            (ZONE_VAR, &credentials.zone_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(var, _)| var)
        .collect();

        if !missing.is_empty() {
            anyhow::bail!(
                "Missing required configuration: {}. Set them in the environment, the settings file, or with --email/--key/--zone",
                missing.join(", ")
            );
        }

        Ok(credentials)
    }
}

/// Command-line credential values keyed like their environment variables.
/// Empty values are treated as absent.
pub fn cli_overrides(args: &Args) -> HashMap<String, String> {
    [
        (EMAIL_VAR, &args.email),
        (KEY_VAR, &args.key),
        (ZONE_VAR, &args.zone),
    ]
    .into_iter()
    .filter_map(|(var, value)| {
        value
            .as_ref()
            .filter(|v| !v.is_empty())
            .map(|v| (var.to_string(), v.clone()))
    })
    .collect()
}

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub credentials: Credentials,
    pub window: QueryWindow,
    pub endpoint: Url,
    pub output_dir: PathBuf,
    pub target_path: String,
    pub target_ip: String,
    pub hot_paths: HotPathRule,
    pub top: usize,
}

impl RunConfig {
    /// Resolve credentials from `env`, the settings file and the command line,
    /// then the query window.
    pub fn from_args(args: &Args, env: &HashMap<String, String>) -> Result<Self> {
        let file_settings = settings::load_settings_file(&args.env_file);
        let overrides = cli_overrides(args);

        let credentials = Credentials::resolve(&[env, &file_settings, &overrides])
            .inspect_err(|e| error!(action = "resolve", component = "credentials", error = %e, "Credential resolution failed"))?;
        info!(action = "resolve", component = "credentials", zone_id = %credentials.zone_id, "Credentials resolved");

        let window = QueryWindow::resolve(args.start, args.end)?;
        info!(action = "resolve", component = "window", start = %window.start, end = %window.end, "Query window resolved");

        Ok(Self {
            credentials,
            window,
            endpoint: args.endpoint.clone(),
            output_dir: args.output_dir.clone(),
            target_path: args.target_path.clone(),
            target_ip: args.target_ip.clone(),
            hot_paths: HotPathRule::new(&args.hot_marker, &args.hot_suffix),
            top: args.top,
        })
    }
}
