// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub routes: RoutesConfig,
    pub site: SiteConfig,
    pub meetup: MeetupConfig,
    pub assets: AssetsConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common or json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
    /// Idle upstream connections kept per host by the shared client
    pub pool_max_idle_per_host: usize,
    /// Seconds before an idle pooled connection is closed
    pub pool_idle_timeout: u64,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
}

/// Fixed redirect table, exact path match
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RoutesConfig {
    #[serde(default)]
    pub redirects: BTreeMap<String, String>,
}

const DEFAULT_REDIRECTS: [(&str, &str); 2] = [
    ("/", "/index.html"),
    ("/coc", "/pages/code-of-conduct.html"),
];

impl RoutesConfig {
    /// Redirect target for `path`; configured entries shadow the built-in ones
    pub fn redirect_target(&self, path: &str) -> Option<&str> {
        self.redirects.get(path).map(String::as_str).or_else(|| {
            DEFAULT_REDIRECTS
                .iter()
                .find(|(from, _)| *from == path)
                .map(|(_, to)| *to)
        })
    }
}

/// Site-wide settings
#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Base URL of the statically hosted site used by the proxy fallback
    pub static_site: String,
    /// Path segment reserved for the admin interface, never proxied
    pub admin_url: String,
    pub database_url: String,
}

impl SiteConfig {
    /// Whether `path` falls under the reserved admin prefix
    pub fn is_admin_path(&self, path: &str) -> bool {
        let segment = self.admin_url.trim_matches('/');
        if segment.is_empty() {
            return false;
        }
        path.trim_start_matches('/')
            .strip_prefix(segment)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MeetupConfig {
    pub api_url: String,
}

/// Static asset build and collection
#[derive(Debug, Deserialize, Clone)]
pub struct AssetsConfig {
    /// External command run with no arguments before listing compiled assets
    pub build_command: String,
    /// Output directory of the build command
    pub css_dir: PathBuf,
    /// Source directories searched after the compiled output
    pub static_dirs: Vec<PathBuf>,
    /// Destination of `collectstatic`
    pub static_root: PathBuf,
    pub ignore_patterns: Vec<String>,
}
