// Configuration module entry point
// Loads site configuration and holds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{
    AssetsConfig, Config, HttpConfig, LoggingConfig, MeetupConfig, PerformanceConfig,
    RoutesConfig, ServerConfig, SiteConfig,
};

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("PYTHONSD")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("performance.pool_max_idle_per_host", 32)?
            .set_default("performance.pool_idle_timeout", 90)?
            .set_default("http.server_name", "pythonsd-web")?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("site.static_site", "https://pythonsd.github.io/pythonsd.org/")?
            .set_default("site.admin_url", "admin")?
            .set_default("site.database_url", "sqlite:///db.sqlite3")?
            .set_default("meetup.api_url", "https://api.meetup.com/pythonsd/events")?
            .set_default("assets.build_command", "make")?
            .set_default("assets.css_dir", "pythonsd/static/css")?
            .set_default("assets.static_dirs", vec!["pythonsd/static"])?
            .set_default("assets.static_root", "staticfiles")?
            .set_default("assets.ignore_patterns", vec!["CVS", ".*", "*~"])?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
