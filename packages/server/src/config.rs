//! Environment-driven server configuration, read once at startup.

use std::path::PathBuf;

/// Server configuration with defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
    /// Path to the ward boundary `GeoJSON` file, when one is configured.
    pub ward_geojson: Option<PathBuf>,
    /// Directory for uploaded images.
    pub upload_dir: PathBuf,
    /// Maximum upload size in bytes.
    pub max_upload_size: usize,
    /// Report submissions allowed per user per hour.
    pub rate_limit_reports_per_hour: u32,
    /// Comments allowed per user per hour.
    pub rate_limit_comments_per_hour: u32,
    /// Base URL of an `OpenTopodata`-compatible service, when terrain
    /// lookups are enabled.
    pub elevation_api_base: Option<String>,
    /// Elevation dataset name.
    pub elevation_dataset: String,
    /// Static bearer tokens as `token:user_id:ROLE` triples.
    pub auth_tokens: Vec<String>,
}

impl ServerConfig {
    /// Reads configuration from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            ward_geojson: std::env::var("WARD_GEOJSON").ok().map(PathBuf::from),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map_or_else(|_| PathBuf::from("uploads"), PathBuf::from),
            max_upload_size: std::env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10 * 1024 * 1024),
            rate_limit_reports_per_hour: std::env::var("RATE_LIMIT_REPORTS_PER_HOUR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            rate_limit_comments_per_hour: std::env::var("RATE_LIMIT_COMMENTS_PER_HOUR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            elevation_api_base: std::env::var("ELEVATION_API_BASE").ok(),
            elevation_dataset: std::env::var("ELEVATION_DATASET")
                .unwrap_or_else(|_| "srtm30m".to_string()),
            auth_tokens: std::env::var("AUTH_TOKENS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}
