//! Environment-based configuration.

use crate::analysis::coords::Orientation;

#[derive(Clone, Debug)]
pub struct Config {
    pub store_url: String,
    pub bucket: String,
    pub data_prefix: String,
    pub port: u16,
    pub cache_ttl_secs: u64,
    pub cache_max_entries: usize,
    /// Vertical axis convention shared by the profiler and the region
    /// selector. Exactly one component of the system decides this.
    pub orientation: Orientation,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            store_url: std::env::var("STORE_URL")
                .unwrap_or_else(|_| "http://localhost:9000".to_string()),
            bucket: std::env::var("S3_BUCKET")
                .unwrap_or_else(|_| "quicklook-images".to_string()),
            data_prefix: std::env::var("DATA_PREFIX").unwrap_or_else(|_| "data/".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            cache_ttl_secs: std::env::var("CACHE_TTL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3600),
            cache_max_entries: std::env::var("CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(1024),
            orientation: match std::env::var("AXIS_ORIGIN").as_deref() {
                Ok("bottom-left") => Orientation::BottomLeft,
                _ => Orientation::TopLeft,
            },
        }
    }
}
