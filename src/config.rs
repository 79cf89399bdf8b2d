use std::time::Duration;

use serde::Deserialize;
use time::{macros::format_description, UtcOffset};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub api_url: String,
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http: HttpConfig,
    /// Offset used when rendering history timestamps.
    pub display_offset: UtcOffset,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig {
                api_url: DEFAULT_API_URL.into(),
                timeout_secs: 30,
            },
            display_offset: UtcOffset::UTC,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_url = std::env::var("MEALSCAN_API_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.into());
        anyhow::ensure!(
            api_url.starts_with("http://") || api_url.starts_with("https://"),
            "MEALSCAN_API_URL must be an http(s) url, got {api_url}"
        );

        let http = HttpConfig {
            api_url,
            timeout_secs: std::env::var("MEALSCAN_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
        };
        let display_offset = std::env::var("MEALSCAN_DISPLAY_OFFSET")
            .ok()
            .and_then(|v| parse_offset(&v))
            .unwrap_or(UtcOffset::UTC);

        Ok(Self {
            http,
            display_offset,
        })
    }
}

/// Parses `+08:00` / `-05:30` style offsets.
pub(crate) fn parse_offset(raw: &str) -> Option<UtcOffset> {
    let fmt = format_description!("[offset_hour sign:mandatory]:[offset_minute]");
    UtcOffset::parse(raw.trim(), &fmt).ok()
}
