use std::net::SocketAddr;

use chrono::FixedOffset;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Published CSV export of the fuel plan spreadsheet.
    pub sheet_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub cache_ttl_secs: u64,
    pub fetch_timeout_secs: u64,
    pub max_redirects: usize,
    pub user_agent: String,
    /// Offset used to decide where a calendar day starts. `None` means the
    /// host's local zone.
    pub utc_offset: Option<FixedOffset>,
    /// Cron expression for the background cache-warm job. `None` disables it.
    pub warm_cron: Option<String>,
}
