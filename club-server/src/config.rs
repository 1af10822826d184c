use std::path::{Path, PathBuf};

/// Engine configuration
///
/// # Environment variables
///
/// | Variable | Default | Purpose |
/// |----------|---------|---------|
/// | CLUB_DATA_DIR | /var/lib/club | Working directory for the database and logs |
/// | CLUB_DB_FILE | club.redb | Database file name inside the data dir |
/// | CLUB_TICK_INTERVAL_MS | 1000 | Display ticker period |
/// | CLUB_LOG_LEVEL | info | Log level for the subscriber |
/// | CLUB_LOG_DIR | (unset) | Daily-rolling log file directory; stderr only when unset |
///
/// A `.env` file in the working directory is honored.
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for persistent state
    pub data_dir: String,
    /// Database file name inside `data_dir`
    pub db_file: String,
    /// Display ticker period in milliseconds
    pub tick_interval_ms: u64,
    /// Log level: trace | debug | info | warn | error
    pub log_level: String,
    /// Optional directory for rolling log files
    pub log_dir: Option<String>,
}

impl Config {
    /// Load configuration from environment variables, with defaults.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self {
            data_dir: std::env::var("CLUB_DATA_DIR").unwrap_or_else(|_| "/var/lib/club".into()),
            db_file: std::env::var("CLUB_DB_FILE").unwrap_or_else(|_| "club.redb".into()),
            tick_interval_ms: std::env::var("CLUB_TICK_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            log_level: std::env::var("CLUB_LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("CLUB_LOG_DIR").ok(),
        }
    }

    /// Full path of the database file.
    pub fn db_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.db_file)
    }
}
