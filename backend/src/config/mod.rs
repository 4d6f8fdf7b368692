use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_url: String,
    pub store_timeout_secs: u64,
    pub host: String,
    pub port: u16,
    pub dashboard_window_days: u32,
    pub dashboard_top_n: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            store_url: env::var("STORE_URL")?,
            store_timeout_secs: env_or("STORE_TIMEOUT_SECS", 10),
            host: env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("BACKEND_PORT", 3000),
            dashboard_window_days: env_or("DASHBOARD_WINDOW_DAYS", 30),
            dashboard_top_n: env_or("DASHBOARD_TOP_N", 5),
        })
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}

/// Read and parse an optional variable, falling back on absence or parse failure.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
