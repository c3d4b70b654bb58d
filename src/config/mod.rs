/// Application configuration module
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

const DEFAULT_BASE_URL: &str =
    "https://api1.raildata.org.uk/1010-live-departure-board-dep1_2/LDBWS/api/20220120/GetDepBoardWithDetails/";
const APP_DIR: &str = "quick_train_times";

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Directory holding settings.json and qtt.json
    pub data_dir: PathBuf,
    pub ldb_base_url: String,
    pub listen_addr: String,
    /// Overrides the key from settings.json when set
    pub api_key: Option<String>,
    pub http_timeout: Duration,
    /// Station list replacing the bundled one, same JSON layout
    pub stations_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir());

        let mut ldb_base_url = env::var("LDB_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        if !ldb_base_url.ends_with('/') {
            ldb_base_url.push('/');
        }

        let listen_addr = env::var("LISTEN_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());

        let api_key = env::var("LDB_API_KEY").ok().filter(|k| !k.trim().is_empty());

        let http_timeout = Duration::from_secs(env_u64("HTTP_TIMEOUT_SECONDS", 30));

        let stations_file = env::var("STATIONS_FILE").ok().map(PathBuf::from);

        Ok(Self {
            data_dir,
            ldb_base_url,
            listen_addr,
            api_key,
            http_timeout,
            stations_file,
        })
    }
}

fn default_data_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Longest poll interval accepted from settings.json
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Poll interval from the settings frequency, kept within one second and
/// one day
pub fn poll_interval(freq_seconds: f64) -> Duration {
    match Duration::try_from_secs_f64(freq_seconds) {
        Ok(d) if d < Duration::from_secs(1) => Duration::from_secs(1),
        Ok(d) if d > MAX_POLL_INTERVAL => {
            warn!("freq {}s is too long, polling daily", freq_seconds);
            MAX_POLL_INTERVAL
        }
        Ok(d) => d,
        Err(_) if freq_seconds > 0.0 => {
            warn!("freq {}s is too long, polling daily", freq_seconds);
            MAX_POLL_INTERVAL
        }
        Err(_) => {
            warn!("freq {:?} is not a usable interval, polling every second", freq_seconds);
            Duration::from_secs(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_interval() {
        assert_eq!(poll_interval(60.0), Duration::from_secs(60));
        assert_eq!(poll_interval(2.5), Duration::from_millis(2500));
        assert_eq!(poll_interval(0.0), Duration::from_secs(1));
        assert_eq!(poll_interval(-3.0), Duration::from_secs(1));
        assert_eq!(poll_interval(f64::NAN), Duration::from_secs(1));
    }

    #[test]
    fn test_poll_interval_huge_values_are_capped() {
        assert_eq!(poll_interval(1e30), MAX_POLL_INTERVAL);
        assert_eq!(poll_interval(f64::INFINITY), MAX_POLL_INTERVAL);
        assert_eq!(poll_interval(90_000.0), MAX_POLL_INTERVAL);
        assert_eq!(poll_interval(86_400.0), MAX_POLL_INTERVAL);
    }

    #[test]
    fn test_env_u64_fallback() {
        assert_eq!(env_u64("QTT_TEST_UNSET_VARIABLE", 42), 42);
    }
}
