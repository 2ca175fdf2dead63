use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Browser user agent sent with every page request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Upper bound for the automatically sized worker pool
pub const MAX_DEFAULT_WORKERS: usize = 32;

/// Main configuration structure for Nav-Mapper
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Fetch and retry behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Retries after the first attempt on transient network faults
    pub retries: u32,

    /// First backoff delay (milliseconds)
    pub initial_delay_ms: u64,

    /// Multiplier applied to the delay after each attempt
    pub backoff_factor: f64,

    /// Random perturbation as a fraction of the nominal delay
    pub jitter: f64,

    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,

    /// Redirect hops followed before giving up
    pub max_redirects: usize,

    /// User agent header value
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            initial_delay_ms: 1000,
            backoff_factor: 2.0,
            jitter: 0.1,
            request_timeout_secs: 15,
            max_redirects: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CrawlerConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Output file configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Directory receiving the rendered navigation maps
    pub output_dir: PathBuf,

    /// Appended to the derived website name to form the file name
    pub file_suffix: String,

    /// Appended to an output path to form its lock marker path
    pub lock_suffix: String,

    /// Age after which a lock marker is presumed abandoned (seconds)
    pub stale_lock_secs: u64,

    /// Append-only log of permanently failed tasks
    pub dead_letter_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output_maps"),
            file_suffix: "_nav_map.md".to_string(),
            lock_suffix: ".lock".to_string(),
            stale_lock_secs: 300,
            dead_letter_path: PathBuf::from("dlq.log"),
        }
    }
}

impl OutputConfig {
    pub fn stale_lock_threshold(&self) -> Duration {
        Duration::from_secs(self.stale_lock_secs)
    }
}

/// Worker pool configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PoolConfig {
    /// Concurrent tasks; 0 selects a size from the available parallelism
    pub max_workers: usize,
}

impl PoolConfig {
    /// Resolves the configured pool size, sizing from the host when unset
    pub fn effective_workers(&self) -> usize {
        if self.max_workers > 0 {
            return self.max_workers;
        }
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        (cpus + 4).min(MAX_DEFAULT_WORKERS)
    }
}

/// JSON log file settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LoggingConfig {
    /// Write JSON log lines to a file in addition to the console
    pub enabled: bool,

    pub log_dir: PathBuf,

    pub log_file: String,

    /// Size at which the file is rolled over (bytes)
    pub max_bytes: u64,

    /// Rolled-over files kept next to the live one
    pub backups: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_dir: PathBuf::from("logs"),
            log_file: "app.log".to_string(),
            max_bytes: 5 * 1024 * 1024,
            backups: 5,
        }
    }
}

impl LoggingConfig {
    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(&self.log_file)
    }
}
