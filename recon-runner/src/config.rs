//! Runner configuration
//!
//! Defines the backend connection, where run state is kept, and the timing
//! budget every watch and step transition obeys.

use std::path::PathBuf;
use std::time::Duration;

/// Timing budget of a single completion watch
///
/// All thresholds are measured from the moment the watch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchBudget {
    /// Delay between two status polls (the first poll happens one interval in)
    pub poll_interval: Duration,

    /// Checked by the poll loop itself; resolves with `timeout`
    pub soft_timeout: Duration,

    /// Races the poll loop; resolves with `hard_timeout`
    pub hard_timeout: Duration,

    /// Last-resort backstop; resolves with `absolute_timeout`
    pub absolute_timeout: Duration,

    /// Consecutive failed or empty polls tolerated before giving up
    pub max_empty_or_error_attempts: u32,
}

impl Default for WatchBudget {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(5_000),
            soft_timeout: Duration::from_millis(600_000),
            hard_timeout: Duration::from_millis(900_000),
            absolute_timeout: Duration::from_millis(1_200_000),
            max_empty_or_error_attempts: 10,
        }
    }
}

impl WatchBudget {
    /// Validates the budget
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.soft_timeout > self.hard_timeout {
            anyhow::bail!("soft_timeout must not exceed hard_timeout");
        }

        if self.hard_timeout > self.absolute_timeout {
            anyhow::bail!("hard_timeout must not exceed absolute_timeout");
        }

        Ok(())
    }
}

/// Runner configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL (e.g., "http://localhost:8443")
    pub backend_url: String,

    /// Directory holding one run-state file per target
    pub state_dir: PathBuf,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,

    /// Timing of every completion watch
    pub budget: WatchBudget,

    /// Pause between a tool's watch resolving and its results being re-read
    pub settle_delay: Duration,

    /// Pause before a consolidation step merges results
    pub consolidation_settle_delay: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(backend_url: String) -> Self {
        Self {
            backend_url,
            state_dir: PathBuf::from(".recon-state"),
            request_timeout: Duration::from_secs(30),
            budget: WatchBudget::default(),
            settle_delay: Duration::from_millis(2_000),
            consolidation_settle_delay: Duration::from_millis(2_000),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Every variable is optional:
    /// - RECON_BACKEND_URL (default: http://localhost:8443)
    /// - RECON_STATE_DIR (default: .recon-state)
    /// - RECON_REQUEST_TIMEOUT_SECS (default: 30)
    /// - RECON_POLL_INTERVAL_MS (default: 5000)
    /// - RECON_SOFT_TIMEOUT_MS (default: 600000)
    /// - RECON_HARD_TIMEOUT_MS (default: 900000)
    /// - RECON_ABSOLUTE_TIMEOUT_MS (default: 1200000)
    /// - RECON_MAX_EMPTY_OR_ERROR_ATTEMPTS (default: 10)
    /// - RECON_SETTLE_DELAY_MS (default: 2000)
    /// - RECON_CONSOLIDATION_SETTLE_DELAY_MS (default: 2000)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::new("http://localhost:8443".to_string());

        let parse = |name: &str| lookup(name).and_then(|s| s.trim().parse::<u64>().ok());
        let millis = |name: &str, default: Duration| {
            parse(name).map(Duration::from_millis).unwrap_or(default)
        };

        let budget = WatchBudget {
            poll_interval: millis("RECON_POLL_INTERVAL_MS", defaults.budget.poll_interval),
            soft_timeout: millis("RECON_SOFT_TIMEOUT_MS", defaults.budget.soft_timeout),
            hard_timeout: millis("RECON_HARD_TIMEOUT_MS", defaults.budget.hard_timeout),
            absolute_timeout: millis(
                "RECON_ABSOLUTE_TIMEOUT_MS",
                defaults.budget.absolute_timeout,
            ),
            max_empty_or_error_attempts: lookup("RECON_MAX_EMPTY_OR_ERROR_ATTEMPTS")
                .and_then(|s| s.trim().parse::<u32>().ok())
                .unwrap_or(defaults.budget.max_empty_or_error_attempts),
        };

        Self {
            backend_url: lookup("RECON_BACKEND_URL").unwrap_or(defaults.backend_url),
            state_dir: lookup("RECON_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_dir),
            request_timeout: parse("RECON_REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            budget,
            settle_delay: millis("RECON_SETTLE_DELAY_MS", defaults.settle_delay),
            consolidation_settle_delay: millis(
                "RECON_CONSOLIDATION_SETTLE_DELAY_MS",
                defaults.consolidation_settle_delay,
            ),
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.backend_url.is_empty() {
            anyhow::bail!("backend_url cannot be empty");
        }

        if !self.backend_url.starts_with("http://") && !self.backend_url.starts_with("https://") {
            anyhow::bail!("backend_url must start with http:// or https://");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        self.budget.validate()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("http://localhost:8443".to_string())
    }
}
