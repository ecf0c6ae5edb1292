/// Panel configuration
///
/// Collapses the per-account dashboard variants into one engine parameterised
/// by TTL, poll cadence and display defaults.
use chrono::TimeDelta;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Account topic used when none is given on the command line
pub const DEFAULT_ACCOUNT: &str = "711700";

/// Marker file whose presence reveals balance and equity in the footer
pub const SHOW_PROFIT_FILE: &str = ".show-profit";

/// Panel configuration
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Account identifier, also the subscription topic
    pub account: String,
    /// Orders and the feed itself are considered stale after this long
    pub ttl: Duration,
    /// Bounded wait for the transport and key source
    pub poll_interval: Duration,
    /// Hide pending orders in the orders view at start
    pub hide_pending: bool,
    /// Show only profit in the footer
    pub hide_balance: bool,
    /// Count pending orders in the position suffix
    pub count_pending: bool,
    /// Show stop loss / take profit columns in the orders view
    pub show_stops: bool,
    /// Fraction of ATR within which a pending order is flagged as near trigger
    pub near_trigger_atr: f64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            account: DEFAULT_ACCOUNT.to_string(),
            ttl: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
            hide_pending: false,
            hide_balance: true,
            count_pending: false,
            show_stops: false,
            near_trigger_atr: 0.5,
        }
    }
}

impl PanelConfig {
    /// Create a new configuration for an account
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            ..Default::default()
        }
    }

    /// Set order and feed TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set initial hide-pending toggle
    pub fn with_hide_pending(mut self, hide: bool) -> Self {
        self.hide_pending = hide;
        self
    }

    /// Set initial hide-balance toggle
    pub fn with_hide_balance(mut self, hide: bool) -> Self {
        self.hide_balance = hide;
        self
    }

    /// Derive hide-balance from the presence of a marker file
    pub fn with_show_file(self, path: Option<&Path>) -> Self {
        let hide = hide_balance_from_marker(path);
        self.with_hide_balance(hide)
    }

    /// Set whether pending orders count towards the position suffix
    pub fn with_count_pending(mut self, count: bool) -> Self {
        self.count_pending = count;
        self
    }

    /// Set stop loss / take profit columns
    pub fn with_show_stops(mut self, show: bool) -> Self {
        self.show_stops = show;
        self
    }

    /// Set near-trigger ATR fraction
    pub fn with_near_trigger_atr(mut self, fraction: f64) -> Self {
        self.near_trigger_atr = fraction;
        self
    }

    /// TTL as a chrono delta for timestamp arithmetic
    pub fn ttl_delta(&self) -> TimeDelta {
        TimeDelta::from_std(self.ttl).unwrap_or(TimeDelta::MAX)
    }
}

/// Default marker file location: `~/.show-profit`
pub fn default_show_file() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(SHOW_PROFIT_FILE))
}

/// Balance stays hidden unless the marker file exists
pub fn hide_balance_from_marker(path: Option<&Path>) -> bool {
    !path.map(Path::exists).unwrap_or(false)
}
