//! Configuration of a compliance run

use crate::error::ConfigError;
use crate::traversal::TraversalMode;
use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default item budget of a full scan
pub const DEFAULT_MAX_ITEMS: usize = 1000;

/// Target server and run options
#[derive(Debug, Clone, PartialEq)]
pub struct TesterConfig {
    pub host: String,
    pub port: u16,
    /// Timeout applied to every request
    pub timeout: Duration,
    /// Emit phase narration at info level instead of debug
    pub verbose: bool,
    /// Traverse every container instead of sampling one branch
    pub full_scan: bool,
    /// Item budget of a full scan
    pub max_items: usize,
}

impl TesterConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: DEFAULT_TIMEOUT,
            verbose: false,
            full_scan: false,
            max_items: DEFAULT_MAX_ITEMS,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_full_scan(mut self, full_scan: bool, max_items: usize) -> Self {
        self.full_scan = full_scan;
        self.max_items = max_items;
        self
    }

    /// `http://{host}:{port}`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn traversal_mode(&self) -> TraversalMode {
        if self.full_scan {
            TraversalMode::FullScan {
                max_items: self.max_items,
            }
        } else {
            TraversalMode::Sample
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.max_items == 0 {
            return Err(ConfigError::ZeroMaxItems);
        }
        Ok(())
    }
}
