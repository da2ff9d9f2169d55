//! DLNA/UPnP media server compliance suite
//!
//! Runs eight categories of checks against one media server, from plain
//! reachability to DIDL-Lite metadata quality, and grades the outcome.
//!
//! # Quick Start
//!
//! ```no_run
//! use dlna_compliance::{ComplianceSuite, TesterConfig};
//! use std::time::Duration;
//!
//! let config = TesterConfig::new("192.168.1.20", 8200).with_timeout(Duration::from_secs(5));
//! let report = ComplianceSuite::new(config)?.run();
//!
//! for result in &report.results {
//!     println!("[{}] {}: {}", result.status, result.name, result.message);
//! }
//! println!(
//!     "Score: {:.1}/{:.1} ({})",
//!     report.summary.score, report.summary.max_score, report.summary.grade
//! );
//! # Ok::<(), dlna_compliance::ComplianceError>(())
//! ```
//!
//! # Scoring
//!
//! A PASS earns its full weight, a WARN half of it, a FAIL nothing. SKIP
//! results are left out of both the score and the maximum. The percentage of
//! the maximum maps to a letter grade, see [`Grade::from_percentage`].

pub mod config;
pub mod error;
pub mod report;
pub mod result;
pub mod score;
pub mod suite;
pub mod traversal;

pub use config::{TesterConfig, DEFAULT_MAX_ITEMS, DEFAULT_TIMEOUT};
pub use error::{ComplianceError, ConfigError, Result};
pub use report::{DeviceSummary, ServerInfo, SuiteReport};
pub use result::{Details, TestCategory, TestResult, TestStatus};
pub use score::{percentage, score, CategoryCounts, Grade, Summary};
pub use suite::ComplianceSuite;
pub use traversal::{
    traverse, ContentBrowser, FailedBrowse, NavigationEvent, TraversalMode, TraversalReport,
};
