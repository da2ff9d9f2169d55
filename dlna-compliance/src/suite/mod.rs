//! The compliance suite
//!
//! Eight phases run strictly in order against one client session. Later
//! phases read state the earlier ones left behind (the parsed device, the
//! service SCPDs, the items collected while browsing) and degrade to SKIP
//! when it is missing. Only a failed connectivity check ends the run early.

mod browsing;
mod connection_manager;
mod connectivity;
mod content_directory;
mod device;
mod metadata;
mod protocol;
mod resources;

use crate::config::TesterConfig;
use crate::error::Result;
use crate::report::SuiteReport;
use crate::result::{TestCategory, TestResult};
use dlna_client::{MediaItem, MediaServerClient};
use std::fmt;
use std::ops::ControlFlow;
use tracing::{debug, info};

/// A phase either lets the run continue or stops it
type Phase = fn(&mut ComplianceSuite) -> ControlFlow<()>;

/// Phases in run order
const PHASES: [(TestCategory, Phase); 8] = [
    (TestCategory::Connectivity, connectivity::run),
    (TestCategory::DeviceDescription, device::run),
    (TestCategory::ContentDirectory, content_directory::run),
    (TestCategory::ConnectionManager, connection_manager::run),
    (TestCategory::Browsing, browsing::run),
    (TestCategory::Metadata, metadata::run),
    (TestCategory::MediaResources, resources::run),
    (TestCategory::ProtocolCompliance, protocol::run),
];

/// One compliance run against one server
pub struct ComplianceSuite {
    client: MediaServerClient,
    config: TesterConfig,
    results: Vec<TestResult>,
    /// Items collected by the browsing phase, root listing first
    items: Vec<MediaItem>,
}

impl ComplianceSuite {
    /// Validate the configuration and open a client session
    pub fn new(config: TesterConfig) -> Result<Self> {
        config.validate()?;
        let client = MediaServerClient::new(config.host.clone(), config.port, config.timeout)?;

        Ok(Self {
            client,
            config,
            results: Vec::new(),
            items: Vec::new(),
        })
    }

    pub fn config(&self) -> &TesterConfig {
        &self.config
    }

    /// Run every phase and build the report
    pub fn run(mut self) -> SuiteReport {
        info!(
            "Starting compliance run against {}:{}",
            self.config.host, self.config.port
        );

        for (category, phase) in PHASES {
            debug!("Entering phase: {}", category);
            if phase(&mut self).is_break() {
                info!("Stopping run after {} phase", category);
                break;
            }
        }

        let report = SuiteReport::new(
            &self.config.host,
            self.config.port,
            self.results,
            self.client.device(),
        );
        info!(
            "Compliance run finished: {} results, score {:.1}/{:.1} ({})",
            report.summary.total, report.summary.score, report.summary.max_score, report.summary.grade
        );
        report
    }

    /// Progress narration: info when verbose, debug otherwise
    fn narrate(&self, message: impl fmt::Display) {
        if self.config.verbose {
            info!("{}", message);
        } else {
            debug!("{}", message);
        }
    }

    fn record(&mut self, result: TestResult) {
        debug!(
            "[{}] {}: {} ({})",
            result.status, result.name, result.message, result.category
        );
        self.results.push(result);
    }

    fn record_all(&mut self, results: impl IntoIterator<Item = TestResult>) {
        for result in results {
            self.record(result);
        }
    }
}

/// First `max` characters of `value`, with "..." appended when it was cut
pub(crate) fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() > max {
        let mut cut: String = value.chars().take(max).collect();
        cut.push_str("...");
        cut
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_follow_category_order() {
        let order: Vec<TestCategory> = PHASES.iter().map(|(c, _)| *c).collect();
        assert_eq!(order, TestCategory::ALL.to_vec());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 50), "short");
        assert_eq!(truncate(&"x".repeat(51), 50), format!("{}...", "x".repeat(50)));
        assert_eq!(truncate("ééé", 2), "éé...");
    }
}
