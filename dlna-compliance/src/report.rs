//! What a finished run hands to a presentation layer

use crate::result::{TestCategory, TestResult};
use crate::score::Summary;
use dlna_client::DeviceDescriptor;
use serde::Serialize;

/// Target of the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    pub host: String,
    pub port: u16,
}

/// The device fields a report shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    pub friendly_name: String,
    pub manufacturer: String,
    pub model_name: String,
    pub device_type: String,
}

impl From<&DeviceDescriptor> for DeviceSummary {
    fn from(device: &DeviceDescriptor) -> Self {
        Self {
            friendly_name: device.friendly_name.clone(),
            manufacturer: device.manufacturer.clone(),
            model_name: device.model_name.clone(),
            device_type: device.device_type.clone(),
        }
    }
}

/// Results of a run, their summary and the device they were taken from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuiteReport {
    pub server: ServerInfo,
    pub summary: Summary,
    pub results: Vec<TestResult>,
    /// `None` when the device description could not be fetched
    pub device: Option<DeviceSummary>,
}

impl SuiteReport {
    pub fn new(
        host: &str,
        port: u16,
        results: Vec<TestResult>,
        device: Option<&DeviceDescriptor>,
    ) -> Self {
        Self {
            server: ServerInfo {
                host: host.to_string(),
                port,
            },
            summary: Summary::from_results(&results),
            results,
            device: device.map(DeviceSummary::from),
        }
    }

    /// Whether any check failed
    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }

    /// Results of one category, in run order
    pub fn category(&self, category: TestCategory) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(move |r| r.category == category)
    }

    /// First result with the given name
    pub fn find(&self, name: &str) -> Option<&TestResult> {
        self.results.iter().find(|r| r.name == name)
    }
}
