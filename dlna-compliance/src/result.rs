//! Test-result data model

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Machine-readable details attached to a result
pub type Details = Map<String, Value>;

/// Outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    Pass,
    Fail,
    Warn,
    Skip,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Pass => "PASS",
            TestStatus::Fail => "FAIL",
            TestStatus::Warn => "WARN",
            TestStatus::Skip => "SKIP",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The eight compliance categories, declared in run order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TestCategory {
    Connectivity,
    DeviceDescription,
    ContentDirectory,
    ConnectionManager,
    Browsing,
    Metadata,
    MediaResources,
    ProtocolCompliance,
}

impl TestCategory {
    /// Every category in run order
    pub const ALL: [TestCategory; 8] = [
        TestCategory::Connectivity,
        TestCategory::DeviceDescription,
        TestCategory::ContentDirectory,
        TestCategory::ConnectionManager,
        TestCategory::Browsing,
        TestCategory::Metadata,
        TestCategory::MediaResources,
        TestCategory::ProtocolCompliance,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TestCategory::Connectivity => "Connectivity",
            TestCategory::DeviceDescription => "Device Description",
            TestCategory::ContentDirectory => "Content Directory",
            TestCategory::ConnectionManager => "Connection Manager",
            TestCategory::Browsing => "Browsing",
            TestCategory::Metadata => "Metadata",
            TestCategory::MediaResources => "Media Resources",
            TestCategory::ProtocolCompliance => "Protocol Compliance",
        }
    }
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for TestCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Result of one compliance check
///
/// Results are built once and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    pub name: String,
    pub category: TestCategory,
    pub status: TestStatus,
    pub message: String,
    pub details: Details,
    /// Criticality: 2.0 for checks compliance hinges on, 0.5 for informational ones
    pub weight: f64,
}

impl TestResult {
    pub fn new(
        name: impl Into<String>,
        category: TestCategory,
        status: TestStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            status,
            message: message.into(),
            details: Details::new(),
            weight: 1.0,
        }
    }

    pub fn pass(name: impl Into<String>, category: TestCategory, message: impl Into<String>) -> Self {
        Self::new(name, category, TestStatus::Pass, message)
    }

    pub fn fail(name: impl Into<String>, category: TestCategory, message: impl Into<String>) -> Self {
        Self::new(name, category, TestStatus::Fail, message)
    }

    pub fn warn(name: impl Into<String>, category: TestCategory, message: impl Into<String>) -> Self {
        Self::new(name, category, TestStatus::Warn, message)
    }

    pub fn skip(name: impl Into<String>, category: TestCategory, message: impl Into<String>) -> Self {
        Self::new(name, category, TestStatus::Skip, message)
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Attach details; anything other than a JSON object is ignored
    pub fn with_details(mut self, details: Value) -> Self {
        if let Value::Object(map) = details {
            self.details = map;
        }
        self
    }

    pub fn passed(&self) -> bool {
        self.status == TestStatus::Pass
    }

    /// Contribution to the total score: full weight for PASS, half for WARN
    pub fn score(&self) -> f64 {
        match self.status {
            TestStatus::Pass => self.weight,
            TestStatus::Warn => self.weight * 0.5,
            TestStatus::Fail | TestStatus::Skip => 0.0,
        }
    }
}

/// Three-way verdict over a proportion: all pass, some warn, none fail
pub(crate) fn proportion_status(matching: usize, total: usize) -> TestStatus {
    if matching == total {
        TestStatus::Pass
    } else if matching > 0 {
        TestStatus::Warn
    } else {
        TestStatus::Fail
    }
}

/// Two-way verdict over a proportion: all pass, otherwise warn
pub(crate) fn coverage_status(matching: usize, total: usize) -> TestStatus {
    if matching == total {
        TestStatus::Pass
    } else {
        TestStatus::Warn
    }
}
