use super::ComplianceSuite;
use crate::result::{TestCategory, TestResult};
use serde_json::json;
use std::ops::ControlFlow;
use std::time::Duration;

const CATEGORY: TestCategory = TestCategory::Connectivity;

/// Timeout of the reachability check, independent of the session timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub(super) fn run(suite: &mut ComplianceSuite) -> ControlFlow<()> {
    suite.narrate("Testing connectivity...");

    match suite.client.check_connectivity(CONNECT_TIMEOUT) {
        Ok(status) => suite.record(
            TestResult::pass(
                "HTTP Connection",
                CATEGORY,
                format!("Server responded with status {}", status),
            )
            .with_details(json!({ "status_code": status }))
            .with_weight(2.0),
        ),
        Err(e) => {
            suite.record(
                TestResult::fail("HTTP Connection", CATEGORY, format!("Failed to connect: {}", e))
                    .with_weight(2.0),
            );
            return ControlFlow::Break(());
        }
    }

    match suite.client.discover_description_url() {
        Some(url) => suite.record(
            TestResult::pass(
                "Device Description Discovery",
                CATEGORY,
                format!("Found device description at {}", url),
            )
            .with_details(json!({ "url": url }))
            .with_weight(2.0),
        ),
        None => suite.record(
            TestResult::fail(
                "Device Description Discovery",
                CATEGORY,
                "Could not find device description XML",
            )
            .with_weight(2.0),
        ),
    }

    ControlFlow::Continue(())
}
