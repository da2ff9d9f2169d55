use super::ComplianceSuite;
use crate::result::{TestCategory, TestResult};
use dlna_client::ServiceKind;
use serde_json::json;
use soap_client::fault_code;
use std::ops::ControlFlow;
use tracing::debug;

const CATEGORY: TestCategory = TestCategory::ProtocolCompliance;

/// ObjectID no server should know
const INVALID_OBJECT_ID: &str = "INVALID_ID_THAT_SHOULD_NOT_EXIST_12345";

pub(super) fn run(suite: &mut ComplianceSuite) -> ControlFlow<()> {
    suite.narrate("Testing protocol compliance...");

    let has_content_directory = suite.client.service(ServiceKind::ContentDirectory).is_some();

    if has_content_directory {
        let handled = match suite.client.invoke(
            ServiceKind::ContentDirectory,
            "Browse",
            &[("ObjectID", INVALID_OBJECT_ID)],
        ) {
            Ok(body) => {
                let details = match fault_code(&body) {
                    Some(code) => json!({ "fault_code": code }),
                    None => json!({}),
                };
                TestResult::pass(
                    "Error Handling",
                    CATEGORY,
                    "Server handles invalid requests gracefully",
                )
                .with_details(details)
            }
            Err(e) => {
                debug!("Invalid Browse was not answered: {}", e);
                TestResult::warn(
                    "Error Handling",
                    CATEGORY,
                    "Server may not handle invalid requests gracefully",
                )
            }
        };
        suite.record(handled);
    }

    if let Some(url) = suite.client.description_url().map(str::to_string) {
        let head = match suite.client.http().head(&url) {
            Ok(response) if response.status().as_u16() == 200 => TestResult::pass(
                "HTTP HEAD Support",
                CATEGORY,
                "Server supports HTTP HEAD requests",
            ),
            Ok(response) => TestResult::warn(
                "HTTP HEAD Support",
                CATEGORY,
                format!("HTTP HEAD returned status {}", response.status().as_u16()),
            ),
            Err(e) => {
                debug!("HEAD {} failed: {}", url, e);
                TestResult::warn(
                    "HTTP HEAD Support",
                    CATEGORY,
                    "Server may not support HTTP HEAD requests",
                )
            }
        };
        suite.record(head);

        match suite.client.http().get(&url) {
            Ok(response) => {
                let content_type = response
                    .headers()
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                suite.record(content_type_result(&content_type));
            }
            Err(e) => debug!("GET {} failed, skipping Content-Type check: {}", url, e),
        }
    }

    if has_content_directory {
        let first = suite.client.get_system_update_id();
        let second = suite.client.get_system_update_id();
        if let (Ok(first), Ok(second)) = (first, second) {
            suite.record(if first == second {
                TestResult::pass(
                    "SystemUpdateID Consistency",
                    CATEGORY,
                    "SystemUpdateID is consistent between requests",
                )
            } else {
                TestResult::warn(
                    "SystemUpdateID Consistency",
                    CATEGORY,
                    format!("SystemUpdateID changed between requests: {} -> {}", first, second),
                )
            });
        }
    }

    ControlFlow::Continue(())
}

fn content_type_result(content_type: &str) -> TestResult {
    if content_type.to_ascii_lowercase().contains("xml") {
        TestResult::pass(
            "XML Content-Type",
            CATEGORY,
            format!("Correct Content-Type for XML: {}", content_type),
        )
    } else {
        TestResult::warn(
            "XML Content-Type",
            CATEGORY,
            format!("Non-standard Content-Type for XML: {}", content_type),
        )
    }
}
