use super::{truncate, ComplianceSuite};
use crate::result::{TestCategory, TestResult};
use dlna_client::{ClientError, ServiceKind};
use serde_json::json;
use std::ops::ControlFlow;
use tracing::warn;

const CATEGORY: TestCategory = TestCategory::ContentDirectory;

const REQUIRED_ACTIONS: [&str; 4] = [
    "Browse",
    "GetSearchCapabilities",
    "GetSortCapabilities",
    "GetSystemUpdateID",
];

const OPTIONAL_ACTIONS: [&str; 4] = ["Search", "CreateObject", "DestroyObject", "UpdateObject"];

pub(super) fn run(suite: &mut ComplianceSuite) -> ControlFlow<()> {
    suite.narrate("Testing ContentDirectory service...");

    if suite.client.service(ServiceKind::ContentDirectory).is_none() {
        suite.record(TestResult::skip(
            "Content Directory Available",
            CATEGORY,
            "ContentDirectory service not available",
        ));
        return ControlFlow::Continue(());
    }

    match suite.client.fetch_service_description(ServiceKind::ContentDirectory) {
        Ok(scpd) => suite.record(
            TestResult::pass(
                "SCPD Retrieval",
                CATEGORY,
                format!("Retrieved SCPD with {} actions", scpd.actions.len()),
            )
            .with_details(json!({ "actions": scpd.actions })),
        ),
        Err(e) => {
            warn!("ContentDirectory SCPD unavailable: {}", e);
            suite.record(TestResult::fail(
                "SCPD Retrieval",
                CATEGORY,
                "Could not retrieve Service Control Protocol Description",
            ));
        }
    }

    let service = suite
        .client
        .service(ServiceKind::ContentDirectory)
        .cloned()
        .unwrap_or_default();

    for action in REQUIRED_ACTIONS {
        let name = format!("Action: {}", action);
        suite.record(if service.has_action(action) {
            TestResult::pass(name, CATEGORY, format!("{} action available", action))
        } else {
            TestResult::fail(name, CATEGORY, format!("Required action {} not found", action))
        });
    }

    for action in OPTIONAL_ACTIONS.into_iter().filter(|a| service.has_action(a)) {
        suite.record(
            TestResult::pass(
                format!("Optional Action: {}", action),
                CATEGORY,
                format!("{} action available", action),
            )
            .with_weight(0.5),
        );
    }

    let search = suite.client.get_search_capabilities();
    suite.record(capabilities_result("GetSearchCapabilities", "Search", search));

    let sort = suite.client.get_sort_capabilities();
    suite.record(capabilities_result("GetSortCapabilities", "Sort", sort));

    let update_id = match suite.client.get_system_update_id() {
        Ok(id) => TestResult::pass(
            "GetSystemUpdateID",
            CATEGORY,
            format!("System update ID: {}", id),
        )
        .with_details(json!({ "update_id": id })),
        Err(e) => {
            warn!("GetSystemUpdateID failed: {}", e);
            TestResult::fail("GetSystemUpdateID", CATEGORY, "GetSystemUpdateID action failed")
        }
    };
    suite.record(update_id);

    ControlFlow::Continue(())
}

fn capabilities_result(
    action: &str,
    label: &str,
    outcome: Result<String, ClientError>,
) -> TestResult {
    match outcome {
        Ok(caps) => {
            let shown = if caps.is_empty() { "(empty)" } else { caps.as_str() };
            TestResult::pass(
                action,
                CATEGORY,
                format!("{} capabilities: {}", label, truncate(shown, 100)),
            )
            .with_details(json!({ "capabilities": caps }))
        }
        Err(e) => {
            warn!("{} failed: {}", action, e);
            TestResult::fail(action, CATEGORY, format!("{} action failed", action))
        }
    }
}
