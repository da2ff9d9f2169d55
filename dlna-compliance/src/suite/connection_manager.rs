use super::ComplianceSuite;
use crate::result::{TestCategory, TestResult};
use dlna_client::ServiceKind;
use serde_json::json;
use std::ops::ControlFlow;
use tracing::warn;

const CATEGORY: TestCategory = TestCategory::ConnectionManager;

/// Source protocols echoed in the GetProtocolInfo details
const LISTED_PROTOCOLS: usize = 10;

pub(super) fn run(suite: &mut ComplianceSuite) -> ControlFlow<()> {
    suite.narrate("Testing ConnectionManager service...");

    if suite.client.service(ServiceKind::ConnectionManager).is_none() {
        suite.record(TestResult::skip(
            "Connection Manager Available",
            CATEGORY,
            "ConnectionManager service not available",
        ));
        return ControlFlow::Continue(());
    }

    match suite.client.fetch_service_description(ServiceKind::ConnectionManager) {
        Ok(scpd) => suite.record(
            TestResult::pass(
                "CM SCPD Retrieval",
                CATEGORY,
                format!("Retrieved SCPD with {} actions", scpd.actions.len()),
            )
            .with_details(json!({ "actions": scpd.actions })),
        ),
        Err(e) => {
            warn!("ConnectionManager SCPD unavailable: {}", e);
            suite.record(TestResult::fail(
                "CM SCPD Retrieval",
                CATEGORY,
                "Could not retrieve ConnectionManager SCPD",
            ));
        }
    }

    let lists = match suite.client.get_protocol_info() {
        Ok(lists) if lists.source.as_deref().map_or(true, str::is_empty) => {
            warn!("GetProtocolInfo response carried no Source list");
            None
        }
        Ok(lists) => Some(lists),
        Err(e) => {
            warn!("GetProtocolInfo failed: {}", e);
            None
        }
    };
    let Some(lists) = lists else {
        suite.record(TestResult::fail(
            "GetProtocolInfo",
            CATEGORY,
            "GetProtocolInfo action failed",
        ));
        return ControlFlow::Continue(());
    };

    let protocols = lists.source_protocols();
    let listed: Vec<&str> = protocols.iter().copied().take(LISTED_PROTOCOLS).collect();
    suite.record(
        TestResult::pass(
            "GetProtocolInfo",
            CATEGORY,
            format!("Source protocols: {} defined", protocols.len()),
        )
        .with_details(json!({
            "source_protocols": listed,
            "total_count": protocols.len(),
        })),
    );

    let http_get = protocols
        .iter()
        .any(|p| p.to_ascii_lowercase().contains("http-get"));
    suite.record(if http_get {
        TestResult::pass("HTTP Streaming Protocol", CATEGORY, "http-get protocol supported")
    } else {
        TestResult::warn(
            "HTTP Streaming Protocol",
            CATEGORY,
            "http-get protocol not advertised",
        )
    });

    ControlFlow::Continue(())
}
