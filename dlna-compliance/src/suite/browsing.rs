use super::ComplianceSuite;
use crate::result::{TestCategory, TestResult};
use crate::traversal::{traverse, NavigationEvent, TraversalMode, TraversalReport};
use dlna_client::{BrowseRequest, BrowseResult, ClientError, ServiceKind};
use serde_json::json;
use std::ops::ControlFlow;
use tracing::warn;

const CATEGORY: TestCategory = TestCategory::Browsing;

pub(super) fn run(suite: &mut ComplianceSuite) -> ControlFlow<()> {
    suite.narrate("Testing browsing functionality...");

    if suite.client.service(ServiceKind::ContentDirectory).is_none() {
        suite.record(TestResult::skip(
            "Browse Root",
            CATEGORY,
            "ContentDirectory not available",
        ));
        return ControlFlow::Continue(());
    }

    let root = match suite.client.browse(&BrowseRequest::children("0")) {
        Ok(root) => root,
        Err(e) => {
            warn!("Root browse failed: {}", e);
            suite.record(
                TestResult::fail(
                    "Browse Root",
                    CATEGORY,
                    "Browse action failed for root container",
                )
                .with_weight(2.0),
            );
            return ControlFlow::Continue(());
        }
    };

    suite.record(
        TestResult::pass(
            "Browse Root",
            CATEGORY,
            format!(
                "Root browse returned {} items, {} total",
                root.number_returned, root.total_matches
            ),
        )
        .with_details(json!({
            "items": root.items.len(),
            "num_returned": root.number_returned,
            "total_matches": root.total_matches,
        }))
        .with_weight(2.0),
    );

    let metadata = suite.client.browse(&BrowseRequest::metadata("0"));
    suite.record(match metadata {
        Ok(_) => TestResult::pass("Browse Metadata", CATEGORY, "BrowseMetadata for root successful"),
        Err(_) => TestResult::fail("Browse Metadata", CATEGORY, "BrowseMetadata for root failed"),
    });

    if root.total_matches > 1 {
        let first = suite.client.browse(&BrowseRequest::children("0").page(0, 1));
        suite.record(pagination_result(&first));

        if root.total_matches > 2 {
            let second = suite.client.browse(&BrowseRequest::children("0").page(1, 1));
            suite.record(offset_result(&first, &second));
        }
    }

    let mode = suite.config.traversal_mode();
    if let TraversalMode::FullScan { max_items } = mode {
        suite.narrate(format!("Scanning the library (up to {} items)...", max_items));
    }

    let report = traverse(&suite.client, mode, &root);
    let navigation = navigation_results(mode, &root, &report);
    suite.record_all(navigation);
    suite.items = report.items;

    ControlFlow::Continue(())
}

fn pagination_result(first: &Result<BrowseResult, ClientError>) -> TestResult {
    match first {
        Ok(page) if page.number_returned == 1 => TestResult::pass(
            "Pagination Support",
            CATEGORY,
            "Pagination (RequestedCount) works correctly",
        ),
        _ => TestResult::warn(
            "Pagination Support",
            CATEGORY,
            "Pagination may not work correctly",
        ),
    }
}

/// Compare the first items returned at StartingIndex 0 and 1
fn offset_result(
    first: &Result<BrowseResult, ClientError>,
    second: &Result<BrowseResult, ClientError>,
) -> TestResult {
    let first_id = |page: &Result<BrowseResult, ClientError>| {
        page.as_ref()
            .ok()
            .and_then(|p| p.items.first())
            .map(|item| item.id.clone())
    };

    match (first_id(first), first_id(second)) {
        (Some(a), Some(b)) if a == b => TestResult::fail(
            "StartingIndex Offset",
            CATEGORY,
            format!("StartingIndex ignored: index 1 returned the same item as index 0 ({})", a),
        )
        .with_details(json!({ "first_id": a, "second_id": b })),
        (Some(a), Some(b)) => TestResult::pass(
            "StartingIndex Offset",
            CATEGORY,
            "StartingIndex offset returns the following item",
        )
        .with_details(json!({ "first_id": a, "second_id": b })),
        _ => TestResult::warn(
            "StartingIndex Offset",
            CATEGORY,
            "Could not compare pages at StartingIndex 0 and 1",
        ),
    }
}

fn navigation_results(
    mode: TraversalMode,
    root: &BrowseResult,
    report: &TraversalReport,
) -> Vec<TestResult> {
    match mode {
        TraversalMode::Sample => {
            if !root.items.iter().any(|i| i.is_container) {
                return vec![TestResult::warn(
                    "Container Navigation",
                    CATEGORY,
                    "No containers found in root to test navigation",
                )];
            }

            report
                .navigation
                .iter()
                .map(|event| match event {
                    NavigationEvent::Entered {
                        title,
                        number_returned,
                        ..
                    } => TestResult::pass(
                        "Container Navigation",
                        CATEGORY,
                        format!(
                            "Successfully browsed container '{}' ({} items)",
                            title, number_returned
                        ),
                    ),
                    NavigationEvent::Failed {
                        id, title, depth, ..
                    } => TestResult::fail(
                        "Container Navigation",
                        CATEGORY,
                        format!("Failed to browse container '{}' (ID: {})", title, id),
                    )
                    .with_details(json!({ "depth": depth })),
                })
                .collect()
        }
        TraversalMode::FullScan { max_items } => {
            let details = json!({
                "items": report.items.len(),
                "containers": report.container_count(),
                "media_items": report.leaf_count(),
                "containers_browsed": report.containers_browsed,
                "failed_containers": report.containers_failed,
                "failed_browses": report.failures.len(),
                "budget_exhausted": report.budget_exhausted,
                "max_items": max_items,
            });

            let result = if report.containers_browsed > 0
                && report.containers_failed >= report.containers_browsed
            {
                TestResult::warn(
                    "Full Library Scan",
                    CATEGORY,
                    format!("All {} container browses failed", report.containers_browsed),
                )
            } else {
                let mut message = format!(
                    "Scanned {} containers, collected {} items",
                    report.containers_browsed,
                    report.items.len()
                );
                if report.budget_exhausted {
                    message.push_str(&format!(" (stopped at the {} item budget)", max_items));
                }
                TestResult::pass("Full Library Scan", CATEGORY, message)
            };

            vec![result.with_details(details)]
        }
    }
}
