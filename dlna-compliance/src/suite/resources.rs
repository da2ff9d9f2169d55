use super::ComplianceSuite;
use crate::result::{proportion_status, TestCategory, TestResult, TestStatus};
use dlna_client::{ConcurrentAccessReport, MediaItem};
use serde_json::json;
use std::ops::ControlFlow;
use tracing::debug;

const CATEGORY: TestCategory = TestCategory::MediaResources;

/// Items whose first resource is checked, and clients in the concurrent test
const SAMPLE_SIZE: usize = 5;

pub(super) fn run(suite: &mut ComplianceSuite) -> ControlFlow<()> {
    suite.narrate("Testing media resource accessibility...");

    let sample = sample_urls(&suite.items);
    if sample.is_empty() {
        suite.record(TestResult::skip(
            "Resource Accessibility",
            CATEGORY,
            "No media items with resources available for testing",
        ));
        return ControlFlow::Continue(());
    }

    let accessible = sample
        .iter()
        .filter(|url| {
            let headers = suite.client.check_resource_headers(url);
            debug!("HEAD {}: {:?}", url, headers.status);
            headers.accessible
        })
        .count();
    suite.record(accessibility_result(accessible, sample.len()));

    let range = match suite.client.fetch_resource(&sample[0]) {
        Ok(fetch) => TestResult::pass(
            "Range Request Support",
            CATEGORY,
            "Server supports partial content requests",
        )
        .with_details(json!({ "status": fetch.status, "bytes": fetch.content.len() })),
        Err(e) => {
            debug!("Range request against {} failed: {}", sample[0], e);
            TestResult::warn(
                "Range Request Support",
                CATEGORY,
                "Server may not support range requests (seeking might not work)",
            )
        }
    };
    suite.record(range);

    let distinct = distinct_urls(&suite.items);
    if distinct.len() < 2 {
        suite.record(
            TestResult::skip(
                "Concurrent Access",
                CATEGORY,
                "Fewer than 2 distinct resource URLs available",
            )
            .with_weight(1.5),
        );
        return ControlFlow::Continue(());
    }

    suite.narrate(format!("Simulating {} concurrent clients...", distinct.len()));
    let report = suite.client.concurrent_access(&distinct);
    suite.record(concurrency_result(&report));

    ControlFlow::Continue(())
}

/// First resource URL of the first few leaf items that have resources
fn sample_urls(items: &[MediaItem]) -> Vec<String> {
    items
        .iter()
        .filter(|i| !i.is_container && !i.resources.is_empty())
        .take(SAMPLE_SIZE)
        .filter_map(|i| i.first_resource_url())
        .map(str::to_string)
        .collect()
}

/// Up to five different first-resource URLs across all leaf items
fn distinct_urls(items: &[MediaItem]) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for url in items
        .iter()
        .filter(|i| !i.is_container)
        .filter_map(|i| i.first_resource_url())
    {
        if urls.len() == SAMPLE_SIZE {
            break;
        }
        if !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }
    urls
}

fn accessibility_result(accessible: usize, tested: usize) -> TestResult {
    let status = proportion_status(accessible, tested);
    let message = match status {
        TestStatus::Pass => format!("All {} tested resources are accessible", tested),
        TestStatus::Warn => format!("{}/{} tested resources are accessible", accessible, tested),
        _ => format!("None of {} tested resources are accessible", tested),
    };
    TestResult::new("Resource Accessibility", CATEGORY, status, message)
        .with_details(json!({ "accessible": accessible, "tested": tested }))
        .with_weight(1.5)
}

fn concurrency_result(report: &ConcurrentAccessReport) -> TestResult {
    let status = proportion_status(report.successes, report.requested);
    let message = match status {
        TestStatus::Pass => format!(
            "All {} concurrent requests succeeded (avg {:.0} ms)",
            report.requested, report.average_latency_ms
        ),
        TestStatus::Warn => format!(
            "{}/{} concurrent requests succeeded (avg {:.0} ms)",
            report.successes, report.requested, report.average_latency_ms
        ),
        _ => format!("All {} concurrent requests failed", report.requested),
    };

    TestResult::new("Concurrent Access", CATEGORY, status, message)
        .with_details(json!({
            "requested": report.requested,
            "successes": report.successes,
            "failures": report.failures,
            "average_latency_ms": report.average_latency_ms,
            "latencies_ms": report.latencies_ms,
            "errors": report.errors,
        }))
        .with_weight(1.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlna_parser::{MediaMetadata, Resource};

    fn leaf(id: &str, url: Option<&str>) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            parent_id: "0".to_string(),
            title: id.to_string(),
            item_class: "object.item.audioItem".to_string(),
            restricted: true,
            is_container: false,
            child_count: None,
            resources: url
                .map(|u| Resource {
                    url: Some(u.to_string()),
                    ..Resource::default()
                })
                .into_iter()
                .collect(),
            metadata: MediaMetadata::default(),
        }
    }

    #[test]
    fn test_distinct_urls_deduplicates_and_caps() {
        let mut items = vec![leaf("a", Some("/a.mp3")), leaf("b", Some("/a.mp3")), leaf("c", None)];
        items.extend((0..10).map(|i| leaf(&format!("x{}", i), Some(&format!("/x{}.mp3", i)))));

        let urls = distinct_urls(&items);
        assert_eq!(urls.len(), 5);
        assert_eq!(urls[0], "/a.mp3");
        assert_eq!(urls[1], "/x0.mp3");
    }

    #[test]
    fn test_sample_skips_items_without_resources() {
        let items = vec![leaf("a", None), leaf("b", Some("/b.mp3"))];
        assert_eq!(sample_urls(&items), vec!["/b.mp3".to_string()]);
    }

    #[test]
    fn test_accessibility_proportions() {
        assert_eq!(accessibility_result(5, 5).status, TestStatus::Pass);
        assert_eq!(accessibility_result(2, 5).message, "2/5 tested resources are accessible");
        assert_eq!(accessibility_result(0, 3).status, TestStatus::Fail);
    }

    #[test]
    fn test_concurrency_result() {
        let report = ConcurrentAccessReport {
            requested: 3,
            successes: 2,
            failures: 1,
            latencies_ms: vec![10, 20, 5000],
            average_latency_ms: 15.0,
            errors: vec!["HTTP status 503".to_string()],
        };

        let result = concurrency_result(&report);
        assert_eq!(result.status, TestStatus::Warn);
        assert_eq!(result.weight, 1.5);
        assert_eq!(result.message, "2/3 concurrent requests succeeded (avg 15 ms)");
    }
}
