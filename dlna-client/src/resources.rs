//! Media resource checks: HEAD headers, ranged GET and concurrent access.

use crate::error::{ClientError, Result};
use crate::http::{build_client, header};
use crate::MediaServerClient;
use serde::Serialize;
use std::io::Read;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Range requested by [`MediaServerClient::fetch_resource`]
pub const SAMPLE_RANGE: &str = "bytes=0-1023";

/// Range requested by each client of [`MediaServerClient::concurrent_access`]
pub const CONCURRENT_RANGE: &str = "bytes=0-4095";

/// Number of error strings kept in a [`ConcurrentAccessReport`]
const MAX_REPORTED_ERRORS: usize = 3;

/// What a HEAD request revealed about a resource
///
/// Headers are only recorded when the server answered 200.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ResourceHeaders {
    pub accessible: bool,
    pub status: Option<u16>,
    pub content_type: Option<String>,
    pub content_length: Option<String>,
    pub accept_ranges: Option<String>,
    pub transfer_mode: Option<String>,
}

/// Outcome of a ranged GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeFetch {
    pub status: u16,
    pub content: Vec<u8>,
    pub content_type: Option<String>,
}

/// Aggregate of simultaneous ranged GETs from independent clients
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ConcurrentAccessReport {
    pub requested: usize,
    pub successes: usize,
    pub failures: usize,
    /// Elapsed time of every request, successful or not, in completion order of the join
    pub latencies_ms: Vec<u64>,
    /// Mean latency of the successful requests, 0 when none succeeded
    pub average_latency_ms: f64,
    /// First few failure descriptions
    pub errors: Vec<String>,
}

struct AccessOutcome {
    elapsed_ms: u64,
    error: Option<String>,
}

impl MediaServerClient {
    /// HEAD a resource, following redirects
    ///
    /// Never fails: a transport error is reported as an inaccessible resource.
    pub fn check_resource_headers(&self, url: &str) -> ResourceHeaders {
        let response = match self.http().head(url) {
            Ok(response) => response,
            Err(e) => {
                debug!("HEAD {} failed: {}", url, e);
                return ResourceHeaders::default();
            }
        };

        let status = response.status().as_u16();
        if status != 200 {
            return ResourceHeaders {
                status: Some(status),
                ..ResourceHeaders::default()
            };
        }

        ResourceHeaders {
            accessible: true,
            status: Some(status),
            content_type: header(&response, "content-type"),
            content_length: header(&response, "content-length"),
            accept_ranges: header(&response, "accept-ranges"),
            transfer_mode: header(&response, "transferMode.dlna.org"),
        }
    }

    /// GET the first kilobyte of a resource; 200 and 206 both count as success
    pub fn fetch_resource(&self, url: &str) -> Result<RangeFetch> {
        let response = self.http().get_range(url, SAMPLE_RANGE)?;
        let status = response.status().as_u16();
        if status != 200 && status != 206 {
            return Err(ClientError::Status(status));
        }

        let content_type = header(&response, "content-type");
        let mut content = Vec::new();
        response
            .take(1024)
            .read_to_end(&mut content)
            .map_err(|e| ClientError::Network(format!("Failed to read resource body: {}", e)))?;

        Ok(RangeFetch {
            status,
            content,
            content_type,
        })
    }

    /// Issue one ranged GET per URL at the same time, each from its own client
    ///
    /// All requests are joined before the report is built.
    pub fn concurrent_access(&self, urls: &[String]) -> ConcurrentAccessReport {
        let timeout = self.timeout();
        let targets: Vec<String> = urls.iter().map(|u| self.http().url(u)).collect();

        let outcomes: Vec<AccessOutcome> = thread::scope(|scope| {
            let handles: Vec<_> = targets
                .iter()
                .map(|url| scope.spawn(move || timed_range_get(url, timeout)))
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|_| AccessOutcome {
                        elapsed_ms: 0,
                        error: Some("request thread panicked".to_string()),
                    })
                })
                .collect()
        });

        summarize(outcomes)
    }
}

fn timed_range_get(url: &str, timeout: Duration) -> AccessOutcome {
    let start = Instant::now();
    let result = build_client(timeout).and_then(|client| {
        let response = client
            .get(url)
            .header(reqwest::header::RANGE, CONCURRENT_RANGE)
            .send()?;
        let status = response.status().as_u16();
        if status == 200 || status == 206 {
            // drain the requested range so the timing covers the transfer
            let mut sink = Vec::new();
            response
                .take(4096)
                .read_to_end(&mut sink)
                .map_err(|e| ClientError::Network(e.to_string()))?;
            Ok(())
        } else {
            Err(ClientError::Status(status))
        }
    });

    AccessOutcome {
        elapsed_ms: start.elapsed().as_millis() as u64,
        error: result.err().map(|e| format!("{}: {}", url, e)),
    }
}

fn summarize(outcomes: Vec<AccessOutcome>) -> ConcurrentAccessReport {
    let mut report = ConcurrentAccessReport {
        requested: outcomes.len(),
        ..ConcurrentAccessReport::default()
    };

    let mut success_total_ms = 0u64;
    for outcome in outcomes {
        report.latencies_ms.push(outcome.elapsed_ms);
        match outcome.error {
            None => {
                report.successes += 1;
                success_total_ms += outcome.elapsed_ms;
            }
            Some(error) => {
                report.failures += 1;
                if report.errors.len() < MAX_REPORTED_ERRORS {
                    report.errors.push(error);
                }
            }
        }
    }

    if report.successes > 0 {
        report.average_latency_ms = success_total_ms as f64 / report.successes as f64;
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(elapsed_ms: u64, error: Option<&str>) -> AccessOutcome {
        AccessOutcome {
            elapsed_ms,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_summarize_averages_successes_only() {
        let report = summarize(vec![
            outcome(10, None),
            outcome(500, Some("a")),
            outcome(30, None),
            outcome(7, Some("b")),
            outcome(9, Some("c")),
            outcome(8, Some("d")),
        ]);

        assert_eq!(report.requested, 6);
        assert_eq!(report.successes, 2);
        assert_eq!(report.failures, 4);
        assert_eq!(report.average_latency_ms, 20.0);
        assert_eq!(report.errors, vec!["a", "b", "c"]);
        assert_eq!(report.latencies_ms.len(), 6);
    }

    #[test]
    fn test_summarize_no_success() {
        let report = summarize(vec![outcome(5, Some("refused"))]);
        assert_eq!(report.average_latency_ms, 0.0);
        assert_eq!(report.successes, 0);
    }
}
