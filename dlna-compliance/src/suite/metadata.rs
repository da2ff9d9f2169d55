//! Completeness and well-formedness checks over the browsed items

use super::ComplianceSuite;
use crate::result::{coverage_status, proportion_status, TestCategory, TestResult, TestStatus};
use dlna_client::MediaItem;
use dlna_parser::{ProtocolInfo, Resource};
use serde_json::json;
use std::collections::BTreeSet;
use std::ops::ControlFlow;

const CATEGORY: TestCategory = TestCategory::Metadata;

/// How many offending values a result lists in its details
const LISTED_VALUES: usize = 5;

const REPLACEMENT_CHARACTER: char = '\u{FFFD}';

pub(super) fn run(suite: &mut ComplianceSuite) -> ControlFlow<()> {
    suite.narrate("Testing metadata compliance...");

    if suite.items.is_empty() {
        suite.record(TestResult::skip(
            "Metadata Availability",
            CATEGORY,
            "No items available for metadata testing",
        ));
        return ControlFlow::Continue(());
    }

    let results = metadata_checks(&suite.items);
    suite.record_all(results);
    ControlFlow::Continue(())
}

/// Every metadata check over a non-empty item collection
pub(crate) fn metadata_checks(items: &[MediaItem]) -> Vec<TestResult> {
    let containers: Vec<&MediaItem> = items.iter().filter(|i| i.is_container).collect();
    let leaves: Vec<&MediaItem> = items.iter().filter(|i| !i.is_container).collect();
    let resources: Vec<&Resource> = leaves.iter().flat_map(|i| i.resources.iter()).collect();

    let mut results = identity_checks(items);

    if !containers.is_empty() {
        let total = containers.len();
        let with = containers.iter().filter(|c| c.child_count.is_some()).count();
        results.push(if with == total {
            TestResult::pass(
                "Container childCount",
                CATEGORY,
                format!("All {} containers have childCount", total),
            )
        } else {
            TestResult::warn(
                "Container childCount",
                CATEGORY,
                format!("{}/{} containers missing childCount", total - with, total),
            )
        });
    }

    if !leaves.is_empty() {
        let total = leaves.len();
        let with = leaves.iter().filter(|i| !i.resources.is_empty()).count();
        let message = match proportion_status(with, total) {
            TestStatus::Pass => format!("All {} media items have resources", total),
            TestStatus::Warn => format!("{}/{} media items missing resources", total - with, total),
            _ => "No media items have resources defined".to_string(),
        };
        results.push(TestResult::new(
            "Media Resources",
            CATEGORY,
            proportion_status(with, total),
            message,
        ));
    }

    results.extend(resource_checks(&leaves, &resources));
    results.extend(class_format_check(items));
    results.extend(encoding_checks(items));
    results.extend(dlna_flags_check(&resources));
    results
}

fn identity_checks(items: &[MediaItem]) -> Vec<TestResult> {
    let total = items.len();
    let with_id = items.iter().filter(|i| !i.id.is_empty()).count();
    let with_title = items.iter().filter(|i| !i.title.is_empty()).count();
    let with_class = items.iter().filter(|i| !i.item_class.is_empty()).count();

    vec![
        if with_id == total {
            TestResult::pass("Item IDs", CATEGORY, format!("All {} items have IDs", total))
        } else {
            TestResult::fail(
                "Item IDs",
                CATEGORY,
                format!("{}/{} items missing IDs", total - with_id, total),
            )
        },
        if with_title == total {
            TestResult::pass("Item Titles", CATEGORY, format!("All {} items have titles", total))
        } else {
            TestResult::warn(
                "Item Titles",
                CATEGORY,
                format!("{}/{} items missing titles", total - with_title, total),
            )
        },
        if with_class == total {
            TestResult::pass(
                "Item Classes",
                CATEGORY,
                format!("All {} items have UPnP classes", total),
            )
        } else {
            TestResult::warn(
                "Item Classes",
                CATEGORY,
                format!("{}/{} items missing UPnP class", total - with_class, total),
            )
        },
    ]
}

/// protocolInfo, duration, size and per-media-type attribute coverage
fn resource_checks(leaves: &[&MediaItem], resources: &[&Resource]) -> Vec<TestResult> {
    let mut results = Vec::new();
    if resources.is_empty() {
        return results;
    }

    let total = resources.len();
    let with_info = resources.iter().filter(|r| r.protocol_info.is_some()).count();
    results.push(if with_info == total {
        TestResult::pass(
            "Resource protocolInfo",
            CATEGORY,
            format!("All {} resources have protocolInfo", total),
        )
    } else {
        TestResult::warn(
            "Resource protocolInfo",
            CATEGORY,
            format!("{}/{} resources missing protocolInfo", total - with_info, total),
        )
    });

    let timed: Vec<&Resource> = leaves
        .iter()
        .filter(|i| i.is_audio() || i.is_video())
        .flat_map(|i| i.resources.iter())
        .collect();
    if !timed.is_empty() {
        let total = timed.len();
        let with = timed.iter().filter(|r| r.duration.is_some()).count();
        let status = proportion_status(with, total);
        let message = match status {
            TestStatus::Pass => format!("All {} audio/video resources have duration", total),
            TestStatus::Warn => format!("{}/{} audio/video resources missing duration", total - with, total),
            _ => format!("None of {} audio/video resources have duration", total),
        };
        results.push(TestResult::new("Resource Duration", CATEGORY, status, message));
    }

    let with_size = resources.iter().filter(|r| r.size.is_some()).count();
    let message = if with_size == total {
        format!("All {} resources have size", total)
    } else {
        format!("{}/{} resources missing size (recommended)", total - with_size, total)
    };
    results.push(
        TestResult::new("Resource Size", CATEGORY, coverage_status(with_size, total), message)
            .with_weight(0.5),
    );

    let audio: Vec<&Resource> = leaves
        .iter()
        .filter(|i| i.is_audio())
        .flat_map(|i| i.resources.iter())
        .collect();
    if !audio.is_empty() {
        let with_quality = audio
            .iter()
            .filter(|r| r.bitrate.is_some() || r.sample_frequency.is_some())
            .count();
        results.push(if with_quality > 0 {
            TestResult::pass(
                "Audio Quality Info",
                CATEGORY,
                format!(
                    "{}/{} audio resources declare bitrate or sampleFrequency",
                    with_quality,
                    audio.len()
                ),
            )
        } else {
            TestResult::warn(
                "Audio Quality Info",
                CATEGORY,
                "No audio resources declare bitrate or sampleFrequency",
            )
        });
    }

    let video: Vec<&Resource> = leaves
        .iter()
        .filter(|i| i.is_video())
        .flat_map(|i| i.resources.iter())
        .collect();
    if !video.is_empty() {
        let total = video.len();
        let with = video.iter().filter(|r| r.resolution.is_some()).count();
        let message = if with == total {
            format!("All {} video resources have resolution", total)
        } else {
            format!("{}/{} video resources missing resolution", total - with, total)
        };
        results.push(TestResult::new(
            "Video Resolution",
            CATEGORY,
            coverage_status(with, total),
            message,
        ));
    }

    results
}

fn class_format_check(items: &[MediaItem]) -> Option<TestResult> {
    let classes: BTreeSet<&str> = items
        .iter()
        .map(|i| i.item_class.as_str())
        .filter(|c| !c.is_empty())
        .collect();
    if classes.is_empty() {
        return None;
    }

    let (valid, invalid): (Vec<&str>, Vec<&str>) =
        classes.into_iter().partition(|c| c.starts_with("object."));

    Some(if invalid.is_empty() {
        let shown: Vec<&str> = valid.iter().copied().take(LISTED_VALUES).collect();
        TestResult::pass(
            "UPnP Class Format",
            CATEGORY,
            format!("All classes follow object.* format: {}", shown.join(", ")),
        )
    } else {
        TestResult::warn(
            "UPnP Class Format",
            CATEGORY,
            "Some classes don't follow object.* format",
        )
        .with_details(json!({ "valid": valid, "invalid": invalid }))
    })
}

/// Replacement characters point at a server that mangled its text encoding
fn encoding_checks(items: &[MediaItem]) -> Vec<TestResult> {
    let mut results = Vec::new();
    let titles: Vec<&str> = items
        .iter()
        .map(|i| i.title.as_str())
        .filter(|t| !t.is_empty())
        .collect();
    if titles.is_empty() {
        return results;
    }

    let corrupted: Vec<&str> = titles
        .iter()
        .copied()
        .filter(|t| t.contains(REPLACEMENT_CHARACTER))
        .collect();
    results.push(if corrupted.is_empty() {
        TestResult::pass(
            "Title Encoding",
            CATEGORY,
            format!("No encoding corruption in {} titles", titles.len()),
        )
    } else {
        let listed: Vec<&str> = corrupted.iter().copied().take(LISTED_VALUES).collect();
        TestResult::warn(
            "Title Encoding",
            CATEGORY,
            format!(
                "{} titles contain the Unicode replacement character",
                corrupted.len()
            ),
        )
        .with_details(json!({ "titles": listed }))
    });

    let special = titles
        .iter()
        .filter(|t| t.chars().any(|c| matches!(c, '&' | '<' | '>' | '"' | '\'') || !c.is_ascii()))
        .count();
    if special > 0 {
        results.push(
            TestResult::pass(
                "Special Characters",
                CATEGORY,
                format!(
                    "{} titles with XML metacharacters or non-ASCII text parsed intact",
                    special
                ),
            )
            .with_weight(0.5),
        );
    }

    results
}

/// DLNA.ORG parameters of every resource protocolInfo
fn dlna_flags_check(resources: &[&Resource]) -> Option<TestResult> {
    let infos: Vec<&str> = resources
        .iter()
        .filter_map(|r| r.protocol_info.as_deref())
        .collect();
    if infos.is_empty() {
        return None;
    }

    let params: Vec<_> = infos
        .iter()
        .filter_map(|info| ProtocolInfo::parse(info))
        .map(|info| info.dlna_parameters())
        .collect();

    let malformed: Vec<&str> = params
        .iter()
        .filter(|p| p.flags_valid() == Some(false))
        .filter_map(|p| p.flags.as_deref())
        .collect();
    if !malformed.is_empty() {
        let listed: Vec<&str> = malformed.iter().copied().take(LISTED_VALUES).collect();
        return Some(
            TestResult::warn(
                "DLNA Flags",
                CATEGORY,
                format!(
                    "{} DLNA.ORG_FLAGS values are not 32 hex digits",
                    malformed.len()
                ),
            )
            .with_details(json!({ "malformed": listed })),
        );
    }

    if !params.iter().any(|p| p.has_any()) {
        return Some(
            TestResult::warn(
                "DLNA Flags",
                CATEGORY,
                "No DLNA.ORG parameters found in protocolInfo",
            )
            .with_weight(0.5),
        );
    }

    let profiles = params.iter().filter(|p| p.profile.is_some()).count();
    let operations = params.iter().filter(|p| p.operations.is_some()).count();
    let flags = params.iter().filter(|p| p.flags.is_some()).count();
    Some(
        TestResult::pass(
            "DLNA Flags",
            CATEGORY,
            format!(
                "DLNA parameters well-formed (PN: {}, OP: {}, FLAGS: {})",
                profiles, operations, flags
            ),
        )
        .with_details(json!({
            "pn_count": profiles,
            "op_count": operations,
            "flags_count": flags,
        })),
    )
}
