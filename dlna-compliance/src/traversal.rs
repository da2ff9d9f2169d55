//! Bounded traversal of the ContentDirectory tree
//!
//! The traversal starts from the root listing the suite already fetched and
//! walks containers depth-first. Sample mode follows only the first container
//! at each level, three levels deep. Full-scan mode visits every container up
//! to ten levels deep and pages through each one, under a global item budget.
//!
//! Nodes are never deduplicated. A server whose containers loop back on
//! themselves is bounded by the depth limit and the item budget, not by cycle
//! detection.

use dlna_client::{BrowseRequest, BrowseResult, ClientError, MediaItem, MediaServerClient};
use serde::Serialize;
use tracing::{debug, warn};

/// Depth limit of sample mode
pub const SAMPLE_MAX_DEPTH: u32 = 3;

/// Depth limit of full-scan mode
pub const FULL_SCAN_MAX_DEPTH: u32 = 10;

/// Page size of every Browse issued by the traversal
pub const PAGE_SIZE: u32 = 100;

/// Source of directory listings
///
/// Implemented by the client session; tests substitute in-memory trees.
pub trait ContentBrowser {
    fn browse(&self, request: &BrowseRequest) -> Result<BrowseResult, ClientError>;
}

impl ContentBrowser for MediaServerClient {
    fn browse(&self, request: &BrowseRequest) -> Result<BrowseResult, ClientError> {
        MediaServerClient::browse(self, request)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalMode {
    /// First container of each level only, one page per container
    Sample,
    /// Every container, every page, until `max_items` items were collected
    FullScan { max_items: usize },
}

impl TraversalMode {
    pub fn max_depth(&self) -> u32 {
        match self {
            TraversalMode::Sample => SAMPLE_MAX_DEPTH,
            TraversalMode::FullScan { .. } => FULL_SCAN_MAX_DEPTH,
        }
    }
}

/// What happened while entering containers in sample mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NavigationEvent {
    /// A first-level container was listed
    Entered {
        id: String,
        title: String,
        number_returned: u32,
    },
    /// Listing a container failed, at any depth
    Failed {
        id: String,
        title: String,
        depth: u32,
        error: String,
    },
}

/// A Browse that failed during traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedBrowse {
    pub id: String,
    pub title: String,
    pub depth: u32,
    pub error: String,
}

/// Everything a traversal collected
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TraversalReport {
    /// Root listing first, then every listed page in visiting order
    pub items: Vec<MediaItem>,
    pub root_returned: u32,
    pub root_total: u32,
    /// Containers whose listing was requested below the root
    pub containers_browsed: usize,
    /// Browsed containers whose first page could not be listed
    pub containers_failed: usize,
    /// Every failed request, including later pages and root remainder pages
    pub failures: Vec<FailedBrowse>,
    pub budget_exhausted: bool,
    pub navigation: Vec<NavigationEvent>,
}

impl TraversalReport {
    pub fn container_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_container).count()
    }

    pub fn leaf_count(&self) -> usize {
        self.items.iter().filter(|i| !i.is_container).count()
    }
}

/// Walk the tree below an already fetched root listing
pub fn traverse<B: ContentBrowser + ?Sized>(
    browser: &B,
    mode: TraversalMode,
    root: &BrowseResult,
) -> TraversalReport {
    let mut walk = Walk {
        browser,
        mode,
        report: TraversalReport {
            root_returned: root.number_returned,
            root_total: root.total_matches,
            ..TraversalReport::default()
        },
    };
    walk.run(root);
    walk.report
}

/// Traversal state threaded through the recursion
struct Walk<'a, B: ?Sized> {
    browser: &'a B,
    mode: TraversalMode,
    report: TraversalReport,
}

impl<'a, B: ContentBrowser + ?Sized> Walk<'a, B> {
    fn run(&mut self, root: &BrowseResult) {
        self.report.items.extend(root.items.iter().cloned());

        match self.mode {
            TraversalMode::Sample => {
                if let Some(first) = root.items.iter().find(|i| i.is_container) {
                    self.sample(first, 1);
                }
            }
            TraversalMode::FullScan { .. } => {
                let mut containers: Vec<MediaItem> =
                    root.items.iter().filter(|i| i.is_container).cloned().collect();

                // remaining root pages
                let advance = page_advance(root);
                if advance > 0 && root.total_matches > advance {
                    let root_item = MediaItem {
                        id: "0".to_string(),
                        parent_id: "-1".to_string(),
                        title: "root".to_string(),
                        item_class: String::new(),
                        restricted: true,
                        is_container: true,
                        child_count: None,
                        resources: Vec::new(),
                        metadata: Default::default(),
                    };
                    if let Some(more) = self.list_pages(&root_item, 0, advance) {
                        containers.extend(more);
                    }
                }

                for container in &containers {
                    self.full_scan(container, 1);
                }
            }
        }
    }

    fn sample(&mut self, container: &MediaItem, depth: u32) {
        if depth > self.mode.max_depth() {
            return;
        }

        self.report.containers_browsed += 1;
        let request = BrowseRequest::children(container.id.as_str()).page(0, PAGE_SIZE);
        match self.browser.browse(&request) {
            Ok(page) => {
                debug!(
                    "Sampled '{}' at depth {}: {} items",
                    container.title,
                    depth,
                    page.items.len()
                );
                if depth == 1 {
                    self.report.navigation.push(NavigationEvent::Entered {
                        id: container.id.clone(),
                        title: container.title.clone(),
                        number_returned: page.number_returned,
                    });
                }

                let next = page.items.iter().find(|i| i.is_container).cloned();
                self.report.items.extend(page.items);

                if let Some(next) = next {
                    if depth < self.mode.max_depth() {
                        self.sample(&next, depth + 1);
                    }
                }
            }
            Err(e) => {
                warn!("Failed to browse container '{}' ({}): {}", container.title, container.id, e);
                self.report.containers_failed += 1;
                self.record_failure(container, depth, &e);
                self.report.navigation.push(NavigationEvent::Failed {
                    id: container.id.clone(),
                    title: container.title.clone(),
                    depth,
                    error: e.to_string(),
                });
            }
        }
    }

    fn full_scan(&mut self, container: &MediaItem, depth: u32) {
        if depth > self.mode.max_depth() || self.over_budget() {
            return;
        }

        self.report.containers_browsed += 1;
        let Some(children) = self.list_pages(container, depth, 0) else {
            self.report.containers_failed += 1;
            return;
        };

        for child in &children {
            if self.over_budget() {
                return;
            }
            self.full_scan(child, depth + 1);
        }
    }

    /// Page through a container from `start`, returning the containers found
    ///
    /// `None` when the first requested page failed. Later page failures stop
    /// the paging but keep what was collected.
    fn list_pages(&mut self, container: &MediaItem, depth: u32, start: u32) -> Option<Vec<MediaItem>> {
        let mut containers = Vec::new();
        let mut index = start;

        loop {
            if self.over_budget() {
                break;
            }

            let request = BrowseRequest::children(container.id.as_str()).page(index, PAGE_SIZE);
            let page = match self.browser.browse(&request) {
                Ok(page) => page,
                Err(e) => {
                    debug!("Skipping container '{}' ({}): {}", container.title, container.id, e);
                    self.record_failure(container, depth, &e);
                    if index == start {
                        return None;
                    }
                    break;
                }
            };

            let advance = page_advance(&page);
            containers.extend(page.items.iter().filter(|i| i.is_container).cloned());
            self.report.items.extend(page.items);

            index = index.saturating_add(advance);
            if advance == 0 || index >= page.total_matches {
                break;
            }
        }

        Some(containers)
    }

    fn over_budget(&mut self) -> bool {
        let TraversalMode::FullScan { max_items } = self.mode else {
            return false;
        };
        if self.report.items.len() >= max_items {
            if !self.report.budget_exhausted {
                debug!("Item budget of {} reached, traversal stops", max_items);
            }
            self.report.budget_exhausted = true;
        }
        self.report.budget_exhausted
    }

    fn record_failure(&mut self, container: &MediaItem, depth: u32, error: &ClientError) {
        self.report.failures.push(FailedBrowse {
            id: container.id.clone(),
            title: container.title.clone(),
            depth,
            error: error.to_string(),
        });
    }
}

/// Items a page moved the index by; the counter if the server sent one
fn page_advance(page: &BrowseResult) -> u32 {
    if page.number_returned > 0 {
        page.number_returned
    } else {
        page.items.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlna_parser::MediaMetadata;
    use std::cell::RefCell;
    use std::collections::HashMap;

    fn node(id: &str, is_container: bool) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            parent_id: String::new(),
            title: id.to_string(),
            item_class: if is_container {
                "object.container".to_string()
            } else {
                "object.item".to_string()
            },
            restricted: true,
            is_container,
            child_count: None,
            resources: Vec::new(),
            metadata: MediaMetadata::default(),
        }
    }

    /// In-memory tree; ids missing from the map fail to browse
    struct FakeTree {
        children: HashMap<String, Vec<MediaItem>>,
        calls: RefCell<Vec<(String, u32)>>,
    }

    impl FakeTree {
        fn new(entries: &[(&str, Vec<MediaItem>)]) -> Self {
            Self {
                children: entries
                    .iter()
                    .map(|(id, items)| (id.to_string(), items.clone()))
                    .collect(),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn root(&self) -> BrowseResult {
            self.browse(&BrowseRequest::children("0")).unwrap()
        }
    }

    impl ContentBrowser for FakeTree {
        fn browse(&self, request: &BrowseRequest) -> Result<BrowseResult, ClientError> {
            self.calls
                .borrow_mut()
                .push((request.object_id.clone(), request.starting_index));
            let all = self
                .children
                .get(&request.object_id)
                .ok_or(ClientError::Status(500))?;
            let page: Vec<MediaItem> = all
                .iter()
                .skip(request.starting_index as usize)
                .take(request.requested_count as usize)
                .cloned()
                .collect();
            Ok(BrowseResult {
                number_returned: page.len() as u32,
                total_matches: all.len() as u32,
                items: page,
            })
        }
    }

    /// Container whose only child is itself
    struct SelfLoop;

    impl ContentBrowser for SelfLoop {
        fn browse(&self, request: &BrowseRequest) -> Result<BrowseResult, ClientError> {
            let items = vec![node("loop", true), node(&format!("leaf-{}", request.starting_index), false)];
            Ok(BrowseResult {
                number_returned: 2,
                total_matches: 2,
                items,
            })
        }
    }

    #[test]
    fn test_sample_follows_first_container_three_levels() {
        let tree = FakeTree::new(&[
            ("0", vec![node("a", true), node("b", true), node("song", false)]),
            ("a", vec![node("a1", true), node("a2", true)]),
            ("a1", vec![node("a11", true)]),
            ("a11", vec![node("a111", true)]),
            ("a111", vec![node("deep", false)]),
            ("b", vec![node("b1", false)]),
        ]);
        let root = tree.root();
        tree.calls.borrow_mut().clear();

        let report = traverse(&tree, TraversalMode::Sample, &root);

        let browsed: Vec<String> = tree.calls.borrow().iter().map(|(id, _)| id.clone()).collect();
        assert_eq!(browsed, vec!["a", "a1", "a11"]);
        assert_eq!(report.containers_browsed, 3);
        assert_eq!(report.items.len(), 3 + 2 + 1 + 1);
        assert!(matches!(
            report.navigation.as_slice(),
            [NavigationEvent::Entered { id, .. }] if id == "a"
        ));
    }

    #[test]
    fn test_sample_reports_failure_at_any_depth() {
        let tree = FakeTree::new(&[
            ("0", vec![node("a", true)]),
            ("a", vec![node("broken", true)]),
        ]);
        let root = tree.root();

        let report = traverse(&tree, TraversalMode::Sample, &root);

        assert_eq!(report.navigation.len(), 2);
        assert!(matches!(
            &report.navigation[1],
            NavigationEvent::Failed { id, depth: 2, .. } if id == "broken"
        ));
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn test_full_scan_visits_everything_and_skips_bad_branches() {
        let tree = FakeTree::new(&[
            ("0", vec![node("a", true), node("bad", true), node("b", true)]),
            ("a", vec![node("a1", true), node("x", false)]),
            ("a1", vec![node("y", false)]),
            ("b", vec![node("z", false)]),
        ]);
        let root = tree.root();

        let report = traverse(&tree, TraversalMode::FullScan { max_items: 1000 }, &root);

        let ids: Vec<&str> = report.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "bad", "b", "a1", "x", "y", "z"]);
        assert_eq!(report.containers_browsed, 4);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, "bad");
        assert_eq!(report.containers_failed, 1);
        assert!(!report.budget_exhausted);
        assert!(report.navigation.is_empty());
    }

    #[test]
    fn test_full_scan_pages_large_containers() {
        let many: Vec<MediaItem> = (0..250).map(|i| node(&format!("t{}", i), false)).collect();
        let tree = FakeTree::new(&[("0", vec![node("big", true)]), ("big", many)]);
        let root = tree.root();
        tree.calls.borrow_mut().clear();

        let report = traverse(&tree, TraversalMode::FullScan { max_items: 1000 }, &root);

        assert_eq!(
            *tree.calls.borrow(),
            vec![("big".to_string(), 0), ("big".to_string(), 100), ("big".to_string(), 200)]
        );
        assert_eq!(report.leaf_count(), 250);
    }

    #[test]
    fn test_full_scan_pages_root_remainder() {
        let root_items: Vec<MediaItem> = (0..150).map(|i| node(&format!("r{}", i), i == 149)).collect();
        let tree = FakeTree::new(&[("0", root_items), ("r149", vec![node("inside", false)])]);
        let root = tree.root();
        assert_eq!(root.items.len(), 100);

        let report = traverse(&tree, TraversalMode::FullScan { max_items: 1000 }, &root);

        assert_eq!(report.items.len(), 151);
        assert_eq!(report.items.last().map(|i| i.id.as_str()), Some("inside"));
    }

    /// Fails one page of one container, delegating everything else
    struct FailingPage {
        tree: FakeTree,
        id: &'static str,
        starting_index: u32,
    }

    impl ContentBrowser for FailingPage {
        fn browse(&self, request: &BrowseRequest) -> Result<BrowseResult, ClientError> {
            if request.object_id == self.id && request.starting_index == self.starting_index {
                return Err(ClientError::Status(500));
            }
            self.tree.browse(request)
        }
    }

    #[test]
    fn test_failed_root_remainder_is_not_a_failed_container() {
        let mut root_items = vec![node("c", true)];
        root_items.extend((1..150).map(|i| node(&format!("r{}", i), false)));
        let browser = FailingPage {
            tree: FakeTree::new(&[("0", root_items), ("c", vec![node("inside", false)])]),
            id: "0",
            starting_index: 100,
        };
        let root = browser.tree.root();

        let report = traverse(&browser, TraversalMode::FullScan { max_items: 1000 }, &root);

        assert_eq!(report.containers_browsed, 1);
        assert_eq!(report.containers_failed, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, "0");
        assert!(report.items.iter().any(|i| i.id == "inside"));
    }

    #[test]
    fn test_failed_later_page_keeps_container_counted_as_listed() {
        let many: Vec<MediaItem> = (0..150).map(|i| node(&format!("t{}", i), false)).collect();
        let browser = FailingPage {
            tree: FakeTree::new(&[("0", vec![node("big", true)]), ("big", many)]),
            id: "big",
            starting_index: 100,
        };
        let root = browser.tree.root();

        let report = traverse(&browser, TraversalMode::FullScan { max_items: 1000 }, &root);

        assert_eq!(report.containers_browsed, 1);
        assert_eq!(report.containers_failed, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.leaf_count(), 100);
    }

    #[test]
    fn test_full_scan_budget_bounds_self_loop() {
        let root = SelfLoop.browse(&BrowseRequest::children("0")).unwrap();

        let report = traverse(&SelfLoop, TraversalMode::FullScan { max_items: 50 }, &root);

        assert!(report.budget_exhausted || report.containers_browsed as u32 >= FULL_SCAN_MAX_DEPTH);
        assert!(report.items.len() <= 50 + PAGE_SIZE as usize);
    }

    #[test]
    fn test_full_scan_budget_stops_new_browses() {
        let tree = FakeTree::new(&[
            ("0", vec![node("a", true), node("b", true)]),
            ("a", (0..10).map(|i| node(&format!("a{}", i), false)).collect()),
            ("b", vec![node("never", false)]),
        ]);
        let root = tree.root();

        let report = traverse(&tree, TraversalMode::FullScan { max_items: 5 }, &root);

        assert!(report.budget_exhausted);
        assert_eq!(report.items.len(), 12);
        assert!(!report.items.iter().any(|i| i.id == "never"));
    }

    #[test]
    fn test_empty_root() {
        let report = traverse(
            &FakeTree::new(&[]),
            TraversalMode::FullScan { max_items: 10 },
            &BrowseResult::default(),
        );
        assert!(report.items.is_empty());
        assert_eq!(report.containers_browsed, 0);
        assert!(report.failures.is_empty());
    }
}
