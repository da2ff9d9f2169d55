//! ContentDirectory and ConnectionManager actions.

use crate::error::{ClientError, Result};
use crate::service::ServiceKind;
use crate::MediaServerClient;
use dlna_parser::{parse_items, MediaItem};
use serde::Serialize;
use soap_client::value_text;
use std::fmt;
use tracing::debug;
use xmltree::Element;

/// `BrowseFlag` argument of the Browse action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowseFlag {
    /// List the children of the object
    #[default]
    DirectChildren,
    /// Describe the object itself
    Metadata,
}

impl BrowseFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowseFlag::DirectChildren => "BrowseDirectChildren",
            BrowseFlag::Metadata => "BrowseMetadata",
        }
    }
}

impl fmt::Display for BrowseFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments of a Browse call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseRequest {
    pub object_id: String,
    pub flag: BrowseFlag,
    pub filter: String,
    pub starting_index: u32,
    pub requested_count: u32,
    pub sort_criteria: String,
}

impl Default for BrowseRequest {
    fn default() -> Self {
        Self {
            object_id: "0".to_string(),
            flag: BrowseFlag::DirectChildren,
            filter: "*".to_string(),
            starting_index: 0,
            requested_count: 100,
            sort_criteria: String::new(),
        }
    }
}

impl BrowseRequest {
    /// First page of the direct children of `object_id`
    pub fn children(object_id: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            ..Self::default()
        }
    }

    /// Metadata of `object_id` itself
    pub fn metadata(object_id: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            flag: BrowseFlag::Metadata,
            ..Self::default()
        }
    }

    pub fn page(mut self, starting_index: u32, requested_count: u32) -> Self {
        self.starting_index = starting_index;
        self.requested_count = requested_count;
        self
    }
}

/// Arguments of a Search call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub container_id: String,
    pub search_criteria: String,
    pub filter: String,
    pub starting_index: u32,
    pub requested_count: u32,
    pub sort_criteria: String,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            container_id: "0".to_string(),
            search_criteria: "*".to_string(),
            filter: "*".to_string(),
            starting_index: 0,
            requested_count: 100,
            sort_criteria: String::new(),
        }
    }
}

impl SearchRequest {
    pub fn new(container_id: impl Into<String>, search_criteria: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            search_criteria: search_criteria.into(),
            ..Self::default()
        }
    }
}

/// Items of one Browse or Search page with the server's counters
///
/// An empty `Result` is a valid empty page: no items and both counters 0.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowseResult {
    pub items: Vec<MediaItem>,
    pub number_returned: u32,
    pub total_matches: u32,
}

/// `Source` and `Sink` lists from ConnectionManager GetProtocolInfo
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProtocolInfoLists {
    pub source: Option<String>,
    pub sink: Option<String>,
}

impl ProtocolInfoLists {
    /// Non-empty comma-separated entries of the source list
    pub fn source_protocols(&self) -> Vec<&str> {
        self.source
            .as_deref()
            .map(|s| s.split(',').map(str::trim).filter(|p| !p.is_empty()).collect())
            .unwrap_or_default()
    }
}

impl MediaServerClient {
    /// ContentDirectory GetSearchCapabilities; `""` when the server omits `SearchCaps`
    pub fn get_search_capabilities(&self) -> Result<String> {
        self.content_directory_value("GetSearchCapabilities", "SearchCaps")
    }

    /// ContentDirectory GetSortCapabilities; `""` when the server omits `SortCaps`
    pub fn get_sort_capabilities(&self) -> Result<String> {
        self.content_directory_value("GetSortCapabilities", "SortCaps")
    }

    /// ContentDirectory GetSystemUpdateID
    pub fn get_system_update_id(&self) -> Result<u32> {
        let (body, namespace) = self.call(ServiceKind::ContentDirectory, "GetSystemUpdateID", &[])?;
        let text = value_text(&body, &namespace, "Id").unwrap_or_default();
        text.trim()
            .parse::<u32>()
            .map_err(|_| ClientError::Parse(format!("Invalid SystemUpdateID: {:?}", text)))
    }

    /// ConnectionManager GetProtocolInfo
    pub fn get_protocol_info(&self) -> Result<ProtocolInfoLists> {
        let (body, namespace) = self.call(ServiceKind::ConnectionManager, "GetProtocolInfo", &[])?;
        Ok(ProtocolInfoLists {
            source: value_text(&body, &namespace, "Source"),
            sink: value_text(&body, &namespace, "Sink"),
        })
    }

    /// ContentDirectory Browse
    pub fn browse(&self, request: &BrowseRequest) -> Result<BrowseResult> {
        let starting_index = request.starting_index.to_string();
        let requested_count = request.requested_count.to_string();
        let arguments = [
            ("ObjectID", request.object_id.as_str()),
            ("BrowseFlag", request.flag.as_str()),
            ("Filter", request.filter.as_str()),
            ("StartingIndex", starting_index.as_str()),
            ("RequestedCount", requested_count.as_str()),
            ("SortCriteria", request.sort_criteria.as_str()),
        ];

        debug!(
            "Browse {} {} [{}+{}]",
            request.object_id, request.flag, request.starting_index, request.requested_count
        );
        let (body, namespace) = self.call(ServiceKind::ContentDirectory, "Browse", &arguments)?;
        Ok(listing(&body, &namespace))
    }

    /// ContentDirectory Search
    pub fn search(&self, request: &SearchRequest) -> Result<BrowseResult> {
        let starting_index = request.starting_index.to_string();
        let requested_count = request.requested_count.to_string();
        let arguments = [
            ("ContainerID", request.container_id.as_str()),
            ("SearchCriteria", request.search_criteria.as_str()),
            ("Filter", request.filter.as_str()),
            ("StartingIndex", starting_index.as_str()),
            ("RequestedCount", requested_count.as_str()),
            ("SortCriteria", request.sort_criteria.as_str()),
        ];

        let (body, namespace) = self.call(ServiceKind::ContentDirectory, "Search", &arguments)?;
        Ok(listing(&body, &namespace))
    }

    fn content_directory_value(&self, action: &str, name: &str) -> Result<String> {
        let (body, namespace) = self.call(ServiceKind::ContentDirectory, action, &[])?;
        Ok(value_text(&body, &namespace, name).unwrap_or_default())
    }

    /// Invoke and return the Body with the service type used as the value namespace
    fn call(
        &self,
        kind: ServiceKind,
        action: &str,
        arguments: &[(&str, &str)],
    ) -> Result<(Element, String)> {
        let body = self.invoke(kind, action, arguments)?;
        let namespace = self
            .service(kind)
            .map(|s| s.service_type.clone())
            .unwrap_or_default();
        Ok((body, namespace))
    }
}

/// Extract a Browse/Search response; counters default to 0 together
fn listing(body: &Element, namespace: &str) -> BrowseResult {
    let result = match value_text(body, namespace, "Result") {
        Some(text) if !text.is_empty() => text,
        _ => return BrowseResult::default(),
    };

    let count = |name: &str| {
        match value_text(body, namespace, name) {
            Some(text) if !text.is_empty() => text.trim().parse::<u32>().map_err(|_| ()),
            _ => Ok(0),
        }
    };
    let (number_returned, total_matches) = match (count("NumberReturned"), count("TotalMatches")) {
        (Ok(returned), Ok(total)) => (returned, total),
        _ => (0, 0),
    };

    BrowseResult {
        items: parse_items(&result),
        number_returned,
        total_matches,
    }
}
