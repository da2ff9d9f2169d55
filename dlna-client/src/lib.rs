//! DLNA/UPnP media server client
//!
//! This crate provides a blocking client session for a single media server
//! addressed by host and port. The session locates and parses the device
//! description, fetches service SCPDs, invokes ContentDirectory and
//! ConnectionManager actions and checks individual media resources.
//!
//! # Quick Start
//!
//! ```no_run
//! use dlna_client::{BrowseRequest, MediaServerClient};
//! use std::time::Duration;
//!
//! let mut client = MediaServerClient::new("192.168.1.20", 8200, Duration::from_secs(10))?;
//! let device = client.fetch_device_description(None)?;
//! println!("{} ({})", device.friendly_name, device.model_name);
//!
//! let root = client.browse(&BrowseRequest::children("0"))?;
//! for item in root.items {
//!     println!("{} {}", item.id, item.title);
//! }
//! # Ok::<(), dlna_client::ClientError>(())
//! ```

mod content_directory;
mod description;
mod error;
mod http;
mod resources;
mod service;

pub use content_directory::{
    BrowseFlag, BrowseRequest, BrowseResult, ProtocolInfoLists, SearchRequest,
};
pub use description::DESCRIPTION_PATHS;
pub use error::{ClientError, Result};
pub use http::HttpSession;
pub use resources::{ConcurrentAccessReport, RangeFetch, ResourceHeaders};
pub use service::ServiceKind;

pub use dlna_parser::{DeviceDescriptor, MediaItem, ServiceDescriptor};

use soap_client::SoapClient;
use std::time::Duration;

/// Client session for one media server
///
/// The session owns the parsed device description and keeps its own copies of
/// the ContentDirectory and ConnectionManager service entries, which receive
/// the SCPD action lists when [`MediaServerClient::fetch_service_description`]
/// is called.
#[derive(Debug)]
pub struct MediaServerClient {
    host: String,
    port: u16,
    http: HttpSession,
    soap: SoapClient,
    description_url: Option<String>,
    device: Option<DeviceDescriptor>,
    content_directory: Option<ServiceDescriptor>,
    connection_manager: Option<ServiceDescriptor>,
}

impl MediaServerClient {
    /// Create a session for `http://{host}:{port}` with one request timeout for all calls
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Result<Self> {
        let host = host.into();
        let base_url = format!("http://{}:{}", host, port);

        Ok(Self {
            http: HttpSession::new(base_url.clone(), timeout)?,
            soap: SoapClient::new(base_url, timeout),
            host,
            port,
            description_url: None,
            device: None,
            content_directory: None,
            connection_manager: None,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    pub fn timeout(&self) -> Duration {
        self.http.timeout()
    }

    pub fn http(&self) -> &HttpSession {
        &self.http
    }

    /// Description URL found by discovery or used for the last successful fetch
    pub fn description_url(&self) -> Option<&str> {
        self.description_url.as_deref()
    }

    /// Device description from the last successful fetch
    pub fn device(&self) -> Option<&DeviceDescriptor> {
        self.device.as_ref()
    }

    /// The session's copy of a service entry, if the device advertised one
    pub fn service(&self, kind: ServiceKind) -> Option<&ServiceDescriptor> {
        match kind {
            ServiceKind::ContentDirectory => self.content_directory.as_ref(),
            ServiceKind::ConnectionManager => self.connection_manager.as_ref(),
        }
    }

    /// GET the server root with a dedicated timeout and return the status code
    ///
    /// Any status counts as reachable; only transport failures are errors.
    pub fn check_connectivity(&self, timeout: Duration) -> Result<u16> {
        let response = self.http.get_with_timeout("/", timeout)?;
        Ok(response.status().as_u16())
    }

    /// Invoke an action on a tracked service and return the SOAP Body
    ///
    /// A fault delivered with a success status comes back as a Body.
    pub fn invoke(
        &self,
        kind: ServiceKind,
        action: &str,
        arguments: &[(&str, &str)],
    ) -> Result<xmltree::Element> {
        let service = self
            .service(kind)
            .ok_or(ClientError::ServiceUnavailable(kind))?;
        Ok(self
            .soap
            .call(&service.control_url, &service.service_type, action, arguments)?)
    }
}
