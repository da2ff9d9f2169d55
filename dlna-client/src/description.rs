//! Device description discovery and SCPD retrieval.

use crate::error::{ClientError, Result};
use crate::service::ServiceKind;
use crate::MediaServerClient;
use dlna_parser::{DeviceDescriptor, ServiceDescription};
use tracing::{debug, warn};

/// Paths tried, in order, when looking for the device description
pub const DESCRIPTION_PATHS: &[&str] = &[
    "/DeviceDescription.xml",
    "/description.xml",
    "/rootDesc.xml",
    "/device.xml",
    "/MediaServer.xml",
    "/dmr.xml",
    "/upnp/desc.xml",
    "/dlna/device.xml",
    "/",
];

/// Marker every UPnP device description contains
const DEVICE_URN_MARKER: &str = "urn:schemas-upnp-org:device";

impl MediaServerClient {
    /// Try the well-known description paths and remember the first hit
    ///
    /// A path matches when it answers 200 and the body mentions a UPnP device
    /// type. Failures on individual paths are skipped.
    pub fn discover_description_url(&mut self) -> Option<String> {
        for path in DESCRIPTION_PATHS {
            let url = self.http().url(path);
            let response = match self.http().get(&url) {
                Ok(response) => response,
                Err(e) => {
                    debug!("Description candidate {} failed: {}", url, e);
                    continue;
                }
            };

            if response.status().as_u16() != 200 {
                debug!("Description candidate {} returned {}", url, response.status());
                continue;
            }

            match response.text() {
                Ok(body) if body.contains(DEVICE_URN_MARKER) => {
                    debug!("Found device description at {}", url);
                    self.description_url = Some(url.clone());
                    return Some(url);
                }
                Ok(_) => debug!("Description candidate {} is not a device description", url),
                Err(e) => debug!("Description candidate {} body unreadable: {}", url, e),
            }
        }

        None
    }

    /// Fetch and parse the device description
    ///
    /// The URL is `url` if given, else the previously discovered one, else the
    /// result of a fresh discovery. On success the ContentDirectory and
    /// ConnectionManager entries of this description replace whatever was
    /// cached before; when a device advertises a service twice the later
    /// entry replaces the earlier one.
    pub fn fetch_device_description(&mut self, url: Option<&str>) -> Result<DeviceDescriptor> {
        let url = match url.map(str::to_string).or_else(|| self.description_url.clone()) {
            Some(url) => url,
            None => self
                .discover_description_url()
                .ok_or(ClientError::DescriptionNotFound)?,
        };

        let xml = self.http().get_text(&url)?;
        let device = DeviceDescriptor::from_xml(&xml)?;

        self.content_directory = None;
        self.connection_manager = None;
        for service in &device.services {
            match ServiceKind::classify(&service.service_type) {
                Some(ServiceKind::ContentDirectory) => {
                    self.content_directory = Some(service.clone())
                }
                Some(ServiceKind::ConnectionManager) => {
                    self.connection_manager = Some(service.clone())
                }
                None => {}
            }
        }

        self.description_url = Some(url);
        self.device = Some(device.clone());
        Ok(device)
    }

    /// Fetch the SCPD of a tracked service and append its actions and state variables
    ///
    /// Calling this twice lists every action twice.
    pub fn fetch_service_description(&mut self, kind: ServiceKind) -> Result<ServiceDescription> {
        let scpd_url = self
            .service(kind)
            .map(|s| s.scpd_url.clone())
            .ok_or(ClientError::ServiceUnavailable(kind))?;

        let scpd = self
            .http()
            .get_text(&scpd_url)
            .and_then(|xml| Ok(ServiceDescription::from_xml(&xml)?))
            .map_err(|e| {
                warn!("Failed to fetch {} SCPD from {}: {}", kind, scpd_url, e);
                e
            })?;

        let cached = match kind {
            ServiceKind::ContentDirectory => self.content_directory.as_mut(),
            ServiceKind::ConnectionManager => self.connection_manager.as_mut(),
        };
        if let Some(service) = cached {
            service.merge_scpd(scpd.clone());
        }

        Ok(scpd)
    }
}
