//! Device description and SCPD documents
//!
//! A media server publishes a device description (`<root><device>...`) listing
//! its services, and one SCPD document per service listing actions and state
//! variables. Both are deserialized with quick-xml serde after namespace
//! stripping, then mapped onto the public models below, which never fail on
//! missing fields: required text becomes an empty string and optional text
//! becomes `None`.

use crate::common::xml_decode;
use crate::error::{ParseError, ParseResult};
use serde::{Deserialize, Serialize};

/// Parsed UPnP device description
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DeviceDescriptor {
    pub device_type: String,
    pub friendly_name: String,
    pub manufacturer: String,
    pub manufacturer_url: Option<String>,
    pub model_name: String,
    pub model_description: Option<String>,
    pub model_number: Option<String>,
    pub model_url: Option<String>,
    pub serial_number: Option<String>,
    pub udn: String,
    pub presentation_url: Option<String>,
    pub services: Vec<ServiceDescriptor>,
    pub icons: Vec<Icon>,
}

impl DeviceDescriptor {
    /// Parse a device description document
    ///
    /// Fails when the XML is malformed or carries no `<device>` element.
    pub fn from_xml(xml: &str) -> ParseResult<Self> {
        let raw: RawRoot = xml_decode::parse(xml)?;
        let device = raw
            .device
            .ok_or_else(|| ParseError::MissingRequiredElement("device".to_string()))?;
        Ok(device.into())
    }

    /// First service whose type contains `needle`
    pub fn find_service(&self, needle: &str) -> Option<&ServiceDescriptor> {
        self.services.iter().find(|s| s.service_type.contains(needle))
    }
}

/// One `<service>` entry of a device description
///
/// `actions` and `state_variables` stay empty until the service's SCPD has
/// been merged in with [`ServiceDescriptor::merge_scpd`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ServiceDescriptor {
    pub service_type: String,
    pub service_id: String,
    pub scpd_url: String,
    pub control_url: String,
    pub event_sub_url: String,
    pub actions: Vec<String>,
    pub state_variables: Vec<StateVariable>,
}

impl ServiceDescriptor {
    /// Append the actions and state variables of `scpd`
    ///
    /// Existing entries are kept, so merging the same document twice lists
    /// everything twice.
    pub fn merge_scpd(&mut self, scpd: ServiceDescription) {
        self.actions.extend(scpd.actions);
        self.state_variables.extend(scpd.state_variables);
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.actions.iter().any(|a| a == name)
    }
}

/// A row of an SCPD `serviceStateTable`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateVariable {
    pub name: String,
    pub data_type: Option<String>,
    /// Raw `sendEvents` attribute, `"yes"` when absent
    pub send_events: String,
}

/// Device icon, fields kept as the strings the server sent
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Icon {
    pub mimetype: String,
    pub width: String,
    pub height: String,
    pub depth: String,
    pub url: String,
}

/// Parsed SCPD document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceDescription {
    pub actions: Vec<String>,
    pub state_variables: Vec<StateVariable>,
}

impl ServiceDescription {
    pub fn from_xml(xml: &str) -> ParseResult<Self> {
        let raw: RawScpd = xml_decode::parse(xml)?;
        Ok(raw.into())
    }
}

// Raw serde models. Every field is optional so that a sloppy document still
// deserializes; the conversions below apply the defaults.

#[derive(Debug, Deserialize)]
struct RawRoot {
    #[serde(default)]
    device: Option<RawDevice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDevice {
    #[serde(default)]
    device_type: Option<String>,
    #[serde(default)]
    friendly_name: Option<String>,
    #[serde(default)]
    manufacturer: Option<String>,
    #[serde(rename = "manufacturerURL", default)]
    manufacturer_url: Option<String>,
    #[serde(default)]
    model_name: Option<String>,
    #[serde(default)]
    model_description: Option<String>,
    #[serde(default)]
    model_number: Option<String>,
    #[serde(rename = "modelURL", default)]
    model_url: Option<String>,
    #[serde(default)]
    serial_number: Option<String>,
    #[serde(rename = "UDN", default)]
    udn: Option<String>,
    #[serde(rename = "presentationURL", default)]
    presentation_url: Option<String>,
    #[serde(default)]
    service_list: Option<RawServiceList>,
    #[serde(default)]
    icon_list: Option<RawIconList>,
}

#[derive(Debug, Deserialize)]
struct RawServiceList {
    #[serde(rename = "service", default)]
    services: Vec<RawService>,
}

#[derive(Debug, Deserialize)]
struct RawService {
    #[serde(rename = "serviceType", default)]
    service_type: Option<String>,
    #[serde(rename = "serviceId", default)]
    service_id: Option<String>,
    #[serde(rename = "SCPDURL", default)]
    scpd_url: Option<String>,
    #[serde(rename = "controlURL", default)]
    control_url: Option<String>,
    #[serde(rename = "eventSubURL", default)]
    event_sub_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawIconList {
    #[serde(rename = "icon", default)]
    icons: Vec<RawIcon>,
}

#[derive(Debug, Deserialize)]
struct RawIcon {
    #[serde(default)]
    mimetype: Option<String>,
    #[serde(default)]
    width: Option<String>,
    #[serde(default)]
    height: Option<String>,
    #[serde(default)]
    depth: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawScpd {
    #[serde(rename = "actionList", default)]
    action_list: Option<RawActionList>,
    #[serde(rename = "serviceStateTable", default)]
    state_table: Option<RawStateTable>,
}

#[derive(Debug, Deserialize)]
struct RawActionList {
    #[serde(rename = "action", default)]
    actions: Vec<RawAction>,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawStateTable {
    #[serde(rename = "stateVariable", default)]
    variables: Vec<RawStateVariable>,
}

#[derive(Debug, Deserialize)]
struct RawStateVariable {
    #[serde(rename = "@sendEvents", default)]
    send_events: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "dataType", default)]
    data_type: Option<String>,
}

fn required(value: Option<String>) -> String {
    value.unwrap_or_default()
}

fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl From<RawDevice> for DeviceDescriptor {
    fn from(raw: RawDevice) -> Self {
        Self {
            device_type: required(raw.device_type),
            friendly_name: required(raw.friendly_name),
            manufacturer: required(raw.manufacturer),
            manufacturer_url: optional(raw.manufacturer_url),
            model_name: required(raw.model_name),
            model_description: optional(raw.model_description),
            model_number: optional(raw.model_number),
            model_url: optional(raw.model_url),
            serial_number: optional(raw.serial_number),
            udn: required(raw.udn),
            presentation_url: optional(raw.presentation_url),
            services: raw
                .service_list
                .map(|list| list.services.into_iter().map(Into::into).collect())
                .unwrap_or_default(),
            icons: raw
                .icon_list
                .map(|list| list.icons.into_iter().map(Into::into).collect())
                .unwrap_or_default(),
        }
    }
}

impl From<RawService> for ServiceDescriptor {
    fn from(raw: RawService) -> Self {
        Self {
            service_type: required(raw.service_type),
            service_id: required(raw.service_id),
            scpd_url: required(raw.scpd_url),
            control_url: required(raw.control_url),
            event_sub_url: required(raw.event_sub_url),
            actions: Vec::new(),
            state_variables: Vec::new(),
        }
    }
}

impl From<RawIcon> for Icon {
    fn from(raw: RawIcon) -> Self {
        Self {
            mimetype: required(raw.mimetype),
            width: required(raw.width),
            height: required(raw.height),
            depth: required(raw.depth),
            url: required(raw.url),
        }
    }
}

impl From<RawScpd> for ServiceDescription {
    fn from(raw: RawScpd) -> Self {
        let actions = raw
            .action_list
            .map(|list| {
                list.actions
                    .into_iter()
                    .filter_map(|a| optional(a.name))
                    .collect()
            })
            .unwrap_or_default();

        let state_variables = raw
            .state_table
            .map(|table| {
                table
                    .variables
                    .into_iter()
                    .filter_map(|v| {
                        Some(StateVariable {
                            name: v.name?,
                            data_type: optional(v.data_type),
                            send_events: v.send_events.unwrap_or_else(|| "yes".to_string()),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            actions,
            state_variables,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICE_XML: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0" xmlns:dlna="urn:schemas-dlna-org:device-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <device>
    <deviceType>urn:schemas-upnp-org:device:MediaServer:1</deviceType>
    <friendlyName>Living Room NAS</friendlyName>
    <manufacturer>Acme</manufacturer>
    <manufacturerURL>http://acme.example</manufacturerURL>
    <modelName>MediaBox</modelName>
    <modelNumber></modelNumber>
    <UDN>uuid:4d696e69-444c-164e-9d41-b827eb54e8f4</UDN>
    <dlna:X_DLNADOC>DMS-1.50</dlna:X_DLNADOC>
    <iconList>
      <icon><mimetype>image/png</mimetype><width>48</width><height>48</height><depth>24</depth><url>/icons/sm.png</url></icon>
    </iconList>
    <serviceList>
      <service>
        <serviceType>urn:schemas-upnp-org:service:ContentDirectory:1</serviceType>
        <serviceId>urn:upnp-org:serviceId:ContentDirectory</serviceId>
        <SCPDURL>/cds.xml</SCPDURL>
        <controlURL>/ctl/ContentDir</controlURL>
        <eventSubURL>/evt/ContentDir</eventSubURL>
      </service>
      <service>
        <serviceType>urn:schemas-upnp-org:service:ConnectionManager:1</serviceType>
        <serviceId>urn:upnp-org:serviceId:ConnectionManager</serviceId>
        <SCPDURL>/cms.xml</SCPDURL>
        <controlURL>/ctl/ConnectionMgr</controlURL>
        <eventSubURL>/evt/ConnectionMgr</eventSubURL>
      </service>
    </serviceList>
  </device>
</root>"#;

    #[test]
    fn test_parse_device_description() {
        let device = DeviceDescriptor::from_xml(DEVICE_XML).unwrap();

        assert_eq!(device.device_type, "urn:schemas-upnp-org:device:MediaServer:1");
        assert_eq!(device.friendly_name, "Living Room NAS");
        assert_eq!(device.manufacturer_url.as_deref(), Some("http://acme.example"));
        assert_eq!(device.model_number, None);
        assert_eq!(device.serial_number, None);
        assert_eq!(device.udn, "uuid:4d696e69-444c-164e-9d41-b827eb54e8f4");

        assert_eq!(device.services.len(), 2);
        assert_eq!(device.services[0].control_url, "/ctl/ContentDir");
        assert!(device.services[0].actions.is_empty());
        assert_eq!(device.icons[0].width, "48");
        assert!(device.find_service("ConnectionManager").is_some());
    }

    #[test]
    fn test_missing_required_fields_become_empty() {
        let xml = r#"<root><device><friendlyName>Bare</friendlyName></device></root>"#;
        let device = DeviceDescriptor::from_xml(xml).unwrap();

        assert_eq!(device.friendly_name, "Bare");
        assert_eq!(device.manufacturer, "");
        assert_eq!(device.udn, "");
        assert!(device.services.is_empty());
        assert!(device.icons.is_empty());
    }

    #[test]
    fn test_no_device_element_is_error() {
        let xml = r#"<root><specVersion><major>1</major></specVersion></root>"#;
        assert!(matches!(
            DeviceDescriptor::from_xml(xml),
            Err(ParseError::MissingRequiredElement(_))
        ));
    }

    #[test]
    fn test_malformed_description_is_error() {
        assert!(DeviceDescriptor::from_xml("<root><device>").is_err());
    }

    #[test]
    fn test_parse_scpd_and_merge_appends() {
        let xml = r#"<?xml version="1.0"?>
<scpd xmlns="urn:schemas-upnp-org:service-1-0">
  <actionList>
    <action><name>Browse</name><argumentList><argument><name>ObjectID</name></argument></argumentList></action>
    <action><name>GetSystemUpdateID</name></action>
    <action><name></name></action>
  </actionList>
  <serviceStateTable>
    <stateVariable sendEvents="no"><name>A_ARG_TYPE_ObjectID</name><dataType>string</dataType></stateVariable>
    <stateVariable><name>SystemUpdateID</name><dataType>ui4</dataType></stateVariable>
    <stateVariable><dataType>string</dataType></stateVariable>
  </serviceStateTable>
</scpd>"#;

        let scpd = ServiceDescription::from_xml(xml).unwrap();
        assert_eq!(scpd.actions, vec!["Browse", "GetSystemUpdateID"]);
        assert_eq!(scpd.state_variables.len(), 2);
        assert_eq!(scpd.state_variables[0].send_events, "no");
        assert_eq!(scpd.state_variables[1].send_events, "yes");
        assert_eq!(scpd.state_variables[1].data_type.as_deref(), Some("ui4"));

        let mut service = ServiceDescriptor::default();
        service.merge_scpd(scpd.clone());
        service.merge_scpd(scpd);
        assert_eq!(service.actions.len(), 4);
        assert!(service.has_action("Browse"));
    }
}
