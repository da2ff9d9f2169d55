//! Private SOAP client for UPnP control actions
//!
//! This crate provides a minimal SOAP 1.1 client for talking to UPnP media
//! servers. It builds the envelope, posts it to a (possibly relative) control
//! URL and hands back the parsed `<Body>` element. Extracting values from the
//! body is left to the caller, with [`find_value`] implementing the
//! namespaced-then-bare lookup real servers need.

mod error;

pub use error::SoapError;

use std::time::Duration;
use tracing::debug;
use url::Url;
use xmltree::Element;

/// SOAP 1.1 envelope namespace
pub const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// User-Agent sent with every request
pub const USER_AGENT: &str = "DLNA-Tester/1.0 UPnP/1.0";

/// A minimal SOAP client bound to one media server
#[derive(Debug, Clone)]
pub struct SoapClient {
    agent: ureq::Agent,
    base_url: String,
}

impl SoapClient {
    /// Create a client for the server at `base_url` (e.g. `http://192.168.1.10:8200`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(timeout)
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build(),
            base_url: base_url.into(),
        }
    }

    /// Base URL relative control URLs are resolved against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Invoke `action` on the service and return the SOAP `<Body>` element
    ///
    /// # Arguments
    /// * `control_url` - Control URL from the device description, absolute or relative
    /// * `service_type` - Service type URN, used as the action namespace
    /// * `action` - Action name, e.g. `Browse`
    /// * `arguments` - Argument name/value pairs, serialized in the given order
    ///
    /// A 2xx response is returned even when its body is a SOAP fault; callers
    /// that care can inspect it with [`fault_code`].
    pub fn call(
        &self,
        control_url: &str,
        service_type: &str,
        action: &str,
        arguments: &[(&str, &str)],
    ) -> Result<Element, SoapError> {
        let envelope = build_envelope(service_type, action, arguments);
        let url = resolve_url(&self.base_url, control_url);
        let soap_action = format!("\"{}#{}\"", service_type, action);

        debug!("SOAP {} -> {}", action, url);

        let response = match self
            .agent
            .post(&url)
            .set("Content-Type", "text/xml; charset=\"utf-8\"")
            .set("SOAPAction", &soap_action)
            .send_string(&envelope)
        {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => return Err(SoapError::Status(code)),
            Err(e) => return Err(SoapError::Network(e.to_string())),
        };

        let xml = Element::parse(response.into_reader())
            .map_err(|e| SoapError::Parse(e.to_string()))?;

        extract_body(&xml)
    }
}

/// Build a UPnP SOAP 1.1 envelope for `action` with XML-escaped arguments
pub fn build_envelope(service_type: &str, action: &str, arguments: &[(&str, &str)]) -> String {
    let args_xml: String = arguments
        .iter()
        .map(|(name, value)| {
            format!(
                "<{name}>{value}</{name}>",
                name = name,
                value = quick_xml::escape::escape(value)
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="{envelope_ns}" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
    <s:Body>
        <u:{action} xmlns:u="{service_type}">{args_xml}</u:{action}>
    </s:Body>
</s:Envelope>"#,
        envelope_ns = SOAP_ENVELOPE_NS,
        action = action,
        service_type = service_type,
        args_xml = args_xml
    )
}

/// Resolve `path` against `base_url`; absolute http(s) URLs pass through unchanged
pub fn resolve_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    match Url::parse(base_url).and_then(|base| base.join(path)) {
        Ok(url) => url.to_string(),
        Err(_) => format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        ),
    }
}

/// Find the first value element called `name` anywhere under `body`
///
/// The element is first looked up in the service namespace and, failing that,
/// without a namespace. Servers are inconsistent about declaring the
/// namespace of response arguments, so both attempts are needed and the order
/// matters.
pub fn find_value<'a>(body: &'a Element, namespace: &str, name: &str) -> Option<&'a Element> {
    find_descendant(body, &|e| e.name == name && e.namespace.as_deref() == Some(namespace))
        .or_else(|| find_descendant(body, &|e| e.name == name && e.namespace.is_none()))
}

/// Text of the element found by [`find_value`]
///
/// `None` when the element is missing, `Some("")` when it is present but empty.
pub fn value_text(body: &Element, namespace: &str, name: &str) -> Option<String> {
    find_value(body, namespace, name)
        .map(|e| e.get_text().map(|t| t.into_owned()).unwrap_or_default())
}

/// UPnP error code of a SOAP fault body, if the body is a fault
///
/// Faults without a parsable `errorCode` report 500.
pub fn fault_code(body: &Element) -> Option<u16> {
    let fault = find_descendant(body, &|e| e.name == "Fault")?;
    let code = find_descendant(fault, &|e| e.name == "errorCode")
        .and_then(|c| c.get_text())
        .and_then(|t| t.trim().parse::<u16>().ok())
        .unwrap_or(500);
    Some(code)
}

/// Depth-first, document-order search below `elem` (the element itself excluded)
pub fn find_descendant<'a>(
    elem: &'a Element,
    predicate: &dyn Fn(&Element) -> bool,
) -> Option<&'a Element> {
    for child in elem.children.iter().filter_map(|node| node.as_element()) {
        if predicate(child) {
            return Some(child);
        }
        if let Some(found) = find_descendant(child, predicate) {
            return Some(found);
        }
    }
    None
}

fn extract_body(xml: &Element) -> Result<Element, SoapError> {
    let is_body = |e: &Element| e.name == "Body" && e.namespace.as_deref() == Some(SOAP_ENVELOPE_NS);
    if is_body(xml) {
        return Ok(xml.clone());
    }
    find_descendant(xml, &is_body)
        .cloned()
        .ok_or_else(|| SoapError::Parse("Missing SOAP Body".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CDS: &str = "urn:schemas-upnp-org:service:ContentDirectory:1";

    #[test]
    fn test_envelope_preserves_argument_order_and_escapes_values() {
        let envelope = build_envelope(
            CDS,
            "Browse",
            &[("ObjectID", "a&b<c>"), ("BrowseFlag", "BrowseMetadata"), ("Filter", "\"*'")],
        );

        assert!(envelope.contains(r#"<u:Browse xmlns:u="urn:schemas-upnp-org:service:ContentDirectory:1">"#));
        assert!(envelope.contains("<ObjectID>a&amp;b&lt;c&gt;</ObjectID>"));
        assert!(envelope.contains("<Filter>&quot;*&apos;</Filter>"));

        let object_id = envelope.find("<ObjectID>").unwrap();
        let flag = envelope.find("<BrowseFlag>").unwrap();
        let filter = envelope.find("<Filter>").unwrap();
        assert!(object_id < flag && flag < filter);
    }

    #[test]
    fn test_envelope_is_well_formed() {
        let envelope = build_envelope(CDS, "GetSystemUpdateID", &[]);
        let xml = Element::parse(envelope.as_bytes()).unwrap();
        let body = extract_body(&xml).unwrap();
        let action = find_descendant(&body, &|e| e.name == "GetSystemUpdateID").unwrap();
        assert_eq!(action.namespace.as_deref(), Some(CDS));
    }

    #[test]
    fn test_resolve_url() {
        let base = "http://192.168.1.10:8200";
        assert_eq!(resolve_url(base, "/ctl/ContentDir"), "http://192.168.1.10:8200/ctl/ContentDir");
        assert_eq!(resolve_url(base, "ctl/ContentDir"), "http://192.168.1.10:8200/ctl/ContentDir");
        assert_eq!(resolve_url(base, "http://10.0.0.1/x.mp3"), "http://10.0.0.1/x.mp3");
        assert_eq!(resolve_url(base, "https://10.0.0.1/x.mp3"), "https://10.0.0.1/x.mp3");
    }

    #[test]
    fn test_extract_body() {
        let xml_str = r#"
            <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
                <s:Body>
                    <u:GetSystemUpdateIDResponse xmlns:u="urn:schemas-upnp-org:service:ContentDirectory:1">
                        <Id>42</Id>
                    </u:GetSystemUpdateIDResponse>
                </s:Body>
            </s:Envelope>
        "#;

        let xml = Element::parse(xml_str.as_bytes()).unwrap();
        let body = extract_body(&xml).unwrap();
        assert_eq!(body.name, "Body");
        assert_eq!(value_text(&body, CDS, "Id").as_deref(), Some("42"));
    }

    #[test]
    fn test_extract_body_missing() {
        let xml_str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"></s:Envelope>"#;
        let xml = Element::parse(xml_str.as_bytes()).unwrap();

        match extract_body(&xml) {
            Err(SoapError::Parse(msg)) => assert!(msg.contains("Missing SOAP Body")),
            other => panic!("Expected SoapError::Parse, got {:?}", other),
        }
    }

    #[test]
    fn test_find_value_prefers_service_namespace() {
        let xml_str = format!(
            r#"<s:Body xmlns:s="{}">
                <u:BrowseResponse xmlns:u="{}">
                    <Result>bare</Result>
                    <u:Result>qualified</u:Result>
                </u:BrowseResponse>
            </s:Body>"#,
            SOAP_ENVELOPE_NS, CDS
        );

        let body = Element::parse(xml_str.as_bytes()).unwrap();
        assert_eq!(value_text(&body, CDS, "Result").as_deref(), Some("qualified"));
    }

    #[test]
    fn test_find_value_falls_back_to_bare_name() {
        let xml_str = format!(
            r#"<s:Body xmlns:s="{}">
                <u:GetSortCapabilitiesResponse xmlns:u="{}">
                    <SortCaps>dc:title</SortCaps>
                    <Empty></Empty>
                </u:GetSortCapabilitiesResponse>
            </s:Body>"#,
            SOAP_ENVELOPE_NS, CDS
        );

        let body = Element::parse(xml_str.as_bytes()).unwrap();
        assert_eq!(value_text(&body, CDS, "SortCaps").as_deref(), Some("dc:title"));
        assert_eq!(value_text(&body, CDS, "Empty").as_deref(), Some(""));
        assert_eq!(value_text(&body, CDS, "Missing"), None);
    }

    #[test]
    fn test_fault_code() {
        let xml_str = r#"
            <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
                <s:Body>
                    <s:Fault>
                        <faultcode>s:Client</faultcode>
                        <faultstring>UPnPError</faultstring>
                        <detail>
                            <UPnPError xmlns="urn:schemas-upnp-org:control-1-0">
                                <errorCode>701</errorCode>
                                <errorDescription>No such object</errorDescription>
                            </UPnPError>
                        </detail>
                    </s:Fault>
                </s:Body>
            </s:Envelope>
        "#;

        let xml = Element::parse(xml_str.as_bytes()).unwrap();
        let body = extract_body(&xml).unwrap();
        assert_eq!(fault_code(&body), Some(701));
    }

    #[test]
    fn test_fault_code_defaults_and_absence() {
        let fault = format!(
            r#"<s:Body xmlns:s="{}"><s:Fault><faultcode>s:Server</faultcode></s:Fault></s:Body>"#,
            SOAP_ENVELOPE_NS
        );
        let body = Element::parse(fault.as_bytes()).unwrap();
        assert_eq!(fault_code(&body), Some(500));

        let ok = format!(r#"<s:Body xmlns:s="{}"><u:X xmlns:u="{}"/></s:Body>"#, SOAP_ENVELOPE_NS, CDS);
        let body = Element::parse(ok.as_bytes()).unwrap();
        assert_eq!(fault_code(&body), None);
    }
}
