use super::{truncate, ComplianceSuite};
use crate::result::{TestCategory, TestResult};
use dlna_client::DeviceDescriptor;
use serde_json::json;
use std::ops::ControlFlow;
use tracing::warn;

const CATEGORY: TestCategory = TestCategory::DeviceDescription;

pub(super) fn run(suite: &mut ComplianceSuite) -> ControlFlow<()> {
    suite.narrate("Testing device description...");

    match suite.client.fetch_device_description(None) {
        Ok(device) => suite.record_all(device_checks(&device)),
        Err(e) => {
            warn!("Device description unavailable: {}", e);
            suite.record(
                TestResult::fail(
                    "Device Description Parsing",
                    CATEGORY,
                    "Could not parse device description",
                )
                .with_weight(2.0),
            );
        }
    }

    ControlFlow::Continue(())
}

/// Checks over a parsed device description
pub(crate) fn device_checks(device: &DeviceDescriptor) -> Vec<TestResult> {
    let mut results = Vec::new();

    let device_type = json!({ "device_type": device.device_type });
    results.push(if device.device_type.contains("MediaServer") {
        TestResult::pass(
            "Device Type",
            CATEGORY,
            format!("Device type: {}", device.device_type),
        )
        .with_details(device_type)
    } else {
        TestResult::warn(
            "Device Type",
            CATEGORY,
            format!("Non-standard device type: {}", device.device_type),
        )
        .with_details(device_type)
    });

    let required = [
        ("friendlyName", &device.friendly_name),
        ("manufacturer", &device.manufacturer),
        ("modelName", &device.model_name),
        ("UDN", &device.udn),
    ];
    for (field, value) in required {
        let name = format!("Required Field: {}", field);
        results.push(if value.is_empty() {
            TestResult::fail(name, CATEGORY, format!("Missing required field: {}", field))
        } else {
            TestResult::pass(
                name,
                CATEGORY,
                format!("{} present: {}", field, truncate(value, 50)),
            )
        });
    }

    results.push(if device.udn.starts_with("uuid:") {
        TestResult::pass("UDN Format", CATEGORY, "UDN follows uuid: format")
    } else {
        TestResult::warn(
            "UDN Format",
            CATEGORY,
            format!("UDN does not follow uuid: format: {}", device.udn),
        )
    });

    results.push(
        if device.find_service("ContentDirectory").is_some() {
            TestResult::pass(
                "ContentDirectory Service",
                CATEGORY,
                "ContentDirectory service present",
            )
        } else {
            TestResult::fail(
                "ContentDirectory Service",
                CATEGORY,
                "ContentDirectory service missing (required for DLNA DMS)",
            )
        }
        .with_weight(2.0),
    );

    results.push(
        if device.find_service("ConnectionManager").is_some() {
            TestResult::pass(
                "ConnectionManager Service",
                CATEGORY,
                "ConnectionManager service present",
            )
        } else {
            TestResult::warn(
                "ConnectionManager Service",
                CATEGORY,
                "ConnectionManager service missing (recommended)",
            )
        }
        .with_weight(1.5),
    );

    results.push(if device.icons.is_empty() {
        TestResult::warn(
            "Device Icons",
            CATEGORY,
            "No device icons defined (recommended for better UX)",
        )
    } else {
        TestResult::pass(
            "Device Icons",
            CATEGORY,
            format!("Device has {} icon(s)", device.icons.len()),
        )
        .with_details(json!({ "icon_count": device.icons.len() }))
    });

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::TestStatus;
    use dlna_client::ServiceDescriptor;

    fn service(service_type: &str) -> ServiceDescriptor {
        ServiceDescriptor {
            service_type: service_type.to_string(),
            service_id: String::new(),
            scpd_url: "/scpd.xml".to_string(),
            control_url: "/ctl".to_string(),
            event_sub_url: "/evt".to_string(),
            actions: Vec::new(),
            state_variables: Vec::new(),
        }
    }

    fn minimal_device() -> DeviceDescriptor {
        DeviceDescriptor {
            device_type: "urn:schemas-upnp-org:device:MediaServer:1".to_string(),
            friendly_name: "Living Room NAS".to_string(),
            manufacturer: "Acme".to_string(),
            manufacturer_url: None,
            model_name: "Shelf".to_string(),
            model_description: None,
            model_number: None,
            model_url: None,
            serial_number: None,
            udn: "uuid:1234".to_string(),
            presentation_url: None,
            services: vec![service("urn:schemas-upnp-org:service:ContentDirectory:1")],
            icons: Vec::new(),
        }
    }

    fn status_of(results: &[TestResult], name: &str) -> TestStatus {
        results
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.status)
            .unwrap_or_else(|| panic!("no result named {}", name))
    }

    #[test]
    fn test_minimal_compliant_device() {
        let results = device_checks(&minimal_device());

        assert_eq!(results.len(), 9);
        assert_eq!(status_of(&results, "Device Type"), TestStatus::Pass);
        for field in ["friendlyName", "manufacturer", "modelName", "UDN"] {
            assert_eq!(
                status_of(&results, &format!("Required Field: {}", field)),
                TestStatus::Pass
            );
        }
        assert_eq!(status_of(&results, "UDN Format"), TestStatus::Pass);
        assert_eq!(status_of(&results, "ContentDirectory Service"), TestStatus::Pass);
        assert_eq!(status_of(&results, "ConnectionManager Service"), TestStatus::Warn);
        assert_eq!(status_of(&results, "Device Icons"), TestStatus::Warn);

        let cm = results.iter().find(|r| r.name == "ConnectionManager Service").unwrap();
        assert_eq!(cm.weight, 1.5);
    }

    #[test]
    fn test_missing_fields_and_services() {
        let device = DeviceDescriptor {
            device_type: "urn:schemas-upnp-org:device:MediaRenderer:1".to_string(),
            manufacturer: String::new(),
            udn: "1234".to_string(),
            services: Vec::new(),
            ..minimal_device()
        };

        let results = device_checks(&device);
        assert_eq!(status_of(&results, "Device Type"), TestStatus::Warn);
        assert_eq!(status_of(&results, "Required Field: manufacturer"), TestStatus::Fail);
        assert_eq!(status_of(&results, "UDN Format"), TestStatus::Warn);
        assert_eq!(status_of(&results, "ContentDirectory Service"), TestStatus::Fail);
    }

    #[test]
    fn test_long_field_value_is_truncated() {
        let device = DeviceDescriptor {
            friendly_name: "N".repeat(80),
            ..minimal_device()
        };

        let results = device_checks(&device);
        let name = results
            .iter()
            .find(|r| r.name == "Required Field: friendlyName")
            .unwrap();
        assert_eq!(name.message, format!("friendlyName present: {}...", "N".repeat(50)));
    }
}
