//! `protocolInfo` strings and their DLNA.ORG parameters
//!
//! A protocolInfo has four colon-separated fields:
//! `<protocol>:<network>:<contentFormat>:<additionalInfo>`, e.g.
//! `http-get:*:audio/mpeg:DLNA.ORG_PN=MP3;DLNA.ORG_OP=01;DLNA.ORG_FLAGS=01700000000000000000000000000000`.
//! The fourth field carries the DLNA parameters as `;`-separated `KEY=value` pairs.

use serde::Serialize;

/// A protocolInfo split into its four fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtocolInfo {
    pub protocol: String,
    pub network: String,
    pub content_format: String,
    pub additional_info: String,
}

impl ProtocolInfo {
    /// Split a protocolInfo string; `None` unless all four fields are present
    pub fn parse(value: &str) -> Option<Self> {
        let mut fields = value.splitn(4, ':');
        Some(Self {
            protocol: fields.next()?.to_string(),
            network: fields.next()?.to_string(),
            content_format: fields.next()?.to_string(),
            additional_info: fields.next()?.to_string(),
        })
    }

    pub fn dlna_parameters(&self) -> DlnaParameters {
        DlnaParameters::parse(&self.additional_info)
    }
}

/// DLNA.ORG parameters of a protocolInfo's fourth field
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DlnaParameters {
    /// `DLNA.ORG_PN`, the media profile name
    pub profile: Option<String>,
    /// `DLNA.ORG_OP`, seek operations
    pub operations: Option<String>,
    /// `DLNA.ORG_FLAGS`, as sent
    pub flags: Option<String>,
    /// `DLNA.ORG_CI`, conversion indicator
    pub conversion_indicator: Option<String>,
}

impl DlnaParameters {
    pub fn parse(additional_info: &str) -> Self {
        let mut params = Self::default();
        for pair in additional_info.split(';') {
            let Some((key, value)) = pair.trim().split_once('=') else {
                continue;
            };
            let value = Some(value.to_string());
            match key {
                "DLNA.ORG_PN" => params.profile = value,
                "DLNA.ORG_OP" => params.operations = value,
                "DLNA.ORG_FLAGS" => params.flags = value,
                "DLNA.ORG_CI" => params.conversion_indicator = value,
                _ => {}
            }
        }
        params
    }

    pub fn has_any(&self) -> bool {
        self.profile.is_some()
            || self.operations.is_some()
            || self.flags.is_some()
            || self.conversion_indicator.is_some()
    }

    /// `Some(false)` when `DLNA.ORG_FLAGS` is present but malformed
    pub fn flags_valid(&self) -> Option<bool> {
        self.flags.as_deref().map(is_valid_flags)
    }
}

/// `DLNA.ORG_FLAGS` must be exactly 32 hexadecimal characters
pub fn is_valid_flags(flags: &str) -> bool {
    flags.len() == 32 && flags.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_protocol_info() {
        let info = ProtocolInfo::parse(
            "http-get:*:audio/mpeg:DLNA.ORG_PN=MP3;DLNA.ORG_OP=01;DLNA.ORG_FLAGS=01700000000000000000000000000000",
        )
        .unwrap();

        assert_eq!(info.protocol, "http-get");
        assert_eq!(info.content_format, "audio/mpeg");

        let params = info.dlna_parameters();
        assert_eq!(params.profile.as_deref(), Some("MP3"));
        assert_eq!(params.operations.as_deref(), Some("01"));
        assert_eq!(params.flags_valid(), Some(true));
    }

    #[test]
    fn test_additional_info_may_contain_colons() {
        let info = ProtocolInfo::parse("rtsp-rtp-udp:*:video/mp4:a=b:c").unwrap();
        assert_eq!(info.additional_info, "a=b:c");
        assert_eq!(info.protocol, "rtsp-rtp-udp");
    }

    #[test]
    fn test_incomplete_protocol_info() {
        assert_eq!(ProtocolInfo::parse("http-get:*:audio/mpeg"), None);
        assert_eq!(ProtocolInfo::parse(""), None);
    }

    #[test]
    fn test_flags_validation() {
        assert!(is_valid_flags("01700000000000000000000000000000"));
        assert!(is_valid_flags("8D100000000000000000000000000000"));
        assert!(!is_valid_flags("017"));
        assert!(!is_valid_flags("0170000000000000000000000000000G"));

        let params = DlnaParameters::parse("DLNA.ORG_FLAGS=017");
        assert_eq!(params.flags_valid(), Some(false));
        assert!(params.has_any());
    }

    #[test]
    fn test_no_dlna_parameters() {
        let params = DlnaParameters::parse("*");
        assert!(!params.has_any());
        assert_eq!(params.flags_valid(), None);
    }
}
