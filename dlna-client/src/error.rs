//! Error types for the client session.

use crate::service::ServiceKind;
use dlna_parser::ParseError;
use soap_client::SoapError;
use thiserror::Error;

/// Error type for client operations.
///
/// The compliance suite mostly treats every variant as "the call failed";
/// the distinction is kept for logs and result details.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection refused, timeout, DNS failure or unreadable body
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("HTTP status {0}")]
    Status(u16),

    /// A document or value could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// A SOAP action failed
    #[error("SOAP error: {0}")]
    Soap(#[from] SoapError),

    /// The device description did not advertise the service
    #[error("{0} service not available")]
    ServiceUnavailable(ServiceKind),

    /// None of the well-known description paths answered with a device description
    #[error("Device description not found")]
    DescriptionNotFound,
}

impl From<ParseError> for ClientError {
    fn from(error: ParseError) -> Self {
        ClientError::Parse(error.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => ClientError::Status(status.as_u16()),
            None => ClientError::Network(error.to_string()),
        }
    }
}

/// Convenience Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
