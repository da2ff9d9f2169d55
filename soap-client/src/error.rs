//! Error types for the SOAP client

use thiserror::Error;

/// Errors that can occur during SOAP communication
///
/// Callers treat every variant the same way ("the action failed"); the
/// variants only exist so logs can say why.
#[derive(Debug, Error)]
pub enum SoapError {
    /// Connection refused, timeout, DNS or TLS failure
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status
    #[error("HTTP status {0}")]
    Status(u16),

    /// The response was not XML or had no SOAP Body
    #[error("XML parsing error: {0}")]
    Parse(String),
}
