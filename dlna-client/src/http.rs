//! Plain HTTP access to the media server

use crate::error::{ClientError, Result};
use reqwest::blocking::{Client, Response};
use soap_client::{resolve_url, USER_AGENT};
use std::time::Duration;

/// Blocking HTTP session bound to one server's base URL
///
/// Relative paths are resolved against the base URL; absolute `http://` and
/// `https://` URLs pass through unchanged.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpSession {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Absolute URL for `path`
    pub fn url(&self, path: &str) -> String {
        resolve_url(&self.base_url, path)
    }

    /// GET without status checking
    pub fn get(&self, path: &str) -> Result<Response> {
        Ok(self.client.get(self.url(path)).send()?)
    }

    /// GET with a per-request timeout overriding the session's
    pub fn get_with_timeout(&self, path: &str, timeout: Duration) -> Result<Response> {
        Ok(self.client.get(self.url(path)).timeout(timeout).send()?)
    }

    /// HEAD without status checking; redirects are followed
    pub fn head(&self, path: &str) -> Result<Response> {
        Ok(self.client.head(self.url(path)).send()?)
    }

    /// GET with a `Range` header, without status checking
    pub fn get_range(&self, path: &str, range: &str) -> Result<Response> {
        Ok(self
            .client
            .get(self.url(path))
            .header(reqwest::header::RANGE, range)
            .send()?)
    }

    /// GET that fails on a non-success status and returns the body text
    pub fn get_text(&self, path: &str) -> Result<String> {
        let response = self.get(path)?.error_for_status()?;
        response
            .text()
            .map_err(|e| ClientError::Network(format!("Failed to read response body: {}", e)))
    }
}

/// Build a blocking client with the session's User-Agent and timeout
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {}", e)))
}

/// Value of a response header as a string, if present and valid UTF-8
pub(crate) fn header(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_resolution() {
        let session = HttpSession::new("http://192.168.1.20:8200", Duration::from_secs(1)).unwrap();

        assert_eq!(session.url("/rootDesc.xml"), "http://192.168.1.20:8200/rootDesc.xml");
        assert_eq!(
            session.url("http://192.168.1.20:8200/MediaItems/1.mp3"),
            "http://192.168.1.20:8200/MediaItems/1.mp3"
        );
        assert_eq!(session.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_get_text_rejects_error_status() {
        let mut server = mockito::Server::new();
        server.mock("GET", "/missing.xml").with_status(404).create();

        let session = HttpSession::new(server.url(), Duration::from_secs(5)).unwrap();
        match session.get_text("/missing.xml") {
            Err(ClientError::Status(404)) => {}
            other => panic!("Expected ClientError::Status(404), got {:?}", other),
        }
    }
}
