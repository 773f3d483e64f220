use crate::domain::value_objects::Body;
use serde::Deserialize;
use std::fmt;

/// A single request header as it appeared on the wire
pub type Header = (String, String);

/// Represents an HTTP request observed by the host
///
/// The host owns reconstruction of the absolute URL and hands over headers in
/// wire order. Names may repeat; nothing here is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CapturedRequest {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: Option<Body>,
}

impl CapturedRequest {
    /// Returns the first value of a header, matching the name case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Body bytes, treating an empty body the same as an absent one
    pub fn content(&self) -> Option<&[u8]> {
        self.body
            .as_ref()
            .map(Body::as_bytes)
            .filter(|bytes| !bytes.is_empty())
    }
}

/// Represents a rendered curl invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurlCommand(String);

impl CurlCommand {
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        CurlCommand(tokens.join(" "))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Represents the response a host relays back to its client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<Header>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn no_content() -> Self {
        Response {
            status: 204,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }
}
