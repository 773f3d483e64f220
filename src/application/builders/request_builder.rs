use crate::domain::entities::{CapturedRequest, Header};
use crate::domain::value_objects::Body;
use anyhow::{Result, anyhow};

/// Assembles a `CapturedRequest` from pieces a host observes one at a time
#[derive(Default)]
pub struct RequestBuilder {
    method: Option<String>,
    url: Option<String>,
    headers: Vec<Header>,
    body: Option<Body>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Appends a header, keeping earlier ones with the same name
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.body = Some(Body(bytes.into()));
        self
    }

    pub fn build(self) -> Result<CapturedRequest> {
        Ok(CapturedRequest {
            method: self.method.ok_or_else(|| anyhow!("Method is required"))?,
            url: self.url.ok_or_else(|| anyhow!("URL is required"))?,
            headers: self.headers,
            body: self.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_duplicate_headers_in_order() {
        let request = RequestBuilder::new()
            .method("GET")
            .url("http://localhost/")
            .header("Cookie", "a=1")
            .header("Accept", "*/*")
            .header("Cookie", "b=2")
            .build()
            .unwrap();

        let names: Vec<_> = request.headers.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["Cookie", "Accept", "Cookie"]);
        assert_eq!(request.headers[2].1, "b=2");
    }

    #[test]
    fn requires_method_and_url() {
        assert!(RequestBuilder::new().url("http://a/").build().is_err());
        assert!(RequestBuilder::new().method("GET").build().is_err());
    }
}
