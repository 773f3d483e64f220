use crate::domain::errors::BodyDecodeFailure;
use anyhow::{Result, anyhow};
use http::Uri;
use serde::Deserialize;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Represents a materialized request body
///
/// Records may carry the body either as text or as a raw byte array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BodyRepr")]
pub struct Body(pub Vec<u8>);

#[derive(Deserialize)]
#[serde(untagged)]
enum BodyRepr {
    Text(String),
    Bytes(Vec<u8>),
}

impl From<BodyRepr> for Body {
    fn from(repr: BodyRepr) -> Self {
        match repr {
            BodyRepr::Text(text) => Body(text.into_bytes()),
            BodyRepr::Bytes(bytes) => Body(bytes),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body(bytes)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body(text.as_bytes().to_vec())
    }
}

impl Body {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Text encodings the body decoder understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Utf8,
    Latin1,
}

impl Charset {
    /// Picks the charset declared by a `Content-Type` value
    ///
    /// Anything missing or unrecognised decodes as UTF-8.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let declared = content_type.and_then(|value| {
            value.split(';').skip(1).find_map(|param| {
                let (key, val) = param.split_once('=')?;
                key.trim()
                    .eq_ignore_ascii_case("charset")
                    .then(|| val.trim().trim_matches('"').to_ascii_lowercase())
            })
        });

        match declared.as_deref() {
            Some("iso-8859-1" | "latin1" | "latin-1" | "iso8859-1" | "l1") => Charset::Latin1,
            _ => Charset::Utf8,
        }
    }

    /// Decodes bytes leniently
    ///
    /// A leading BOM is tolerated. Any invalid sequence, or a NUL anywhere in
    /// the text, is reported as a failure.
    pub fn decode(self, bytes: &[u8]) -> Result<String, BodyDecodeFailure> {
        let text = match self {
            Charset::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Charset::Utf8 => decode_utf8_lenient(bytes)?,
        };

        match text.find('\0') {
            Some(position) => Err(BodyDecodeFailure::NulByte { position }),
            None => Ok(text),
        }
    }
}

fn decode_utf8_lenient(bytes: &[u8]) -> Result<String, BodyDecodeFailure> {
    let bom = if bytes.starts_with(UTF8_BOM) { UTF8_BOM.len() } else { 0 };

    std::str::from_utf8(&bytes[bom..])
        .map(str::to_owned)
        .map_err(|err| BodyDecodeFailure::InvalidUtf8 {
            offset: bom + err.valid_up_to(),
        })
}

/// Represents a validated reverse-mode target (scheme and authority only)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub scheme: String,
    pub authority: String,
}

impl Target {
    /// Creates a new Target with validation
    ///
    /// # Arguments
    /// * `url` - An absolute `http` or `https` URL; any path is ignored
    ///
    /// # Returns
    /// * `Ok(Target)` - Validated target
    /// * `Err(anyhow::Error)` - If the URL is not absolute or not http(s)
    pub fn new(url: &str) -> Result<Self> {
        let uri = url
            .parse::<Uri>()
            .map_err(|e| anyhow!("Invalid target URL: {}", e))?;
        let scheme = match uri.scheme_str() {
            Some(scheme @ ("http" | "https")) => scheme.to_string(),
            _ => return Err(anyhow!("Target URL must start with http:// or https://")),
        };
        let authority = uri
            .authority()
            .ok_or_else(|| anyhow!("Target URL has no host: {}", url))?
            .to_string();
        Ok(Target { scheme, authority })
    }

    /// Absolute URL for a request path on this target
    pub fn url_for(&self, path_and_query: &str) -> String {
        format!("{}://{}{}", self.scheme, self.authority, path_and_query)
    }
}

/// Escapes `'` for use inside a POSIX single-quoted string
pub fn escape_single_quotes(text: &str) -> String {
    text.replace('\'', r"'\''")
}

/// Wraps text in single quotes, escaping embedded quotes
pub fn shell_quote(text: &str) -> String {
    format!("'{}'", escape_single_quotes(text))
}
