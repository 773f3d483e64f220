use crate::domain::content_coding::decode_content;
use crate::domain::entities::{CapturedRequest, CurlCommand};
use crate::domain::errors::BodyDecodeFailure;
use crate::domain::value_objects::{Charset, escape_single_quotes, shell_quote};
use log::debug;

/// Headers the replaying client either recomputes or cannot express
const ALWAYS_SKIPPED: [&str; 2] = ["content-length", ":authority"];

/// Token emitted in place of a body that is not representable as text
pub const BINARY_PLACEHOLDER: &str = "# (Binary content ignored)";

/// How header and URL tokens are quoted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuotingPolicy {
    /// Only the body escapes embedded quotes; header values and the URL are
    /// placed inside single quotes untouched.
    #[default]
    Compatible,
    /// Every single-quoted token escapes embedded quotes.
    Strict,
}

#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    pub quoting: QuotingPolicy,
    /// Extra header names to drop, compared case-insensitively
    pub extra_skipped_headers: Vec<String>,
}

/// Renders captured requests as curl invocations
pub struct CurlCommandBuilder {
    options: FormatOptions,
}

impl CurlCommandBuilder {
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }

    pub fn build(&self, request: &CapturedRequest) -> CurlCommand {
        let mut tokens = vec![format!("curl -X {}", request.method)];

        tokens.extend(
            request
                .headers
                .iter()
                .filter(|(name, _)| !self.is_skipped(name))
                .map(|(name, value)| format!("-H {}", self.quote(&format!("{name}: {value}")))),
        );

        if let Some(token) = self.body_token(request) {
            tokens.push(token);
        }

        tokens.push(self.quote(&request.url));
        CurlCommand::from_tokens(tokens)
    }

    fn is_skipped(&self, name: &str) -> bool {
        ALWAYS_SKIPPED
            .iter()
            .copied()
            .chain(self.options.extra_skipped_headers.iter().map(String::as_str))
            .any(|skipped| skipped.eq_ignore_ascii_case(name))
    }

    fn quote(&self, text: &str) -> String {
        match self.options.quoting {
            QuotingPolicy::Compatible => format!("'{text}'"),
            QuotingPolicy::Strict => shell_quote(text),
        }
    }

    fn body_token(&self, request: &CapturedRequest) -> Option<String> {
        let content = request.content()?;

        match decode_body(request, content) {
            Ok(text) if text.is_empty() => None,
            Ok(text) => Some(format!("-d '{}'", escape_single_quotes(&text))),
            Err(failure) => {
                debug!("{} {}: body not rendered: {}", request.method, request.url, failure);
                Some(BINARY_PLACEHOLDER.to_string())
            }
        }
    }
}

fn decode_body(request: &CapturedRequest, content: &[u8]) -> Result<String, BodyDecodeFailure> {
    let content = decode_content(request.header("content-encoding"), content);
    Charset::from_content_type(request.header("content-type")).decode(&content)
}
