use crate::application::services::UpstreamClient;
use crate::domain::entities::{CapturedRequest, Response};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderName, HeaderValue};
use hyper::{Method, Request as HyperRequest, Uri};
use hyper_util::rt::TokioIo;
use log::debug;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_native_tls::{TlsConnector, native_tls};

/// Connection-scoped headers that must not travel past this hop
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authorization",
    "transfer-encoding",
    "upgrade",
    "te",
    "trailer",
];

pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|hop| hop.eq_ignore_ascii_case(name))
}

/// Infrastructure implementation of UpstreamClient using Hyper
///
/// Opens one connection per request; https targets go through native TLS.
pub struct HyperUpstreamClient {
    tls: TlsConnector,
}

impl HyperUpstreamClient {
    pub fn new() -> Result<Self> {
        let tls = native_tls::TlsConnector::new().context("Failed to initialise TLS")?;
        Ok(Self {
            tls: TlsConnector::from(tls),
        })
    }
}

#[async_trait]
impl UpstreamClient for HyperUpstreamClient {
    async fn send(&self, request: CapturedRequest) -> Result<Response> {
        let uri: Uri = request
            .url
            .parse()
            .map_err(|e| anyhow!("Invalid upstream URL '{}': {}", request.url, e))?;
        let host = uri
            .host()
            .ok_or_else(|| anyhow!("Upstream URL has no host: {}", request.url))?
            .to_string();
        let https = uri.scheme_str() == Some("https");
        let port = uri.port_u16().unwrap_or(if https { 443 } else { 80 });

        let hyper_request = RequestAdapter::to_hyper_request(request, &uri)?;
        debug!("Forwarding {} {}", hyper_request.method(), uri);

        let stream = TcpStream::connect((host.as_str(), port))
            .await
            .with_context(|| format!("Failed to connect to {}:{}", host, port))?;

        let response = if https {
            let tls_stream = self
                .tls
                .connect(&host, stream)
                .await
                .with_context(|| format!("TLS handshake with {} failed", host))?;
            exchange(tls_stream, hyper_request).await?
        } else {
            exchange(stream, hyper_request).await?
        };

        ResponseAdapter::to_domain_response(response).await
    }
}

/// Sends a single request over an established stream
pub(crate) async fn exchange<S>(
    stream: S,
    request: HyperRequest<Full<Bytes>>,
) -> Result<hyper::Response<Incoming>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .map_err(|e| anyhow!("HTTP handshake failed: {}", e))?;

    tokio::spawn(async move {
        if let Err(err) = connection.await {
            debug!("Upstream connection closed with error: {}", err);
        }
    });

    sender
        .send_request(request)
        .await
        .map_err(|e| anyhow!("HTTP request execution failed: {}", e))
}

/// Adapter for converting captured requests to Hyper requests
struct RequestAdapter;

impl RequestAdapter {
    fn to_hyper_request(request: CapturedRequest, uri: &Uri) -> Result<HyperRequest<Full<Bytes>>> {
        let method = MethodAdapter::to_hyper_method(&request.method)?;
        let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        let body = BodyAdapter::to_hyper_body(&request);

        let mut builder = HyperRequest::builder().method(method).uri(path);
        for (name, value) in HeaderAdapter::forwardable(&request.headers)? {
            builder = builder.header(name, value);
        }

        builder
            .body(body)
            .map_err(|e| anyhow!("Failed to build HTTP request: {}", e))
    }
}

/// Adapter for converting Hyper responses into domain responses
struct ResponseAdapter;

impl ResponseAdapter {
    async fn to_domain_response(response: hyper::Response<Incoming>) -> Result<Response> {
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| anyhow!("Failed to read response body: {}", e))?
            .to_bytes()
            .to_vec();

        Ok(Response { status, headers, body })
    }
}

/// Adapter for converting method tokens to Hyper methods
struct MethodAdapter;

impl MethodAdapter {
    fn to_hyper_method(method: &str) -> Result<Method> {
        Method::from_bytes(method.as_bytes())
            .map_err(|_| anyhow!("Unsupported HTTP method: '{}'", method))
    }
}

/// Adapter for converting captured bodies to Hyper bodies
struct BodyAdapter;

impl BodyAdapter {
    fn to_hyper_body(request: &CapturedRequest) -> Full<Bytes> {
        match request.content() {
            Some(bytes) => Full::new(Bytes::copy_from_slice(bytes)),
            None => Full::new(Bytes::new()),
        }
    }
}

/// Adapter for handling HTTP headers
struct HeaderAdapter;

impl HeaderAdapter {
    /// Headers to send upstream; framing headers are left to hyper
    fn forwardable(headers: &[(String, String)]) -> Result<Vec<(HeaderName, HeaderValue)>> {
        headers
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name) && !name.eq_ignore_ascii_case("content-length"))
            .map(|(name, value)| -> Result<(HeaderName, HeaderValue)> {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|_| anyhow!("Invalid header name: '{}'", name))?;
                let value = HeaderValue::from_str(value)
                    .map_err(|_| anyhow!("Invalid value for header '{}'", name))?;
                Ok((name, value))
            })
            .collect()
    }
}
