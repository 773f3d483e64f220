use crate::application::builders::request_builder::RequestBuilder;
use crate::application::services::CaptureService;
use crate::domain::entities::{CapturedRequest, Response};
use crate::domain::value_objects::Target;
use crate::infrastructure::http_client::is_hop_by_hop;

use anyhow::{Context, Result, anyhow};
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::{HOST, HeaderName, HeaderValue};
use hyper::http::request::Parts;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request as HyperRequest, Response as HyperResponse, StatusCode};
use hyper_util::rt::TokioIo;
use log::{debug, info, warn};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Reverse-mode HTTP/1.1 host that feeds every request to a capture service
pub struct CaptureServer {
    listener: TcpListener,
    context: Arc<ServerContext>,
}

struct ServerContext {
    service: CaptureService,
    target: Option<Target>,
}

impl CaptureServer {
    pub async fn bind(addr: SocketAddr, target: Option<Target>, service: CaptureService) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        Ok(Self {
            listener,
            context: Arc::new(ServerContext { service, target }),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until the task is dropped
    pub async fn serve(self) -> Result<()> {
        match &self.context.target {
            Some(target) => info!(
                "Listening on http://{} -> {}://{}",
                self.local_addr()?,
                target.scheme,
                target.authority
            ),
            None => info!("Listening on http://{} (capture only)", self.local_addr()?),
        }

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    warn!("Failed to accept connection: {}", err);
                    continue;
                }
            };
            debug!("Accepted connection from {}", peer);

            let context = Arc::clone(&self.context);
            tokio::spawn(async move {
                let service = service_fn(move |request| {
                    let context = Arc::clone(&context);
                    async move { Ok::<_, Infallible>(context.respond(request).await) }
                });

                if let Err(err) = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await
                {
                    debug!("Connection from {} ended with error: {}", peer, err);
                }
            });
        }
    }
}

impl ServerContext {
    async fn respond(&self, request: HyperRequest<Incoming>) -> HyperResponse<Full<Bytes>> {
        let captured = match capture(request, self.target.as_ref()).await {
            Ok(captured) => captured,
            Err(err) => {
                warn!("Rejected request: {:#}", err);
                return plain(StatusCode::BAD_REQUEST, "bad request\n");
            }
        };

        let url = captured.url.clone();
        match self.service.handle(captured).await.and_then(to_hyper_response) {
            Ok(response) => response,
            Err(err) => {
                warn!("Upstream request for {} failed: {:#}", url, err);
                plain(StatusCode::BAD_GATEWAY, "bad gateway\n")
            }
        }
    }
}

/// Materializes an incoming request as the host-side record
async fn capture(request: HyperRequest<Incoming>, target: Option<&Target>) -> Result<CapturedRequest> {
    let (parts, body) = request.into_parts();
    let body = body
        .collect()
        .await
        .map_err(|e| anyhow!("Failed to read request body: {}", e))?
        .to_bytes();

    captured_from_parts(&parts, body, target)
}

fn captured_from_parts(parts: &Parts, body: Bytes, target: Option<&Target>) -> Result<CapturedRequest> {
    let path = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let url = match (target, parts.uri.authority()) {
        (Some(target), _) => target.url_for(path),
        (None, Some(_)) => parts.uri.to_string(),
        (None, None) => {
            let host = parts
                .headers
                .get(HOST)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| anyhow!("Request has no Host header"))?;
            format!("http://{}{}", host, path)
        }
    };

    let mut builder = RequestBuilder::new().method(parts.method.as_str()).url(url);
    for (name, value) in &parts.headers {
        let value = match target {
            Some(target) if *name == HOST => target.authority.clone(),
            _ => String::from_utf8_lossy(value.as_bytes()).into_owned(),
        };
        builder = builder.header(name.as_str(), value);
    }
    if let Some(target) = target {
        // HTTP/1.0 clients may omit Host; the upstream sender will not add one
        if !parts.headers.contains_key(HOST) {
            builder = builder.header(HOST.as_str(), target.authority.clone());
        }
    }
    if !body.is_empty() {
        builder = builder.body(body.to_vec());
    }
    builder.build()
}

fn to_hyper_response(response: Response) -> Result<HyperResponse<Full<Bytes>>> {
    let mut hyper_response = HyperResponse::new(Full::new(Bytes::from(response.body)));
    *hyper_response.status_mut() = StatusCode::from_u16(response.status)
        .map_err(|_| anyhow!("Invalid upstream status {}", response.status))?;

    let headers = hyper_response.headers_mut();
    for (name, value) in response.headers.iter().filter(|(name, _)| !is_hop_by_hop(name)) {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| anyhow!("Invalid upstream header name '{}'", name))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| anyhow!("Invalid upstream value for header '{}'", name))?;
        headers.append(name, value);
    }
    Ok(hyper_response)
}

fn plain(status: StatusCode, message: &'static str) -> HyperResponse<Full<Bytes>> {
    let mut response = HyperResponse::new(Full::new(Bytes::from_static(message.as_bytes())));
    *response.status_mut() = status;
    response
}
