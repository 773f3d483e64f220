use crate::application::builders::curl_builder::CurlCommandBuilder;
use crate::domain::entities::{CapturedRequest, CurlCommand, Response};
use anyhow::Result;
use async_trait::async_trait;
use log::warn;
use std::sync::Arc;

/// Capability a host invokes once per intercepted request
pub trait RequestHandler: Send + Sync {
    fn on_request(&self, request: &CapturedRequest);
}

/// Destination for rendered commands
#[cfg_attr(test, mockall::automock)]
pub trait CommandSink: Send + Sync {
    fn emit(&self, command: &CurlCommand) -> Result<()>;
}

/// Trait for upstream clients to enable mocking and dependency inversion
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn send(&self, request: CapturedRequest) -> Result<Response>;
}

/// Handler that prints every observed request as a curl command
pub struct CurlAddon {
    builder: CurlCommandBuilder,
    sink: Box<dyn CommandSink>,
}

impl CurlAddon {
    pub fn new(builder: CurlCommandBuilder, sink: Box<dyn CommandSink>) -> Self {
        Self { builder, sink }
    }

    pub fn format(&self, request: &CapturedRequest) -> CurlCommand {
        self.builder.build(request)
    }
}

impl RequestHandler for CurlAddon {
    fn on_request(&self, request: &CapturedRequest) {
        let command = self.format(request);
        if let Err(err) = self.sink.emit(&command) {
            warn!("Failed to write curl command for {}: {:#}", request.url, err);
        }
    }
}

/// Application service for the capture host
/// Hands every request to the handler, then forwards it when a target is set
pub struct CaptureService {
    handler: Arc<dyn RequestHandler>,
    upstream: Option<Box<dyn UpstreamClient>>,
}

impl CaptureService {
    pub fn new(handler: Arc<dyn RequestHandler>, upstream: Option<Box<dyn UpstreamClient>>) -> Self {
        Self { handler, upstream }
    }

    pub async fn handle(&self, request: CapturedRequest) -> Result<Response> {
        self.handler.on_request(&request);

        match &self.upstream {
            Some(client) => client.send(request).await,
            None => Ok(Response::no_content()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::builders::curl_builder::FormatOptions;
    use crate::application::builders::request_builder::RequestBuilder;
    use anyhow::anyhow;
    use mockall::predicate::eq;
    use std::sync::Mutex;

    fn sample() -> CapturedRequest {
        RequestBuilder::new()
            .method("DELETE")
            .url("http://localhost:9000/items/7")
            .header("Authorization", "Bearer t")
            .build()
            .unwrap()
    }

    #[test]
    fn addon_emits_exactly_one_command() {
        let mut sink = MockCommandSink::new();
        sink.expect_emit()
            .with(eq(CurlCommand::from_tokens(vec![
                "curl -X DELETE".to_string(),
                "-H 'Authorization: Bearer t'".to_string(),
                "'http://localhost:9000/items/7'".to_string(),
            ])))
            .times(1)
            .returning(|_| Ok(()));

        let addon = CurlAddon::new(CurlCommandBuilder::new(FormatOptions::default()), Box::new(sink));
        addon.on_request(&sample());
    }

    #[test]
    fn sink_failure_is_absorbed() {
        let mut sink = MockCommandSink::new();
        sink.expect_emit()
            .times(2)
            .returning(|_| Err(anyhow!("broken pipe")));

        let addon = CurlAddon::new(CurlCommandBuilder::new(FormatOptions::default()), Box::new(sink));
        addon.on_request(&sample());
        addon.on_request(&sample());
    }

    struct Recorder(Mutex<Vec<String>>);

    impl RequestHandler for Recorder {
        fn on_request(&self, request: &CapturedRequest) {
            self.0.lock().unwrap().push(request.url.clone());
        }
    }

    #[tokio::test]
    async fn capture_only_answers_no_content() {
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let service = CaptureService::new(recorder.clone(), None);

        let response = service.handle(sample()).await.unwrap();

        assert_eq!(response.status, 204);
        assert_eq!(*recorder.0.lock().unwrap(), vec!["http://localhost:9000/items/7"]);
    }

    #[tokio::test]
    async fn forwards_after_handling() {
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let mut upstream = MockUpstreamClient::new();
        upstream
            .expect_send()
            .withf(|req| req.method == "DELETE")
            .times(1)
            .returning(|_| {
                Ok(Response {
                    status: 200,
                    headers: vec![("content-type".into(), "text/plain".into())],
                    body: b"gone".to_vec(),
                })
            });

        let service = CaptureService::new(recorder.clone(), Some(Box::new(upstream)));
        let response = service.handle(sample()).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"gone");
        assert_eq!(recorder.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upstream_error_propagates_to_host() {
        let mut upstream = MockUpstreamClient::new();
        upstream
            .expect_send()
            .returning(|_| Err(anyhow!("connection refused")));

        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let service = CaptureService::new(recorder.clone(), Some(Box::new(upstream)));

        assert!(service.handle(sample()).await.is_err());
        assert_eq!(recorder.0.lock().unwrap().len(), 1);
    }
}
