//! Stub-backed request handler.

use super::types::{RecordedRequest, StubConfig, StubResponseConfig};
use crate::config::InterceptConfig;
use crate::intercept::{InterceptedRequest, MockedResponse, RequestHandler, SyntheticResponse};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Resolves requests against an ordered list of stubs; the first match wins.
pub struct StubHandler {
    stubs: Vec<StubConfig>,
    default_response: Option<StubResponseConfig>,
    record_requests: bool,
    recorded_requests: RwLock<Vec<RecordedRequest>>,
    request_count: AtomicU64,
}

impl StubHandler {
    pub fn new(stubs: Vec<StubConfig>) -> Self {
        Self {
            stubs,
            default_response: None,
            record_requests: false,
            recorded_requests: RwLock::new(Vec::new()),
            request_count: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: InterceptConfig) -> Self {
        Self {
            default_response: config.default_response,
            record_requests: config.record_requests,
            ..Self::new(config.stubs)
        }
    }

    pub fn with_default_response(mut self, response: StubResponseConfig) -> Self {
        self.default_response = Some(response);
        self
    }

    pub fn with_recording(mut self, enabled: bool) -> Self {
        self.record_requests = enabled;
        self
    }

    pub fn stubs(&self) -> &[StubConfig] {
        &self.stubs
    }

    /// Index and stub of the first match.
    pub fn find_matching_stub(&self, request: &InterceptedRequest) -> Option<(usize, &StubConfig)> {
        self.stubs
            .iter()
            .enumerate()
            .find(|(_, stub)| stub.predicate.matches(request))
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.recorded_requests.read().clone()
    }

    pub fn clear_recorded_requests(&self) {
        self.recorded_requests.write().clear();
    }
}

#[async_trait]
impl RequestHandler for StubHandler {
    async fn handle(
        &self,
        request: &InterceptedRequest,
        _response: &SyntheticResponse,
    ) -> anyhow::Result<Option<MockedResponse>> {
        self.request_count.fetch_add(1, Ordering::Relaxed);

        let matched = self.find_matching_stub(request);
        let matched_index = matched.map(|(index, _)| index);

        if self.record_requests {
            self.recorded_requests.write().push(RecordedRequest {
                request: request.clone(),
                matched_stub: matched_index,
                timestamp: chrono::Utc::now().to_rfc3339(),
            });
        }

        match matched {
            Some((index, stub)) => {
                debug!(
                    stub_index = index,
                    stub_id = stub.id.as_deref().unwrap_or(""),
                    method = %request.method,
                    url = %request.url,
                    "Stub matched"
                );
                Ok(Some(stub.response.to_mocked_response()))
            }
            None => {
                debug!(method = %request.method, url = %request.url, "No stub matched");
                Ok(self
                    .default_response
                    .as_ref()
                    .map(StubResponseConfig::to_mocked_response))
            }
        }
    }
}
