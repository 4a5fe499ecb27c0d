//! Synthetic outgoing request.
//!
//! Emulates the lifecycle of a client request object. Resolution goes through a
//! [`RequestHandler`] instead of a socket: `end` builds the intercepted request,
//! awaits the handler once, applies the mock if any, then emits
//! `finish` -> `response` -> stream end, and finally runs the `end` callback.

use super::events::{
    EndCallback, RequestEvents, ResponseCallback, ResponseListener, SignalListener,
};
use super::handler::RequestHandler;
use super::response::{SocketHandle, SyntheticResponse};
use super::types::InterceptedRequest;
use crate::error::InterceptError;
use crate::headers::HeaderValue;
use crate::normalize::{NormalizedRequest, RequestOptions};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use url::Url;
use uuid::Uuid;

const EXPECT_HEADER: &str = "expect";
const CONTINUE_VALUE: &str = "100-continue";

/// Surface shared by every request a [`RequestFactory`](crate::RequestFactory) hands out.
///
/// Callers hold `Box<dyn ClientRequest>` and never depend on the concrete type.
#[async_trait]
pub trait ClientRequest: fmt::Debug + Send {
    fn id(&self) -> Uuid;

    fn url(&self) -> &Url;

    /// Effective method, upper-cased, `GET` when none was given.
    fn method(&self) -> String;

    fn is_finished(&self) -> bool;

    /// Placeholder transport handle, shared with the response.
    fn socket(&self) -> SocketHandle;

    /// Alias of [`socket`](Self::socket).
    fn connection(&self) -> SocketHandle {
        self.socket()
    }

    fn response(&self) -> &SyntheticResponse;

    fn events(&self) -> &RequestEvents;

    fn on_continue(&mut self, listener: SignalListener);

    fn on_finish(&mut self, listener: SignalListener);

    fn on_response(&mut self, listener: ResponseListener);

    fn once_response(&mut self, callback: ResponseCallback);

    /// Resolve the request. Only the first call runs the handler; every later
    /// call fails with [`InterceptError::AlreadyFinished`], even if the first failed.
    async fn end(&mut self, callback: Option<EndCallback>) -> Result<(), InterceptError>;
}

pub struct SyntheticRequest {
    id: Uuid,
    url: Url,
    options: RequestOptions,
    socket: SocketHandle,
    response: SyntheticResponse,
    events: RequestEvents,
    handler: Arc<dyn RequestHandler>,
    end_called: bool,
    finished: bool,
}

impl SyntheticRequest {
    /// Build a request from normalized arguments.
    ///
    /// A `100-continue` expectation emits `continue` here, before the caller
    /// gets the request back. A construction callback becomes a one-shot
    /// `response` listener.
    pub fn new(normalized: NormalizedRequest, handler: Arc<dyn RequestHandler>) -> Self {
        let NormalizedRequest {
            url,
            options,
            callback,
        } = normalized;

        let socket = SocketHandle::new();
        let mut request = Self {
            id: Uuid::new_v4(),
            url,
            options,
            socket,
            response: SyntheticResponse::new(socket),
            events: RequestEvents::new(),
            handler,
            end_called: false,
            finished: false,
        };

        trace!(request_id = %request.id, url = %request.url, "Created synthetic request");

        if expects_continue(&request.options) {
            request.events.emit_continue();
        }

        if let Some(callback) = callback {
            request.events.once_response(callback);
        }

        request
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// The descriptor `end` hands to the handler.
    pub fn intercepted_request(&self) -> InterceptedRequest {
        InterceptedRequest::from_parts(&self.url, &self.options)
    }
}

#[async_trait]
impl ClientRequest for SyntheticRequest {
    fn id(&self) -> Uuid {
        self.id
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn method(&self) -> String {
        self.intercepted_request().method
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn socket(&self) -> SocketHandle {
        self.socket
    }

    fn response(&self) -> &SyntheticResponse {
        &self.response
    }

    fn events(&self) -> &RequestEvents {
        &self.events
    }

    fn on_continue(&mut self, listener: SignalListener) {
        self.events.on_continue(listener);
    }

    fn on_finish(&mut self, listener: SignalListener) {
        self.events.on_finish(listener);
    }

    fn on_response(&mut self, listener: ResponseListener) {
        self.events.on_response(listener);
    }

    fn once_response(&mut self, callback: ResponseCallback) {
        self.events.once_response(callback);
    }

    async fn end(&mut self, callback: Option<EndCallback>) -> Result<(), InterceptError> {
        if self.end_called {
            return Err(InterceptError::AlreadyFinished(self.id));
        }
        self.end_called = true;

        let intercepted = self.intercepted_request();
        trace!(
            request_id = %self.id,
            method = %intercepted.method,
            url = %intercepted.url,
            "Invoking request handler"
        );

        let mocked = self
            .handler
            .handle(&intercepted, &self.response)
            .await
            .map_err(|e| {
                warn!(request_id = %self.id, error = %e, "Request handler failed");
                InterceptError::Handler(e)
            })?;

        match mocked {
            Some(mock) => {
                if self.response.apply_mock(&mock)? {
                    debug!(
                        request_id = %self.id,
                        status = mock.status,
                        headers = mock.headers.len(),
                        "Applied mocked response"
                    );
                } else {
                    debug!(request_id = %self.id, "Response already complete, mock ignored");
                }
            }
            None => {
                // Pass-through to a real transport is not performed.
                warn!(
                    request_id = %self.id,
                    url = %intercepted.url,
                    "No mocked response; request passes through without a transport"
                );
            }
        }

        self.finished = true;
        self.events.emit_finish();
        self.events.emit_response(&self.response);
        self.response.finish_stream()?;
        self.events.record_response_end();

        if let Some(callback) = callback {
            callback();
        }
        Ok(())
    }
}

impl fmt::Debug for SyntheticRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntheticRequest")
            .field("id", &self.id)
            .field("url", &self.url.as_str())
            .field("options", &self.options)
            .field("end_called", &self.end_called)
            .field("finished", &self.finished)
            .field("events", &self.events)
            .finish()
    }
}

fn expects_continue(options: &RequestOptions) -> bool {
    options
        .headers
        .as_ref()
        .and_then(|headers| headers.get_ignore_case(EXPECT_HEADER))
        .is_some_and(|value| matches!(value, HeaderValue::Single(v) if v == CONTINUE_VALUE))
}
