//! Signal emission for synthetic requests.
//!
//! Listeners run synchronously, in registration order, at the moment a signal is
//! emitted. Every emitted signal is also appended to a history so the exact
//! sequence can be inspected after the fact, including signals emitted before
//! any listener could be attached.

use super::response::SyntheticResponse;
use std::fmt;
use tracing::debug;

/// Callback registered at construction time; fires on the first `response` only.
pub type ResponseCallback = Box<dyn FnOnce(&SyntheticResponse) + Send>;
pub type ResponseListener = Box<dyn FnMut(&SyntheticResponse) + Send>;
pub type SignalListener = Box<dyn FnMut() + Send>;
/// Callback passed to `end`; fires after every signal.
pub type EndCallback = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestEvent {
    Continue,
    Finish,
    Response,
    /// The response payload stream was terminated.
    ResponseEnd,
}

impl RequestEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestEvent::Continue => "continue",
            RequestEvent::Finish => "finish",
            RequestEvent::Response => "response",
            RequestEvent::ResponseEnd => "end",
        }
    }
}

impl fmt::Display for RequestEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum ResponseSubscriber {
    Every(ResponseListener),
    Once(Option<ResponseCallback>),
}

#[derive(Default)]
pub struct RequestEvents {
    history: Vec<RequestEvent>,
    continue_listeners: Vec<SignalListener>,
    finish_listeners: Vec<SignalListener>,
    response_subscribers: Vec<ResponseSubscriber>,
}

impl RequestEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals emitted so far, oldest first.
    pub fn history(&self) -> &[RequestEvent] {
        &self.history
    }

    pub fn has_emitted(&self, event: RequestEvent) -> bool {
        self.history.contains(&event)
    }

    pub fn on_continue(&mut self, listener: SignalListener) {
        self.continue_listeners.push(listener);
    }

    pub fn on_finish(&mut self, listener: SignalListener) {
        self.finish_listeners.push(listener);
    }

    pub fn on_response(&mut self, listener: ResponseListener) {
        self.response_subscribers
            .push(ResponseSubscriber::Every(listener));
    }

    /// Register a listener that is removed after its first call.
    pub fn once_response(&mut self, callback: ResponseCallback) {
        self.response_subscribers
            .push(ResponseSubscriber::Once(Some(callback)));
    }

    /// `ResponseEnd` subscribers attach to the response itself and are counted by
    /// [`SyntheticResponse::end_listener_count`]; this registry holds none.
    pub fn listener_count(&self, event: RequestEvent) -> usize {
        match event {
            RequestEvent::Continue => self.continue_listeners.len(),
            RequestEvent::Finish => self.finish_listeners.len(),
            RequestEvent::Response => self.response_subscribers.len(),
            RequestEvent::ResponseEnd => 0,
        }
    }

    pub(crate) fn emit_continue(&mut self) {
        self.record(RequestEvent::Continue);
        for listener in &mut self.continue_listeners {
            listener();
        }
    }

    pub(crate) fn emit_finish(&mut self) {
        self.record(RequestEvent::Finish);
        for listener in &mut self.finish_listeners {
            listener();
        }
    }

    pub(crate) fn emit_response(&mut self, response: &SyntheticResponse) {
        self.record(RequestEvent::Response);
        for subscriber in &mut self.response_subscribers {
            match subscriber {
                ResponseSubscriber::Every(listener) => listener(response),
                ResponseSubscriber::Once(callback) => {
                    if let Some(callback) = callback.take() {
                        callback(response);
                    }
                }
            }
        }
        self.response_subscribers
            .retain(|s| !matches!(s, ResponseSubscriber::Once(None)));
    }

    pub(crate) fn record_response_end(&mut self) {
        self.record(RequestEvent::ResponseEnd);
    }

    fn record(&mut self, event: RequestEvent) {
        debug!(event = %event, "Emitting request signal");
        self.history.push(event);
    }
}

impl fmt::Debug for RequestEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestEvents")
            .field("history", &self.history)
            .field("continue_listeners", &self.continue_listeners.len())
            .field("finish_listeners", &self.finish_listeners.len())
            .field("response_subscribers", &self.response_subscribers.len())
            .finish()
    }
}
