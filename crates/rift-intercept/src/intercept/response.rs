//! Synthetic incoming response.
//!
//! Stands in for the response a real client would hand to its callers. Only the
//! owning [`SyntheticRequest`](super::SyntheticRequest) populates status and
//! headers; the payload is a buffered channel that is terminated exactly once.
//! Callers follow the payload with [`SyntheticResponse::on_data`] and
//! [`SyntheticResponse::on_end`], usually from inside a `response` listener.

use super::types::MockedResponse;
use crate::error::InterceptError;
use crate::headers::HeaderValue;
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

pub type DataListener = Box<dyn FnMut(&Bytes) + Send>;
pub type EndListener = Box<dyn FnOnce() + Send>;

/// Placeholder transport handle shared by a request and its response.
///
/// Never used for I/O; it exists so both sides report the same socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketHandle(Uuid);

impl SocketHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl Default for SocketHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct StreamListeners {
    data: Vec<DataListener>,
    end: Vec<EndListener>,
}

pub struct SyntheticResponse {
    socket: SocketHandle,
    status_code: Option<u16>,
    headers: HashMap<String, HeaderValue>,
    raw_headers: Vec<String>,
    chunks: Vec<Bytes>,
    ended: bool,
    complete: bool,
    // Registration goes through `&self` so `response` listeners can subscribe.
    listeners: Mutex<StreamListeners>,
}

impl SyntheticResponse {
    pub fn new(socket: SocketHandle) -> Self {
        Self {
            socket,
            status_code: None,
            headers: HashMap::new(),
            raw_headers: Vec::new(),
            chunks: Vec::new(),
            ended: false,
            complete: false,
            listeners: Mutex::new(StreamListeners::default()),
        }
    }

    pub fn socket(&self) -> SocketHandle {
        self.socket
    }

    /// `None` until a mock has been applied.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Header mapping with lower-cased names.
    pub fn headers(&self) -> &HashMap<String, HeaderValue> {
        &self.headers
    }

    /// Lookup by exact key. Keys are stored lower-cased.
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    /// Flat `name, value` sequence in the order the mock supplied.
    pub fn raw_headers(&self) -> &[String] {
        &self.raw_headers
    }

    pub fn chunks(&self) -> &[Bytes] {
        &self.chunks
    }

    /// All pushed chunks concatenated.
    pub fn body(&self) -> Bytes {
        match self.chunks.as_slice() {
            [] => Bytes::new(),
            [single] => single.clone(),
            chunks => {
                let mut buf = BytesMut::with_capacity(chunks.iter().map(Bytes::len).sum());
                for chunk in chunks {
                    buf.extend_from_slice(chunk);
                }
                buf.freeze()
            }
        }
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body()).into_owned()
    }

    /// Whether end-of-stream has been pushed.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Whether all data has been delivered.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Subscribe to payload chunks.
    ///
    /// Chunks buffered before registration are delivered immediately, in order.
    /// After end-of-stream there is nothing left to deliver and the listener is dropped.
    pub fn on_data(&self, mut listener: DataListener) {
        for chunk in &self.chunks {
            listener(chunk);
        }
        if !self.ended {
            self.listeners.lock().data.push(listener);
        }
    }

    /// Subscribe to end-of-stream. Fires at most once; a listener registered
    /// after the stream ended is never called.
    pub fn on_end(&self, listener: EndListener) {
        if !self.ended {
            self.listeners.lock().end.push(listener);
        }
    }

    /// Number of pending end-of-stream listeners.
    pub fn end_listener_count(&self) -> usize {
        self.listeners.lock().end.len()
    }

    /// Push one buffered chunk onto the payload channel.
    pub fn push(&mut self, chunk: impl Into<Bytes>) -> Result<(), InterceptError> {
        if self.ended {
            return Err(InterceptError::StreamEnded);
        }
        let chunk = chunk.into();
        for listener in &mut self.listeners.get_mut().data {
            listener(&chunk);
        }
        self.chunks.push(chunk);
        Ok(())
    }

    /// Push end-of-stream and notify `end` listeners. Fails if the stream was
    /// already terminated.
    pub fn push_end(&mut self) -> Result<(), InterceptError> {
        if self.ended {
            return Err(InterceptError::StreamEnded);
        }
        self.ended = true;
        let listeners = self.listeners.get_mut();
        listeners.data.clear();
        for listener in listeners.end.drain(..) {
            listener();
        }
        Ok(())
    }

    /// Copy status, headers and body from `mock`.
    ///
    /// Returns `Ok(false)` without touching anything if the response is already complete.
    pub(crate) fn apply_mock(&mut self, mock: &MockedResponse) -> Result<bool, InterceptError> {
        if self.complete {
            return Ok(false);
        }

        self.status_code = Some(mock.status);
        self.headers = mock.headers.to_lowercase_map();
        self.raw_headers = mock.headers.to_raw();

        if let Some(body) = mock.body.as_ref().filter(|b| !b.is_empty()) {
            self.push(body.clone())?;
        }
        Ok(true)
    }

    /// Terminate the payload channel and mark the response complete.
    pub(crate) fn finish_stream(&mut self) -> Result<(), InterceptError> {
        self.push_end()?;
        self.complete = true;
        Ok(())
    }
}

impl fmt::Debug for SyntheticResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.lock();
        f.debug_struct("SyntheticResponse")
            .field("socket", &self.socket)
            .field("status_code", &self.status_code)
            .field("headers", &self.headers)
            .field("raw_headers", &self.raw_headers)
            .field("chunks", &self.chunks.len())
            .field("ended", &self.ended)
            .field("complete", &self.complete)
            .field("data_listeners", &listeners.data.len())
            .field("end_listeners", &listeners.end.len())
            .finish()
    }
}
