//! Request-override core.
//!
//! ## Module Structure
//!
//! - `types`: intercepted request, query view and mocked response values
//! - `response`: synthetic response populated from a mock, with payload listeners
//! - `events`: signal listeners and emission history
//! - `handler`: the handler trait and closure adapters
//! - `request`: synthetic request driving the handler and signal sequence

mod events;
mod handler;
mod request;
mod response;
mod types;

#[cfg(test)]
mod tests;

pub use events::{
    EndCallback, RequestEvent, RequestEvents, ResponseCallback, ResponseListener, SignalListener,
};
pub use handler::{handler_fn, FnHandler, Passthrough, RequestHandler};
pub use request::{ClientRequest, SyntheticRequest};
pub use response::{DataListener, EndListener, SocketHandle, SyntheticResponse};
pub use types::{InterceptedRequest, MockedResponse, QueryParams};
