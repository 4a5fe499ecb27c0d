//! Declarative stubs: predicates over intercepted requests mapped to mocked responses.

mod handler;
mod types;

pub use handler::StubHandler;
pub use types::{RecordedRequest, StubConfig, StubPredicate, StubResponseConfig};
