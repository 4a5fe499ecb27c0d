//! In-process HTTP client request interception for Rift.
//!
//! Requests issued through an [`HttpClient`] are resolved by a [`RequestHandler`]
//! before any network I/O: the handler inspects an [`InterceptedRequest`] and
//! returns a [`MockedResponse`] (or nothing, to pass through). The synthetic
//! request then emits the same signal sequence a real client request would.
//!
//! # Example
//!
//! ```no_run
//! use rift_intercept::{handler_fn, HttpClient, Interceptor, MockedResponse};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), rift_intercept::InterceptError> {
//! let client = HttpClient::new();
//! let _guard = Interceptor::install(
//!     &client,
//!     Arc::new(handler_fn(|_request| async {
//!         Ok::<_, anyhow::Error>(Some(MockedResponse::new(200).body("hello")))
//!     })),
//! );
//!
//! let mut request = client.get("http://example.com/greeting", None)?;
//! request.end(None).await?;
//! assert_eq!(request.response().body_text(), "hello");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod headers;
pub mod installer;
pub mod intercept;
pub mod normalize;
pub mod stubs;

pub use config::InterceptConfig;
pub use error::InterceptError;
pub use headers::{HeaderList, HeaderValue};
pub use installer::{
    HttpClient, InstallGuard, InterceptingFactory, Interceptor, PassthroughFactory, RequestFactory,
};
pub use intercept::{
    handler_fn, ClientRequest, DataListener, EndCallback, EndListener, InterceptedRequest,
    MockedResponse, Passthrough, QueryParams, RequestEvent, RequestEvents, RequestHandler,
    ResponseCallback, ResponseListener, SignalListener, SocketHandle, SyntheticRequest,
    SyntheticResponse,
};
pub use normalize::{normalize_request_params, NormalizedRequest, RequestOptions, RequestTarget};
pub use stubs::{RecordedRequest, StubConfig, StubHandler, StubPredicate, StubResponseConfig};
