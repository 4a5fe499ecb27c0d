//! Handler invocation protocol.
//!
//! A handler receives the intercepted request and the response instance that will
//! later be populated, and decides whether to mock. It only gets a shared borrow of
//! the response: handlers describe the response they want by returning a
//! [`MockedResponse`], the synthetic request writes it afterwards.

use super::response::SyntheticResponse;
use super::types::{InterceptedRequest, MockedResponse};
use async_trait::async_trait;
use std::future::Future;

#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// `Ok(Some(_))` mocks the request, `Ok(None)` defers to pass-through.
    /// `Err(_)` is a hard failure, never an implicit pass-through.
    async fn handle(
        &self,
        request: &InterceptedRequest,
        response: &SyntheticResponse,
    ) -> anyhow::Result<Option<MockedResponse>>;
}

/// Handler built from an async closure over an owned request.
pub struct FnHandler<F> {
    f: F,
}

/// Wrap an async closure as a [`RequestHandler`].
///
/// ```no_run
/// use rift_intercept::{handler_fn, MockedResponse};
///
/// let handler = handler_fn(|request| async move {
///     if request.url.ends_with("/health") {
///         return Ok::<_, anyhow::Error>(Some(MockedResponse::new(200).body("ok")));
///     }
///     Ok(None)
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(InterceptedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Option<MockedResponse>>> + Send + 'static,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> RequestHandler for FnHandler<F>
where
    F: Fn(InterceptedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Option<MockedResponse>>> + Send + 'static,
{
    async fn handle(
        &self,
        request: &InterceptedRequest,
        _response: &SyntheticResponse,
    ) -> anyhow::Result<Option<MockedResponse>> {
        (self.f)(request.clone()).await
    }
}

/// Never mocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

#[async_trait]
impl RequestHandler for Passthrough {
    async fn handle(
        &self,
        _request: &InterceptedRequest,
        _response: &SyntheticResponse,
    ) -> anyhow::Result<Option<MockedResponse>> {
        Ok(None)
    }
}
