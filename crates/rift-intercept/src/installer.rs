//! Installation of the request override.
//!
//! An [`HttpClient`] creates every request through its active [`RequestFactory`].
//! [`Interceptor::install`] swaps in a factory that routes requests through a
//! handler; the returned [`InstallGuard`] puts the previous factory back on
//! `uninstall` or drop. Nothing is global: each client owns its own slot.

use crate::error::InterceptError;
use crate::intercept::{
    ClientRequest, Passthrough, RequestHandler, ResponseCallback, SyntheticRequest,
};
use crate::normalize::{normalize_request_params, NormalizedRequest, RequestOptions, RequestTarget};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Strategy for turning normalized arguments into a request object.
pub trait RequestFactory: Send + Sync {
    fn name(&self) -> &'static str;

    fn create(&self, request: NormalizedRequest) -> Box<dyn ClientRequest>;

    fn is_intercepting(&self) -> bool {
        false
    }
}

/// Default factory. Its requests never receive a mock.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughFactory;

impl RequestFactory for PassthroughFactory {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn create(&self, request: NormalizedRequest) -> Box<dyn ClientRequest> {
        Box::new(SyntheticRequest::new(request, Arc::new(Passthrough)))
    }
}

/// Factory whose requests are resolved by a handler.
pub struct InterceptingFactory {
    handler: Arc<dyn RequestHandler>,
}

impl InterceptingFactory {
    pub fn new(handler: Arc<dyn RequestHandler>) -> Self {
        Self { handler }
    }
}

impl RequestFactory for InterceptingFactory {
    fn name(&self) -> &'static str {
        "intercepting"
    }

    fn create(&self, request: NormalizedRequest) -> Box<dyn ClientRequest> {
        Box::new(SyntheticRequest::new(request, self.handler.clone()))
    }

    fn is_intercepting(&self) -> bool {
        true
    }
}

/// Host for the construction surface.
pub struct HttpClient {
    factory: RwLock<Arc<dyn RequestFactory>>,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::with_factory(Arc::new(PassthroughFactory))
    }

    pub fn with_factory(factory: Arc<dyn RequestFactory>) -> Self {
        Self {
            factory: RwLock::new(factory),
        }
    }

    /// Normalize the call arguments and create a request with the active factory.
    pub fn request(
        &self,
        target: impl Into<RequestTarget>,
        options: Option<RequestOptions>,
        callback: Option<ResponseCallback>,
    ) -> Result<Box<dyn ClientRequest>, InterceptError> {
        let normalized = normalize_request_params(target, options, callback)?;
        let factory = self.factory.read().clone();
        debug!(factory = factory.name(), url = %normalized.url, "Creating client request");
        Ok(factory.create(normalized))
    }

    /// `GET` shortcut.
    pub fn get(
        &self,
        target: impl Into<RequestTarget>,
        callback: Option<ResponseCallback>,
    ) -> Result<Box<dyn ClientRequest>, InterceptError> {
        self.request(target, Some(RequestOptions::new().method("GET")), callback)
    }

    pub fn is_intercepted(&self) -> bool {
        self.factory.read().is_intercepting()
    }

    pub fn factory_name(&self) -> &'static str {
        self.factory.read().name()
    }

    fn replace_factory(&self, factory: Arc<dyn RequestFactory>) -> Arc<dyn RequestFactory> {
        std::mem::replace(&mut *self.factory.write(), factory)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("factory", &self.factory_name())
            .finish()
    }
}

pub struct Interceptor;

impl Interceptor {
    /// Route every request created by `client` through `handler` until the guard is released.
    pub fn install(client: &HttpClient, handler: Arc<dyn RequestHandler>) -> InstallGuard<'_> {
        let previous = client.replace_factory(Arc::new(InterceptingFactory::new(handler)));
        info!(previous = previous.name(), "Installed request interceptor");
        InstallGuard {
            client,
            previous: Some(previous),
        }
    }
}

/// Restores the factory that was active before installation.
#[must_use = "dropping the guard uninstalls the interceptor immediately"]
pub struct InstallGuard<'a> {
    client: &'a HttpClient,
    previous: Option<Arc<dyn RequestFactory>>,
}

impl InstallGuard<'_> {
    pub fn uninstall(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if let Some(previous) = self.previous.take() {
            let name = previous.name();
            self.client.replace_factory(previous);
            info!(restored = name, "Uninstalled request interceptor");
        }
    }
}

impl Drop for InstallGuard<'_> {
    fn drop(&mut self) {
        self.restore();
    }
}
