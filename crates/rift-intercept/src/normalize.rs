//! Request argument normalization.
//!
//! Client calls come in several shapes: a URL string, a parsed URL, an options
//! record, any of those plus extra options, and an optional completion callback.
//! [`normalize_request_params`] turns every shape into one [`NormalizedRequest`]
//! with a resolved URL and an options record.

use crate::error::InterceptError;
use crate::headers::{HeaderList, HeaderValue};
use crate::intercept::ResponseCallback;
use std::fmt;
use url::{ParseError, Url};

const DEFAULT_PROTOCOL: &str = "http";
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PATH: &str = "/";

/// Options accepted alongside (or instead of) a URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub method: Option<String>,
    pub headers: Option<HeaderList>,
    /// Scheme, with or without the trailing colon (`"https"` or `"https:"`).
    pub protocol: Option<String>,
    /// Host name, optionally with `:port`.
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Path including any query string.
    pub path: Option<String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.headers
            .get_or_insert_with(HeaderList::new)
            .insert(name, value);
        self
    }

    pub fn headers(mut self, headers: HeaderList) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    fn has_location(&self) -> bool {
        self.protocol.is_some() || self.host.is_some() || self.port.is_some() || self.path.is_some()
    }

    /// Fields set on `other` take precedence.
    fn merge(self, other: RequestOptions) -> RequestOptions {
        RequestOptions {
            method: other.method.or(self.method),
            headers: other.headers.or(self.headers),
            protocol: other.protocol.or(self.protocol),
            host: other.host.or(self.host),
            port: other.port.or(self.port),
            path: other.path.or(self.path),
        }
    }
}

/// The first argument of a client call.
#[derive(Debug, Clone)]
pub enum RequestTarget {
    Text(String),
    Url(Url),
    Options(RequestOptions),
}

impl From<&str> for RequestTarget {
    fn from(value: &str) -> Self {
        RequestTarget::Text(value.to_string())
    }
}

impl From<String> for RequestTarget {
    fn from(value: String) -> Self {
        RequestTarget::Text(value)
    }
}

impl From<Url> for RequestTarget {
    fn from(value: Url) -> Self {
        RequestTarget::Url(value)
    }
}

impl From<RequestOptions> for RequestTarget {
    fn from(value: RequestOptions) -> Self {
        RequestTarget::Options(value)
    }
}

/// Canonical `(url, options, callback)` triple consumed by the synthetic request.
pub struct NormalizedRequest {
    pub url: Url,
    pub options: RequestOptions,
    pub callback: Option<ResponseCallback>,
}

impl fmt::Debug for NormalizedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizedRequest")
            .field("url", &self.url.as_str())
            .field("options", &self.options)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// Normalize any supported call shape into a [`NormalizedRequest`].
pub fn normalize_request_params(
    target: impl Into<RequestTarget>,
    options: Option<RequestOptions>,
    callback: Option<ResponseCallback>,
) -> Result<NormalizedRequest, InterceptError> {
    let extra = options.unwrap_or_default();

    let (url, options) = match target.into() {
        RequestTarget::Text(text) => {
            let base = Url::parse(&text)?;
            (resolve_url(&extra, Some(&base))?, extra)
        }
        RequestTarget::Url(base) => (resolve_url(&extra, Some(&base))?, extra),
        RequestTarget::Options(target_options) => {
            let merged = target_options.merge(extra);
            (resolve_url(&merged, None)?, merged)
        }
    };

    Ok(NormalizedRequest {
        url,
        options,
        callback,
    })
}

fn resolve_url(options: &RequestOptions, base: Option<&Url>) -> Result<Url, InterceptError> {
    if let Some(base) = base {
        if !options.has_location() {
            return Ok(base.clone());
        }
    }

    let scheme = options
        .protocol
        .as_deref()
        .map(|p| p.trim_end_matches(':'))
        .or_else(|| base.map(Url::scheme))
        .unwrap_or(DEFAULT_PROTOCOL);

    // Only an explicit host option can carry its own port; `host_str` never does.
    let (host, host_has_port) = match options.host.as_deref() {
        Some(host) => (host, has_explicit_port(host)),
        None => (base.and_then(Url::host_str).unwrap_or(DEFAULT_HOST), false),
    };

    let path = match (&options.path, base) {
        (Some(path), _) => path.clone(),
        (None, Some(base)) => match base.query() {
            Some(query) => format!("{}?{}", base.path(), query),
            None => base.path().to_string(),
        },
        (None, None) => DEFAULT_PATH.to_string(),
    };
    let path = if path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    };

    let mut url = Url::parse(&format!("{scheme}://{host}{path}"))?;

    // A port given in `host` wins over the port option and the base URL's port.
    if !host_has_port {
        if let Some(port) = options.port.or_else(|| base.and_then(Url::port)) {
            url.set_port(Some(port))
                .map_err(|()| InterceptError::InvalidUrl(ParseError::InvalidPort))?;
        }
    }

    Ok(url)
}

/// `example.com:8080` or `[::1]:8080`, but not `[::1]`.
fn has_explicit_port(host: &str) -> bool {
    host.rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
}
