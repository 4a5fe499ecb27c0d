//! Value types exchanged with request handlers.

use crate::headers::{HeaderList, HeaderValue};
use crate::normalize::RequestOptions;
use bytes::Bytes;
use serde::Serialize;
use url::Url;

const DEFAULT_METHOD: &str = "GET";

/// Structured view of a URL's query string. Repeated keys are kept in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Parse the query component of `url`, percent-decoding keys and values.
    pub fn from_url(url: &Url) -> Self {
        url.query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Descriptor of an outgoing request, handed to the handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterceptedRequest {
    /// Origin and path, without the query string.
    pub url: String,
    pub method: String,
    /// Header names keep the caller's casing.
    pub headers: HeaderList,
    /// Not captured yet; always `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Bytes>,
    pub query: QueryParams,
}

impl InterceptedRequest {
    pub fn from_parts(url: &Url, options: &RequestOptions) -> Self {
        let method = options
            .method
            .as_deref()
            .filter(|m| !m.is_empty())
            .map(str::to_ascii_uppercase)
            .unwrap_or_else(|| DEFAULT_METHOD.to_string());

        Self {
            url: format!("{}{}", url.origin().ascii_serialization(), url.path()),
            method,
            headers: options.headers.clone().unwrap_or_default(),
            body: None,
            query: QueryParams::from_url(url),
        }
    }

    /// Path component of [`url`](Self::url).
    pub fn path(&self) -> String {
        Url::parse(&self.url)
            .map(|url| url.path().to_string())
            .unwrap_or_else(|_| "/".to_string())
    }
}

/// Response description returned by a handler to mock a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockedResponse {
    pub status: u16,
    pub headers: HeaderList,
    pub body: Option<Bytes>,
}

impl MockedResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the body and set `Content-Type: application/json`.
    pub fn json<T: Serialize>(status: u16, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        Ok(Self::new(status)
            .header("Content-Type", "application/json")
            .body(body))
    }
}
