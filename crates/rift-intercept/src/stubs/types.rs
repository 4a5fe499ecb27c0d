//! Stub definitions for declarative mocking.

use crate::headers::HeaderList;
use crate::intercept::{InterceptedRequest, MockedResponse};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_status_code() -> u16 {
    200
}

/// A predicate and the response returned when it matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StubConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub predicate: StubPredicate,
    pub response: StubResponseConfig,
}

/// Equality predicate over request fields. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StubPredicate {
    /// Compared case-insensitively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Origin and path, without query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Every key must be present with this value among its values.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub query: HashMap<String, String>,
    /// Names compare case-insensitively; every listed value must be present.
    #[serde(default, skip_serializing_if = "HeaderList::is_empty")]
    pub headers: HeaderList,
}

impl StubPredicate {
    pub fn matches(&self, request: &InterceptedRequest) -> bool {
        if let Some(ref method) = self.method {
            if !method.eq_ignore_ascii_case(&request.method) {
                return false;
            }
        }

        if let Some(ref url) = self.url {
            if *url != request.url {
                return false;
            }
        }

        if let Some(ref path) = self.path {
            if *path != request.path() {
                return false;
            }
        }

        let query_matches = self
            .query
            .iter()
            .all(|(key, value)| request.query.get_all(key).contains(&value.as_str()));
        if !query_matches {
            return false;
        }

        self.headers.iter().all(|(name, expected)| {
            request
                .headers
                .get_ignore_case(name)
                .is_some_and(|actual| {
                    expected
                        .as_slice()
                        .iter()
                        .all(|value| actual.as_slice().contains(value))
                })
        })
    }
}

/// Configured response. A string body is used verbatim, other JSON is serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StubResponseConfig {
    #[serde(default = "default_status_code")]
    pub status: u16,
    #[serde(default, skip_serializing_if = "HeaderList::is_empty")]
    pub headers: HeaderList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl Default for StubResponseConfig {
    fn default() -> Self {
        Self {
            status: default_status_code(),
            headers: HeaderList::new(),
            body: None,
        }
    }
}

impl StubResponseConfig {
    pub fn to_mocked_response(&self) -> MockedResponse {
        let body = match &self.body {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(text)) => Some(Bytes::from(text.clone())),
            Some(other) => Some(Bytes::from(other.to_string())),
        };

        MockedResponse {
            status: self.status,
            headers: self.headers.clone(),
            body,
        }
    }
}

/// Request seen by a recording stub handler.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedRequest {
    #[serde(flatten)]
    pub request: InterceptedRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_stub: Option<usize>,
    pub timestamp: String,
}
