//! Configuration for stub-backed interception.
//!
//! Files are parsed with `serde_yaml`, so both YAML and JSON documents load.
//!
//! ```yaml
//! recordRequests: true
//! stubs:
//!   - predicate:
//!       method: GET
//!       path: /users
//!     response:
//!       status: 200
//!       headers:
//!         Content-Type: application/json
//!       body: {"ok": true}
//! defaultResponse:
//!   status: 404
//! ```

use crate::error::InterceptError;
use crate::stubs::{StubConfig, StubResponseConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

const MIN_STATUS: u16 = 100;
const MAX_STATUS: u16 = 999;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterceptConfig {
    #[serde(default)]
    pub stubs: Vec<StubConfig>,
    #[serde(default)]
    pub record_requests: bool,
    /// Returned when no stub matches. Absent means pass-through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_response: Option<StubResponseConfig>,
}

impl InterceptConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InterceptError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            InterceptError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_yaml_str(&contents)?;
        info!(
            path = %path.display(),
            stubs = config.stubs.len(),
            "Loaded intercept configuration"
        );
        Ok(config)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, InterceptError> {
        let config: InterceptConfig =
            serde_yaml::from_str(contents).map_err(|e| InterceptError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), InterceptError> {
        for (index, stub) in self.stubs.iter().enumerate() {
            validate_response(&stub.response, &format!("stubs[{index}].response"))?;
            if stub.predicate.headers.iter().any(|(name, _)| name.is_empty()) {
                return Err(InterceptError::Config(format!(
                    "stubs[{index}].predicate.headers: header name must not be empty"
                )));
            }
        }

        if let Some(ref response) = self.default_response {
            validate_response(response, "defaultResponse")?;
        }
        Ok(())
    }
}

fn validate_response(response: &StubResponseConfig, location: &str) -> Result<(), InterceptError> {
    if !(MIN_STATUS..=MAX_STATUS).contains(&response.status) {
        return Err(InterceptError::Config(format!(
            "{location}.status: {} is not a valid HTTP status code",
            response.status
        )));
    }
    if response.headers.iter().any(|(name, _)| name.is_empty()) {
        return Err(InterceptError::Config(format!(
            "{location}.headers: header name must not be empty"
        )));
    }
    Ok(())
}
