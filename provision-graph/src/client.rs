//! Authenticated JSON client for the directory API.

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use provision_sync::RemoteError;

use crate::error::map_ureq_error;

/// Bearer token for the directory API. `Debug` never prints the value.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Shared HTTP agent with the configured timeout.
pub fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(timeout)
        .user_agent(concat!("provision/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Calls the directory API below one base endpoint.
#[derive(Clone)]
pub struct GraphClient {
    agent: ureq::Agent,
    endpoint: String,
    token: AccessToken,
}

impl fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphClient")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token)
            .finish()
    }
}

impl GraphClient {
    pub fn new(agent: ureq::Agent, endpoint: &str, token: AccessToken) -> Self {
        Self {
            agent,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            token,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Absolute URL for a path below the endpoint (`path` starts with `/`).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    /// Refuse links that leave the configured endpoint; the bearer token is
    /// attached to every request this client makes.
    pub fn check_link(&self, link: &str) -> Result<(), RemoteError> {
        let rest = link.strip_prefix(self.endpoint.as_str()).ok_or_else(|| {
            RemoteError::invalid_request(format!(
                "link does not point at the configured endpoint {}",
                self.endpoint
            ))
        })?;
        if rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') {
            Ok(())
        } else {
            Err(RemoteError::invalid_request(format!(
                "link does not point at the configured endpoint {}",
                self.endpoint
            )))
        }
    }

    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, RemoteError> {
        let response = self
            .agent
            .get(url)
            .set("Authorization", &self.token.bearer())
            .set("Accept", "application/json")
            .call()
            .map_err(map_ureq_error)?;
        response
            .into_json::<T>()
            .map_err(|e| RemoteError::decode(format!("invalid JSON payload: {e}")))
    }

    /// POST a JSON body; the response body is discarded.
    pub fn post_json<B: Serialize>(&self, url: &str, body: &B) -> Result<u16, RemoteError> {
        let response = self
            .agent
            .post(url)
            .set("Authorization", &self.token.bearer())
            .send_json(body)
            .map_err(map_ureq_error)?;
        Ok(response.status())
    }
}

/// Reject identifiers that would change the request path.
pub(crate) fn path_segment(value: &str) -> Result<&str, RemoteError> {
    if value.is_empty() || value.contains(['/', '?', '#', '\\']) || value.chars().any(char::is_whitespace) {
        return Err(RemoteError::invalid_request(format!(
            "'{value}' is not a valid object identifier"
        )));
    }
    Ok(value)
}
