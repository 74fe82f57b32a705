//! Client-credentials token acquisition.

use provision_core::Settings;
use provision_sync::RemoteError;

use crate::client::AccessToken;
use crate::dto::TokenResponseDto;
use crate::error::map_ureq_error;

/// `{authority}/{tenant}/oauth2/v2.0/token`
pub fn token_url(authority: &str, tenant_id: &str) -> String {
    format!(
        "{}/{}/oauth2/v2.0/token",
        authority.trim_end_matches('/'),
        tenant_id.trim_matches('/')
    )
}

/// Request an app-only token for the configured scopes.
pub fn acquire_token(agent: &ureq::Agent, settings: &Settings) -> Result<AccessToken, RemoteError> {
    let url = token_url(&settings.authority, &settings.tenant_id);
    let scope = settings.scopes.join(" ");
    let response = agent
        .post(&url)
        .send_form(&[
            ("grant_type", "client_credentials"),
            ("client_id", settings.client_id.as_str()),
            ("client_secret", settings.client_secret.as_str()),
            ("scope", scope.as_str()),
        ])
        .map_err(map_ureq_error)?;
    let token: TokenResponseDto = response
        .into_json()
        .map_err(|e| RemoteError::decode(format!("invalid token response: {e}")))?;
    if token.access_token.is_empty() {
        return Err(RemoteError::decode("token response carried an empty access_token"));
    }
    tracing::debug!(expires_in = ?token.expires_in, "access token acquired");
    Ok(AccessToken::new(token.access_token))
}
