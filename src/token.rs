use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::api::client::EdgeClient;
use crate::error::{DeployError, DeployResult};

const TOKEN_RESOURCE: &str = "/identity/v1/oauth2/token";

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Lifetime of the token in seconds.
    expires_in: i64,
}

/// Exchange the stored client credentials for a fresh access token and cache
/// it, with its expiry, in the credential store.
pub async fn get_access_token(client: &EdgeClient) -> DeployResult<String> {
    let mut credentials = client.store.load()?;

    let body = TokenRequest {
        client_id: &credentials.client_id,
        client_secret: &credentials.client_secret,
        grant_type: "client_credentials",
    };

    let resp = client
        .send(Method::POST, TOKEN_RESOURCE, Some(&body))
        .await
        .map_err(|e| match e {
            DeployError::Connection { .. } => DeployError::Auth(e.to_string()),
            other => other,
        })?;

    if !resp.is_success() {
        return Err(DeployError::Auth(resp.message()));
    }

    let token: TokenResponse = resp
        .json()
        .map_err(|e| DeployError::Auth(e.to_string()))?;

    credentials.access_token = Some(token.access_token.clone());
    credentials.access_token_expiry = Some(now() + token.expires_in);
    client.store.save(&credentials)?;

    tracing::debug!("Access token stored in {}", client.store.path().display());
    Ok(token.access_token)
}

/// Whether the cached token is absent or past its expiry. Never refreshes.
pub fn is_access_token_expired(client: &EdgeClient) -> DeployResult<bool> {
    Ok(client.store.load()?.is_token_expired(now()))
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
