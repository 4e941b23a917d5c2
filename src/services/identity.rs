use crate::core::search::TokenSource;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Errors from the client-credential token exchange
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("token request rejected: {0}")]
    Rejected(String),

    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OAuth2 client-credential token source for the entity store.
///
/// Exchanges the configured client id/secret for a bearer token scoped to
/// the Dataverse environment. No caching: one exchange per search request.
pub struct IdentityClient {
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    client: Client,
}

impl IdentityClient {
    pub fn new(authority_url: String, environment_url: String, client_id: String, client_secret: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            token_url: format!("{}/oauth2/v2.0/token", authority_url.trim_end_matches('/')),
            client_id,
            client_secret,
            scope: format!("{}/.default", environment_url.trim_end_matches('/')),
            client,
        }
    }
}

#[async_trait]
impl TokenSource for IdentityClient {
    async fn acquire_token(&self) -> Result<String, AuthError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];

        tracing::debug!("Requesting token from {}", self.token_url);

        let response = self.client.post(&self.token_url).form(&form).send().await?;

        if !response.status().is_success() {
            return Err(AuthError::Rejected(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        Ok(token.access_token)
    }
}
