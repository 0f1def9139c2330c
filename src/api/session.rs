//! Credential and token state for one process lifetime

use serde_json::json;
use tracing::{debug, info};

use super::error::{ApiError, Result};
use super::models::TokenPair;
use super::transport::{ApiRequest, Transport};

/// Supplied once at startup, immutable afterwards.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// The process-wide authentication state: the credentials and the single
/// active token pair. Both exchange operations overwrite the pair on
/// success only; a failed exchange leaves the previous pair in place.
#[derive(Debug)]
pub struct Session {
    credentials: Credentials,
    tokens: Option<TokenPair>,
}

impl Session {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            tokens: None,
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|pair| pair.access.as_str())
    }

    /// Exchange username/password for a fresh token pair.
    pub async fn authenticate(&mut self, transport: &dyn Transport) -> Result<()> {
        debug!(username = %self.credentials.username, "exchanging credentials for tokens");
        let request = ApiRequest::post("users/auth").json(json!({
            "email": self.credentials.username,
            "password": self.credentials.password,
        }));

        let response = transport.execute(request).await?;
        if !response.is_success() {
            return Err(ApiError::Auth {
                status: response.status,
                body: response.text_lossy(),
            });
        }

        let pair: TokenPair = response.json()?;
        self.tokens = Some(pair);
        info!("authenticated");
        Ok(())
    }

    /// Exchange the held refresh token for a fresh pair.
    pub async fn refresh(&mut self, transport: &dyn Transport) -> Result<()> {
        let Some(current) = &self.tokens else {
            return Err(ApiError::Refresh("no refresh token held".to_string()));
        };

        debug!("refreshing access token");
        let request = ApiRequest::post("users/refresh")
            .bearer(&current.access)
            .json(json!({ "refresh": current.refresh }));

        let response = transport.execute(request).await?;
        if !response.is_success() {
            return Err(ApiError::Refresh(format!(
                "server rejected refresh with status {}: {}",
                response.status,
                response.text_lossy()
            )));
        }

        let pair: TokenPair = response.json()?;
        self.tokens = Some(pair);
        debug!("token pair replaced");
        Ok(())
    }
}
