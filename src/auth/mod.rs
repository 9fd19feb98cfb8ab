//! Request authentication for the ServiceNow REST API.
//!
//! [`CredentialProvider`] turns one of three static auth configurations into
//! the headers an outbound request needs. In OAuth mode it also owns the
//! access token: fetched lazily on the first header request, cached in
//! memory, and replaced only by [`HeaderProvider::refresh`] or once the
//! lifetime reported by the token endpoint has run out.
//!
//! # Security
//!
//! Passwords, client secrets, API keys and tokens are never logged. Use
//! [`HeaderProvider::secrets`] to scrub them from error text.

mod oauth;

use std::collections::BTreeMap;
use std::time::Instant;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Client;
use tokio::sync::Mutex;

use crate::config::{AuthConfig, AuthMode, ConfigProvider, DestinationConfig};
use crate::error::FrostError;

pub use oauth::{derive_token_url, Token};

/// Header map attached to one outbound request.
///
/// Ordered so two calls producing the same headers compare byte-identical.
pub type HeaderSet = BTreeMap<String, String>;

/// Something that can authenticate an outbound request.
#[async_trait]
pub trait HeaderProvider: Send + Sync {
    /// Returns the full header set for one request.
    async fn headers(&self) -> Result<HeaderSet, FrostError>;

    /// Forces new credentials to be obtained, where that means anything.
    async fn refresh(&self) -> Result<(), FrostError> {
        Ok(())
    }

    /// Secret strings that must be scrubbed from any outgoing message.
    fn secrets(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Produces request headers for Basic, OAuth or API-key authentication.
///
/// Safe to share between concurrent tool calls: the OAuth token slot is
/// guarded by an async mutex held across the fetch, so concurrent first
/// requests perform a single token fetch.
pub struct CredentialProvider {
    config: AuthConfig,
    instance_url: String,
    http: Client,
    token: Mutex<Option<Token>>,
}

impl CredentialProvider {
    /// Creates a provider for the given auth configuration.
    ///
    /// The destination supplies the instance URL (for token endpoint
    /// derivation) and the timeout applied to token requests. The auth
    /// config is not validated here; a missing sub-config surfaces as a
    /// `Configuration` error from [`HeaderProvider::headers`].
    ///
    /// # Errors
    ///
    /// Returns `FrostError::Transport` if the HTTP client fails to initialize.
    pub fn new(config: AuthConfig, destination: &DestinationConfig) -> Result<Self, FrostError> {
        let http = Client::builder()
            .timeout(destination.timeout())
            .build()
            .map_err(FrostError::Transport)?;

        Ok(Self {
            config,
            instance_url: destination.base_url().to_string(),
            http,
            token: Mutex::new(None),
        })
    }

    /// The active authentication mode.
    pub fn mode(&self) -> AuthMode {
        self.config.mode
    }

    /// Returns a copy of the cached OAuth token, if any.
    pub async fn token(&self) -> Option<Token> {
        self.token.lock().await.clone()
    }

    /// Obtains a new OAuth token and caches it.
    ///
    /// On failure the cache is left empty, so the next header request tries
    /// again instead of remembering the failure.
    ///
    /// # Errors
    ///
    /// Returns `FrostError::Configuration` if the OAuth sub-config is absent
    /// or no token endpoint can be determined, and
    /// `FrostError::Authentication` if the token request fails.
    pub async fn fetch_token(&self) -> Result<(), FrostError> {
        let mut slot = self.token.lock().await;
        self.fetch_into(&mut slot).await
    }

    async fn fetch_into(&self, slot: &mut Option<Token>) -> Result<(), FrostError> {
        *slot = None;

        let oauth_config = self
            .config
            .oauth
            .as_ref()
            .ok_or_else(|| FrostError::config("oauth auth configuration is required"))?;
        let token_url = oauth::token_url(oauth_config, &self.instance_url)?;

        tracing::debug!(token_url = %token_url, "Requesting OAuth token");

        match oauth::request_token(&self.http, &token_url, oauth_config).await {
            Ok(token) => {
                tracing::debug!(token_type = %token.token_type(), "OAuth token obtained");
                *slot = Some(token);
                Ok(())
            }
            Err(e) => {
                let secrets = self.secrets();
                let secrets: Vec<&str> = secrets.iter().map(String::as_str).collect();
                tracing::error!(error = %e.sanitized_display(&secrets), "Failed to get OAuth token");
                Err(e)
            }
        }
    }

    async fn oauth_authorization(&self) -> Result<String, FrostError> {
        let mut slot = self.token.lock().await;

        let needs_fetch = match slot.as_ref() {
            Some(token) => token.is_stale(Instant::now()),
            None => true,
        };
        if needs_fetch {
            if slot.is_some() {
                tracing::debug!("Cached OAuth token is stale, fetching a new one");
            }
            self.fetch_into(&mut slot).await?;
        }

        slot.as_ref()
            .map(Token::authorization)
            .ok_or_else(|| FrostError::authentication("no access token available"))
    }
}

#[async_trait]
impl HeaderProvider for CredentialProvider {
    async fn headers(&self) -> Result<HeaderSet, FrostError> {
        let mut headers = HeaderSet::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        match self.config.mode {
            AuthMode::Basic => {
                let basic = self
                    .config
                    .basic
                    .as_ref()
                    .ok_or_else(|| FrostError::config("basic auth configuration is required"))?;
                let encoded = STANDARD.encode(format!("{}:{}", basic.username, basic.password));
                headers.insert("Authorization".to_string(), format!("Basic {}", encoded));
            }
            AuthMode::OAuth => {
                let authorization = self.oauth_authorization().await?;
                headers.insert("Authorization".to_string(), authorization);
            }
            AuthMode::ApiKey => {
                let api_key = self
                    .config
                    .api_key
                    .as_ref()
                    .ok_or_else(|| FrostError::config("api_key auth configuration is required"))?;
                headers.insert(api_key.header_name.clone(), api_key.api_key.clone());
            }
        }

        Ok(headers)
    }

    async fn refresh(&self) -> Result<(), FrostError> {
        if self.config.mode == AuthMode::OAuth {
            tracing::debug!("Refreshing OAuth token");
            self.fetch_token().await
        } else {
            Ok(())
        }
    }

    fn secrets(&self) -> Vec<String> {
        let mut secrets = Vec::new();
        if let Some(basic) = &self.config.basic {
            secrets.push(basic.password.clone());
        }
        if let Some(oauth) = &self.config.oauth {
            secrets.push(oauth.client_secret.clone());
            secrets.push(oauth.password.clone());
        }
        if let Some(api_key) = &self.config.api_key {
            secrets.push(api_key.api_key.clone());
        }
        // Skipped while a fetch holds the slot; the slot is empty then anyway.
        if let Ok(slot) = self.token.try_lock() {
            if let Some(token) = slot.as_ref() {
                secrets.push(token.value().to_string());
            }
        }
        secrets
    }
}
