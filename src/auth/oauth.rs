//! OAuth password-grant token acquisition.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::config::OAuthAuth;
use crate::error::FrostError;

/// Default token type when the endpoint omits one.
const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// A token is considered stale this long before the server says it expires.
const EXPIRY_SKEW: Duration = Duration::from_secs(60);

/// An OAuth access token held in memory.
#[derive(Clone)]
pub struct Token {
    value: String,
    token_type: String,
    obtained_at: Instant,
    expires_at: Option<Instant>,
}

impl Token {
    /// Creates a token obtained now.
    ///
    /// `expires_in` is the lifetime reported by the token endpoint, if any.
    pub fn new(
        value: impl Into<String>,
        token_type: impl Into<String>,
        expires_in: Option<Duration>,
    ) -> Self {
        let obtained_at = Instant::now();
        Self {
            value: value.into(),
            token_type: token_type.into(),
            obtained_at,
            expires_at: expires_in.map(|lifetime| obtained_at + lifetime.saturating_sub(EXPIRY_SKEW)),
        }
    }

    /// The raw access token. Never log this.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The token type, e.g. `Bearer`.
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// When the token was received.
    pub fn obtained_at(&self) -> Instant {
        self.obtained_at
    }

    /// Returns true once the token should no longer be sent.
    ///
    /// Tokens without a reported lifetime never go stale on their own.
    pub fn is_stale(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.value)
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("value", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("obtained_at", &self.obtained_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Body returned by the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Determines the token endpoint for an OAuth configuration.
///
/// An explicit `token_url` wins; otherwise the instance name is taken from
/// the first label of the instance host.
///
/// # Errors
///
/// Returns `FrostError::Configuration` if the instance URL has no host with
/// at least two dot-separated labels.
pub fn token_url(oauth: &OAuthAuth, instance_url: &str) -> Result<String, FrostError> {
    if let Some(explicit) = oauth
        .token_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
    {
        return Ok(explicit.to_string());
    }

    derive_token_url(instance_url)
}

/// Builds `https://{instance}.service-now.com/oauth_token.do` from an instance URL.
pub fn derive_token_url(instance_url: &str) -> Result<String, FrostError> {
    let invalid = || FrostError::config(format!("invalid instance URL: {}", instance_url));

    let parsed = Url::parse(instance_url).map_err(|_| invalid())?;
    let host = parsed.host_str().ok_or_else(invalid)?;

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 || labels[0].is_empty() {
        return Err(invalid());
    }

    Ok(format!("https://{}.service-now.com/oauth_token.do", labels[0]))
}

/// Performs the password grant against `token_url`.
///
/// # Errors
///
/// Returns `FrostError::Authentication` on network failure, a non-2xx
/// status, an undecodable body, or a body without `access_token`.
pub async fn request_token(
    http: &Client,
    token_url: &str,
    oauth: &OAuthAuth,
) -> Result<Token, FrostError> {
    let form = [
        ("grant_type", "password"),
        ("client_id", oauth.client_id.as_str()),
        ("client_secret", oauth.client_secret.as_str()),
        ("username", oauth.username.as_str()),
        ("password", oauth.password.as_str()),
    ];

    let response = http
        .post(token_url)
        .form(&form)
        .send()
        .await
        .map_err(|e| FrostError::authentication_with(format!("failed to get OAuth token: {}", e), e))?;

    let response = response.error_for_status().map_err(|e| {
        let status = e
            .status()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown status".to_string());
        FrostError::authentication_with(format!("token endpoint returned {}", status), e)
    })?;

    let body: TokenResponse = response
        .json()
        .await
        .map_err(|e| FrostError::authentication_with("token endpoint returned an invalid body", e))?;

    let value = body
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| FrostError::authentication("no access token in response"))?;
    let token_type = body
        .token_type
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string());

    Ok(Token::new(
        value,
        token_type,
        body.expires_in.map(Duration::from_secs),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oauth(token_url: Option<&str>) -> OAuthAuth {
        OAuthAuth {
            client_id: "client".into(),
            client_secret: "secret".into(),
            username: "admin".into(),
            password: "pw".into(),
            token_url: token_url.map(str::to_string),
        }
    }

    #[test]
    fn test_derive_token_url_uses_first_host_label() {
        let url = derive_token_url("https://dev12345.service-now.com").unwrap();
        assert_eq!(url, "https://dev12345.service-now.com/oauth_token.do");
    }

    #[test]
    fn test_derive_token_url_ignores_path_and_port() {
        let url = derive_token_url("https://acme.example.org:8443/sub/path").unwrap();
        assert_eq!(url, "https://acme.service-now.com/oauth_token.do");
    }

    #[test]
    fn test_derive_token_url_rejects_single_label_host() {
        let err = derive_token_url("http://localhost:8080").unwrap_err();
        assert!(matches!(err, FrostError::Configuration(_)));
    }

    #[test]
    fn test_derive_token_url_rejects_garbage() {
        assert!(derive_token_url("not a url").is_err());
    }

    #[test]
    fn test_explicit_token_url_wins() {
        let url = token_url(&oauth(Some("https://sso.example.com/token")), "http://localhost").unwrap();
        assert_eq!(url, "https://sso.example.com/token");
    }

    #[test]
    fn test_blank_token_url_falls_back_to_derivation() {
        let url = token_url(&oauth(Some("  ")), "https://dev1.service-now.com").unwrap();
        assert_eq!(url, "https://dev1.service-now.com/oauth_token.do");
    }

    #[test]
    fn test_token_without_lifetime_never_stale() {
        let token = Token::new("abc", "Bearer", None);
        assert!(!token.is_stale(Instant::now() + Duration::from_secs(86_400)));
        assert_eq!(token.authorization(), "Bearer abc");
    }

    #[test]
    fn test_token_stale_before_reported_expiry() {
        let token = Token::new("abc", "Bearer", Some(Duration::from_secs(3600)));
        let now = token.obtained_at();
        assert!(!token.is_stale(now));
        assert!(token.is_stale(now + Duration::from_secs(3600 - 30)));
    }

    #[test]
    fn test_token_debug_redacts_value() {
        let token = Token::new("super-secret-token", "Bearer", None);
        assert!(!format!("{:?}", token).contains("super-secret-token"));
    }
}
