//! Configuration management for the Frost MCP server.
//!
//! This module holds the static inputs of the core: the authentication
//! configuration (one of three modes) and the destination configuration
//! (instance URL plus transport settings). Both can be loaded from
//! environment variables or handed over already built by another loader.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::FrostError;

/// Default header carrying the API key.
pub const DEFAULT_API_KEY_HEADER: &str = "X-ServiceNow-API-Key";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Authentication scheme used for outbound requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMode {
    /// HTTP Basic with a static username and password.
    #[serde(rename = "basic")]
    Basic,
    /// OAuth password grant; a bearer token is fetched and cached.
    #[serde(rename = "oauth")]
    OAuth,
    /// Static API key sent in a configurable header.
    #[serde(rename = "api_key")]
    ApiKey,
}

impl AuthMode {
    /// Returns the configuration name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Basic => "basic",
            AuthMode::OAuth => "oauth",
            AuthMode::ApiKey => "api_key",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMode {
    type Err = FrostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(AuthMode::Basic),
            "oauth" => Ok(AuthMode::OAuth),
            "api_key" | "apikey" => Ok(AuthMode::ApiKey),
            other => Err(FrostError::config(format!(
                "unknown auth type '{}' (expected basic, oauth or api_key)",
                other
            ))),
        }
    }
}

/// Credentials for HTTP Basic authentication.
#[derive(Clone, Serialize, Deserialize)]
pub struct BasicAuth {
    /// Account name.
    pub username: String,
    /// Account password. Never logged.
    pub password: String,
}

/// Credentials for the OAuth password grant.
///
/// These are only ever sent to the token endpoint, never as request headers.
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuthAuth {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret. Never logged.
    pub client_secret: String,
    /// Account name used in the password grant.
    pub username: String,
    /// Account password used in the password grant. Never logged.
    pub password: String,
    /// Explicit token endpoint; derived from the instance URL when absent.
    #[serde(default)]
    pub token_url: Option<String>,
}

/// Static API key credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiKeyAuth {
    /// The key value. Never logged.
    pub api_key: String,
    /// Header the key is sent in.
    #[serde(default = "default_api_key_header")]
    pub header_name: String,
}

fn default_api_key_header() -> String {
    DEFAULT_API_KEY_HEADER.to_string()
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Debug for OAuthAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthAuth")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("token_url", &self.token_url)
            .finish()
    }
}

impl fmt::Debug for ApiKeyAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyAuth")
            .field("api_key", &"[REDACTED]")
            .field("header_name", &self.header_name)
            .finish()
    }
}

/// Authentication configuration: a mode selector plus its sub-config.
///
/// Exactly the sub-config matching `mode` is populated. The constructors
/// guarantee this; configs deserialized from elsewhere should go through
/// [`AuthConfig::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// The active authentication mode.
    #[serde(rename = "type")]
    pub mode: AuthMode,
    /// Basic credentials, present only in `Basic` mode.
    #[serde(default)]
    pub basic: Option<BasicAuth>,
    /// OAuth credentials, present only in `OAuth` mode.
    #[serde(default)]
    pub oauth: Option<OAuthAuth>,
    /// API key credentials, present only in `ApiKey` mode.
    #[serde(default)]
    pub api_key: Option<ApiKeyAuth>,
}

impl AuthConfig {
    /// Builds a Basic auth configuration.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            mode: AuthMode::Basic,
            basic: Some(BasicAuth {
                username: username.into(),
                password: password.into(),
            }),
            oauth: None,
            api_key: None,
        }
    }

    /// Builds an OAuth configuration.
    pub fn oauth(oauth: OAuthAuth) -> Self {
        Self {
            mode: AuthMode::OAuth,
            basic: None,
            oauth: Some(oauth),
            api_key: None,
        }
    }

    /// Builds an API key configuration using the default header name.
    pub fn api_key(key: impl Into<String>) -> Self {
        Self::api_key_with_header(key, DEFAULT_API_KEY_HEADER)
    }

    /// Builds an API key configuration with a custom header name.
    pub fn api_key_with_header(key: impl Into<String>, header_name: impl Into<String>) -> Self {
        Self {
            mode: AuthMode::ApiKey,
            basic: None,
            oauth: None,
            api_key: Some(ApiKeyAuth {
                api_key: key.into(),
                header_name: header_name.into(),
            }),
        }
    }

    /// Checks that the populated sub-config matches the mode one to one.
    ///
    /// # Errors
    ///
    /// Returns `FrostError::Configuration` if the active sub-config is absent
    /// or another mode's sub-config is also present.
    pub fn validate(&self) -> Result<(), FrostError> {
        let present = [
            (AuthMode::Basic, self.basic.is_some()),
            (AuthMode::OAuth, self.oauth.is_some()),
            (AuthMode::ApiKey, self.api_key.is_some()),
        ];

        for (mode, is_present) in present {
            if mode == self.mode && !is_present {
                return Err(FrostError::config(format!(
                    "{} auth configuration is required",
                    mode
                )));
            }
            if mode != self.mode && is_present {
                return Err(FrostError::config(format!(
                    "{} auth configuration must not be set when auth type is {}",
                    mode, self.mode
                )));
            }
        }

        if let Some(api_key) = &self.api_key {
            if api_key.header_name.trim().is_empty() {
                return Err(FrostError::config("API key header name cannot be empty"));
            }
        }

        Ok(())
    }
}

/// Read-only view of where and how requests are sent.
///
/// Implemented by [`DestinationConfig`]; tool functions depend on this
/// capability rather than on the concrete type.
pub trait ConfigProvider: Send + Sync {
    /// Instance base URL without a trailing slash.
    fn base_url(&self) -> &str;

    /// Per-request timeout.
    fn timeout(&self) -> Duration;

    /// Whether verbose request logging is enabled.
    fn debug(&self) -> bool;

    /// Root of the REST table API.
    fn api_url(&self) -> String {
        format!("{}/api/now", self.base_url())
    }
}

/// The remote instance and transport settings.
///
/// Immutable after construction and shared read-only by every tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationConfig {
    base_url: String,
    timeout_secs: u64,
    debug: bool,
}

impl DestinationConfig {
    /// Creates a destination with the default timeout and debug off.
    ///
    /// # Errors
    ///
    /// Returns `FrostError::Configuration` if the URL is empty or lacks an
    /// http(s) scheme.
    pub fn new(base_url: impl Into<String>) -> Result<Self, FrostError> {
        Ok(Self {
            base_url: validate_base_url(base_url.into())?,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            debug: false,
        })
    }

    /// Sets the request timeout in seconds.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Enables or disables debug logging of request traffic.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Timeout in whole seconds.
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }
}

impl ConfigProvider for DestinationConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn debug(&self) -> bool {
        self.debug
    }
}

/// Complete process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Where requests go.
    pub destination: DestinationConfig,
    /// How requests authenticate.
    pub auth: AuthConfig,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SERVICENOW_INSTANCE_URL` (required)
    /// - `SERVICENOW_AUTH_TYPE`: `basic` (default), `oauth` or `api_key`
    /// - `SERVICENOW_USERNAME`, `SERVICENOW_PASSWORD`: basic and oauth
    /// - `SERVICENOW_CLIENT_ID`, `SERVICENOW_CLIENT_SECRET`, `SERVICENOW_TOKEN_URL`: oauth
    /// - `SERVICENOW_API_KEY`, `SERVICENOW_API_KEY_HEADER`: api_key
    /// - `SERVICENOW_TIMEOUT`: seconds, at least 1, default 30
    /// - `SERVICENOW_DEBUG`: `true` or `false`
    ///
    /// # Errors
    ///
    /// Returns `FrostError::Configuration` if any required variable is
    /// missing or a value fails validation.
    ///
    /// # Example
    ///
    /// ```ignore
    /// dotenvy::dotenv().ok();
    /// let config = Config::from_env()?;
    /// ```
    pub fn from_env() -> Result<Self, FrostError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FrostError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let require = |name: &str| get(name).ok_or_else(|| FrostError::missing_env(name));

        let base_url = require("SERVICENOW_INSTANCE_URL")?;

        let timeout_secs = match get("SERVICENOW_TIMEOUT") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    FrostError::config(format!(
                        "SERVICENOW_TIMEOUT must be a positive whole number of seconds, got '{}'",
                        raw
                    ))
                })?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let debug = get("SERVICENOW_DEBUG")
            .map(|raw| raw.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let destination = DestinationConfig::new(base_url)?
            .with_timeout_secs(timeout_secs)
            .with_debug(debug);

        let mode = match get("SERVICENOW_AUTH_TYPE") {
            Some(raw) => raw.parse::<AuthMode>()?,
            None => AuthMode::Basic,
        };

        let auth = match mode {
            AuthMode::Basic => {
                let (username, password) =
                    match (get("SERVICENOW_USERNAME"), get("SERVICENOW_PASSWORD")) {
                        (Some(u), Some(p)) => (u, p),
                        _ => {
                            return Err(FrostError::config(
                                "SERVICENOW_USERNAME and SERVICENOW_PASSWORD are required for basic authentication",
                            ))
                        }
                    };
                validate_secret("SERVICENOW_PASSWORD", &password)?;
                AuthConfig::basic(username, password)
            }
            AuthMode::OAuth => {
                let fields = (
                    get("SERVICENOW_CLIENT_ID"),
                    get("SERVICENOW_CLIENT_SECRET"),
                    get("SERVICENOW_USERNAME"),
                    get("SERVICENOW_PASSWORD"),
                );
                let (Some(client_id), Some(client_secret), Some(username), Some(password)) =
                    fields
                else {
                    return Err(FrostError::config(
                        "SERVICENOW_CLIENT_ID, SERVICENOW_CLIENT_SECRET, SERVICENOW_USERNAME and \
                         SERVICENOW_PASSWORD are required for OAuth authentication",
                    ));
                };
                validate_secret("SERVICENOW_CLIENT_SECRET", &client_secret)?;
                AuthConfig::oauth(OAuthAuth {
                    client_id,
                    client_secret,
                    username,
                    password,
                    token_url: get("SERVICENOW_TOKEN_URL"),
                })
            }
            AuthMode::ApiKey => {
                let key = require("SERVICENOW_API_KEY")?;
                validate_secret("SERVICENOW_API_KEY", &key)?;
                let header = get("SERVICENOW_API_KEY_HEADER")
                    .unwrap_or_else(|| DEFAULT_API_KEY_HEADER.to_string());
                AuthConfig::api_key_with_header(key, header)
            }
        };

        Ok(Config { destination, auth })
    }
}

/// Validates and normalizes the base URL.
fn validate_base_url(url: String) -> Result<String, FrostError> {
    let url = url.trim().trim_end_matches('/').to_string();

    if url.is_empty() {
        return Err(FrostError::config("instance URL cannot be empty"));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(FrostError::config(
            "instance URL must start with http:// or https://",
        ));
    }

    Ok(url)
}

/// Rejects obvious placeholder secrets copied from sample `.env` files.
fn validate_secret(name: &str, value: &str) -> Result<(), FrostError> {
    let lower = value.to_lowercase();
    let placeholder_patterns = ["your_", "placeholder", "xxx", "changeme"];

    if placeholder_patterns.iter().any(|p| lower.contains(p)) {
        return Err(FrostError::config(format!(
            "{} appears to be a placeholder value",
            name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use crate::error::ErrorKind;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_validate_base_url_removes_trailing_slash() {
        let result = validate_base_url("https://dev1.service-now.com/".to_string()).unwrap();
        assert_eq!(result, "https://dev1.service-now.com");
    }

    #[test]
    fn test_validate_base_url_requires_scheme() {
        assert!(validate_base_url("dev1.service-now.com".to_string()).is_err());
    }

    #[test]
    fn test_api_url_appends_table_api_root() {
        let dest = DestinationConfig::new("https://dev1.service-now.com").unwrap();
        assert_eq!(dest.api_url(), "https://dev1.service-now.com/api/now");
        assert_eq!(dest.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(!dest.debug());
    }

    #[test]
    fn test_auth_mode_from_str() {
        assert_eq!("basic".parse::<AuthMode>().unwrap(), AuthMode::Basic);
        assert_eq!("OAuth".parse::<AuthMode>().unwrap(), AuthMode::OAuth);
        assert_eq!("api_key".parse::<AuthMode>().unwrap(), AuthMode::ApiKey);
        assert!("kerberos".parse::<AuthMode>().is_err());
    }

    #[test]
    fn test_constructors_satisfy_validate() {
        assert!(AuthConfig::basic("admin", "pw").validate().is_ok());
        assert!(AuthConfig::api_key("k").validate().is_ok());
        assert!(AuthConfig::oauth(OAuthAuth {
            client_id: "id".into(),
            client_secret: "secret".into(),
            username: "admin".into(),
            password: "pw".into(),
            token_url: None,
        })
        .validate()
        .is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_sub_config() {
        let config = AuthConfig {
            mode: AuthMode::OAuth,
            basic: None,
            oauth: None,
            api_key: None,
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("oauth auth configuration is required"));
    }

    #[test]
    fn test_validate_rejects_extra_sub_config() {
        let mut config = AuthConfig::basic("admin", "pw");
        config.api_key = AuthConfig::api_key("k").api_key;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_auth_config_deserializes_with_default_header() {
        let config: AuthConfig =
            serde_json::from_str(r#"{"type": "api_key", "api_key": {"api_key": "k"}}"#).unwrap();
        assert_eq!(config.mode, AuthMode::ApiKey);
        assert_eq!(
            config.api_key.unwrap().header_name,
            DEFAULT_API_KEY_HEADER
        );
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let config = AuthConfig::basic("admin", "hunter2");
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_from_lookup_basic_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("SERVICENOW_INSTANCE_URL", "https://dev1.service-now.com/"),
            ("SERVICENOW_USERNAME", "admin"),
            ("SERVICENOW_PASSWORD", "pw"),
        ]))
        .unwrap();

        assert_eq!(config.destination.base_url(), "https://dev1.service-now.com");
        assert_eq!(config.destination.timeout_secs(), DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.auth.mode, AuthMode::Basic);
        assert!(config.auth.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_oauth_requires_client_credentials() {
        let err = Config::from_lookup(lookup(&[
            ("SERVICENOW_INSTANCE_URL", "https://dev1.service-now.com"),
            ("SERVICENOW_AUTH_TYPE", "oauth"),
            ("SERVICENOW_USERNAME", "admin"),
            ("SERVICENOW_PASSWORD", "pw"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("SERVICENOW_CLIENT_ID"));
    }

    #[test]
    fn test_from_lookup_api_key_with_custom_header_and_timeout() {
        let config = Config::from_lookup(lookup(&[
            ("SERVICENOW_INSTANCE_URL", "https://dev1.service-now.com"),
            ("SERVICENOW_AUTH_TYPE", "api_key"),
            ("SERVICENOW_API_KEY", "abc123"),
            ("SERVICENOW_API_KEY_HEADER", "x-sn-apikey"),
            ("SERVICENOW_TIMEOUT", "5"),
            ("SERVICENOW_DEBUG", "TRUE"),
        ]))
        .unwrap();

        let api_key = config.auth.api_key.unwrap();
        assert_eq!(api_key.header_name, "x-sn-apikey");
        assert_eq!(config.destination.timeout(), Duration::from_secs(5));
        assert!(config.destination.debug());
    }

    #[test]
    fn test_from_lookup_rejects_placeholder_key() {
        let result = Config::from_lookup(lookup(&[
            ("SERVICENOW_INSTANCE_URL", "https://dev1.service-now.com"),
            ("SERVICENOW_AUTH_TYPE", "api_key"),
            ("SERVICENOW_API_KEY", "your_api_key_here"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_from_lookup_rejects_bad_timeout() {
        let result = Config::from_lookup(lookup(&[
            ("SERVICENOW_INSTANCE_URL", "https://dev1.service-now.com"),
            ("SERVICENOW_USERNAME", "admin"),
            ("SERVICENOW_PASSWORD", "pw"),
            ("SERVICENOW_TIMEOUT", "soon"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_from_lookup_rejects_zero_timeout() {
        let err = Config::from_lookup(lookup(&[
            ("SERVICENOW_INSTANCE_URL", "https://dev1.service-now.com"),
            ("SERVICENOW_USERNAME", "admin"),
            ("SERVICENOW_PASSWORD", "pw"),
            ("SERVICENOW_TIMEOUT", "0"),
        ]))
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("positive whole number"));
    }
}
