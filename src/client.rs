//! HTTP client for the ServiceNow Table API.
//!
//! `ApiClient` is built per tool invocation from a resolved
//! (header provider, destination) pair. Every request carries the headers
//! the provider produces at send time, so an OAuth token fetched or
//! refreshed between calls is picked up automatically.
//!
//! There is no retry logic: a failed request surfaces as a `FrostError` and
//! the tool layer turns it into a failure response.
//!
//! # Security
//!
//! Credentials are never logged. Response bodies are only logged when the
//! destination has debug enabled.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::auth::HeaderProvider;
use crate::config::ConfigProvider;
use crate::error::FrostError;

/// Envelope the Table API wraps every payload in.
#[derive(Debug, Deserialize)]
struct TableResponse<T> {
    result: T,
}

/// Minimal view of a record used for id lookups.
#[derive(Debug, Deserialize)]
struct RecordId {
    sys_id: String,
}

/// Query string pairs for a request.
pub type Query = Vec<(&'static str, String)>;

/// Authenticated client for one tool invocation.
pub struct ApiClient {
    /// The underlying HTTP client.
    http: Client,

    /// Root of the REST API (e.g. `https://dev1.service-now.com/api/now`).
    api_url: String,

    /// Timeout applied to each request, kept for error reporting.
    timeout: Duration,

    /// Whether to trace response bodies.
    debug: bool,

    /// Source of request headers.
    credentials: Arc<dyn HeaderProvider>,
}

impl ApiClient {
    /// Creates a client for the given credentials and destination.
    ///
    /// # Errors
    ///
    /// Returns `FrostError::Transport` if the HTTP client fails to initialize.
    pub fn new(
        credentials: Arc<dyn HeaderProvider>,
        destination: &dyn ConfigProvider,
    ) -> Result<Self, FrostError> {
        let http = Client::builder()
            .timeout(destination.timeout())
            .build()
            .map_err(FrostError::Transport)?;

        Ok(Self {
            http,
            api_url: destination.api_url(),
            timeout: destination.timeout(),
            debug: destination.debug(),
            credentials,
        })
    }

    /// Secrets to scrub from anything derived from this client's errors.
    pub fn secrets(&self) -> Vec<String> {
        self.credentials.secrets()
    }

    /// Checks that the instance is reachable and accepts our credentials.
    ///
    /// Reads a single `sys_user` row.
    pub async fn test_connection(&self) -> Result<(), FrostError> {
        tracing::debug!("Testing connection to ServiceNow instance");

        let _: Vec<Value> = self
            .get(
                "/table/sys_user",
                vec![
                    ("sysparm_limit", "1".to_string()),
                    ("sysparm_fields", "sys_id".to_string()),
                ],
            )
            .await?;

        tracing::info!("Connection test successful");
        Ok(())
    }

    /// Issues a GET and decodes the `result` payload.
    pub async fn get<T>(&self, path: &str, query: Query) -> Result<T, FrostError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::GET, path, query, None).await
    }

    /// Issues a POST with a JSON body and decodes the `result` payload.
    pub async fn post<T>(&self, path: &str, body: &Value) -> Result<T, FrostError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Vec::new(), Some(body)).await
    }

    /// Issues a PUT with a JSON body and decodes the `result` payload.
    pub async fn put<T>(&self, path: &str, body: &Value) -> Result<T, FrostError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::PUT, path, Vec::new(), Some(body)).await
    }

    /// Issues a PATCH with a JSON body and decodes the `result` payload.
    pub async fn patch<T>(&self, path: &str, body: &Value) -> Result<T, FrostError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::PATCH, path, Vec::new(), Some(body)).await
    }

    /// Turns a record number or sys_id into a sys_id.
    ///
    /// A 32 character lowercase hex string is taken to be a sys_id already;
    /// anything else is looked up by its `number` field.
    ///
    /// # Errors
    ///
    /// Returns `FrostError::Validation` if the number cannot be embedded in a
    /// query, and `FrostError::NotFound` if no record has that number.
    pub async fn resolve_record_id(&self, table: &str, id: &str) -> Result<String, FrostError> {
        if is_sys_id(id) {
            return Ok(id.to_string());
        }
        let id = query_literal("record id", id)?;

        tracing::debug!(table = %table, number = %id, "Looking up record by number");

        let records: Vec<RecordId> = self
            .get(
                &format!("/table/{}", table),
                vec![
                    ("sysparm_query", format!("number={}", id)),
                    ("sysparm_limit", "1".to_string()),
                    ("sysparm_fields", "sys_id".to_string()),
                ],
            )
            .await?;

        records
            .into_iter()
            .next()
            .map(|record| record.sys_id)
            .ok_or_else(|| FrostError::not_found(table, id))
    }

    /// Sends one request and decodes the `result` payload.
    async fn request<T>(
        &self,
        method: Method,
        path: &str,
        query: Query,
        body: Option<&Value>,
    ) -> Result<T, FrostError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.api_url, path);
        let operation = format!("{} {}", method, path);

        tracing::debug!(method = %method, path = %path, "Making ServiceNow API request");

        let headers = self.credentials.headers().await?;

        let mut req = self.http.request(method, &url);
        for (name, value) in headers {
            req = req.header(name, value);
        }
        if !query.is_empty() {
            req = req.query(&query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                return FrostError::Timeout {
                    duration: self.timeout,
                    operation: operation.clone(),
                };
            }
            FrostError::Transport(e)
        })?;
        let status = response.status();
        let text = response.text().await.map_err(FrostError::Transport)?;

        if !status.is_success() {
            tracing::debug!(status = %status, operation = %operation, "ServiceNow API returned an error status");
            return Err(FrostError::http_status(status, &text));
        }

        if self.debug {
            tracing::debug!(body = %text, "ServiceNow API response");
        }

        let envelope: TableResponse<T> = serde_json::from_str(&text)?;
        Ok(envelope.result)
    }
}

/// Returns true for a 32 character lowercase hex string.
pub fn is_sys_id(id: &str) -> bool {
    id.len() == 32 && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Checks that a caller-supplied value is safe inside `sysparm_query`.
///
/// `^` separates encoded-query conditions, so a value containing it would
/// add conditions of its own (`INC1^ORactive=true` matches every active row).
///
/// # Errors
///
/// Returns `FrostError::Validation` naming `field` if the value contains `^`.
pub fn query_literal<'a>(field: &str, value: &'a str) -> Result<&'a str, FrostError> {
    if value.contains('^') {
        return Err(FrostError::invalid_value(field, "must not contain '^'"));
    }
    Ok(value)
}

/// Percent-encodes a record id for use as a path segment.
pub fn record_path(table: &str, sys_id: &str) -> String {
    format!("/table/{}/{}", table, urlencoding::encode(sys_id))
}
