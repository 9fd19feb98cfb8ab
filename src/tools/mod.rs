//! Tool implementations for Frost.
//!
//! Every tool has the same shape: two role arguments (credentials and
//! destination, in either order) plus the raw JSON arguments, and it always
//! returns a [`ToolResponse`]. Errors never escape a tool; they become
//! `success: false` with a sanitized message.

mod changes;
mod incidents;
mod inputs;
mod users;

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

pub use changes::*;
pub use incidents::*;
pub use inputs::*;
pub use users::*;

use crate::client::ApiClient;
use crate::error::FrostError;
use crate::resolve::{resolve_credentials_and_config, ToolArg};

/// Uniform result of a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResponse {
    /// Whether the operation succeeded.
    pub success: bool,

    /// Human-readable outcome.
    pub message: String,

    /// Operation-specific payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolResponse {
    /// A successful response carrying `data`.
    pub fn ok(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    /// A successful response with no payload.
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    /// A failed response.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Resolves the role arguments, builds a client and runs `body`.
///
/// Any error along the way is logged and returned as
/// `"Failed to {operation}: {error}"` with credentials scrubbed.
pub(crate) async fn run<F, Fut>(operation: &str, a: ToolArg, b: ToolArg, body: F) -> ToolResponse
where
    F: FnOnce(ApiClient) -> Fut,
    Fut: Future<Output = Result<ToolResponse, FrostError>>,
{
    let (credentials, destination) = match resolve_credentials_and_config(a, b) {
        Ok(context) => context,
        Err(e) => return fail(operation, &e, &[]),
    };
    let client = match ApiClient::new(Arc::clone(&credentials), destination.as_ref()) {
        Ok(client) => client,
        Err(e) => return fail(operation, &e, &credentials.secrets()),
    };

    match body(client).await {
        Ok(response) => response,
        Err(e) => {
            // Read after the body so a token fetched during it is included.
            let secrets = credentials.secrets();
            fail(operation, &e, &secrets)
        }
    }
}

fn fail(operation: &str, error: &FrostError, secrets: &[String]) -> ToolResponse {
    let secrets: Vec<&str> = secrets.iter().map(String::as_str).collect();
    let sanitized = error.sanitized_display(&secrets);
    if error.is_caller_fault() {
        tracing::warn!(kind = ?error.kind(), error = %sanitized, "Rejected {} call", operation);
    } else {
        tracing::error!(kind = ?error.kind(), error = %sanitized, "Failed to {}", operation);
    }
    ToolResponse::failure(format!("Failed to {}: {}", operation, sanitized))
}

/// Serializes a payload into the `data` slot.
pub(crate) fn to_data<T: Serialize>(value: &T) -> Result<Value, FrostError> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for tool tests.

    use std::sync::Arc;

    use wiremock::MockServer;

    use crate::auth::CredentialProvider;
    use crate::config::{AuthConfig, DestinationConfig};
    use crate::resolve::ToolArg;

    /// Role arguments pointing at `server`, in documented order.
    pub fn args_for(server: &MockServer) -> (ToolArg, ToolArg) {
        let destination = DestinationConfig::new(server.uri()).unwrap();
        let credentials =
            CredentialProvider::new(AuthConfig::basic("admin", "s3cret-pw"), &destination)
                .unwrap();
        (
            ToolArg::from(Arc::new(credentials)),
            ToolArg::from(Arc::new(destination)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_failure_omits_data() {
        let body = serde_json::to_value(ToolResponse::failure("nope")).unwrap();
        assert_eq!(body, json!({"success": false, "message": "nope"}));
    }

    #[tokio::test]
    async fn test_run_rejects_unresolvable_roles() {
        let response = run(
            "list incidents",
            ToolArg::Other("str".into()),
            ToolArg::Other("i64".into()),
            |_client| async { Ok(ToolResponse::done("unreachable")) },
        )
        .await;

        assert!(!response.success);
        assert!(response.message.starts_with("Failed to list incidents: "));
        assert!(response
            .message
            .contains("cannot determine credential/config roles"));
    }

    #[tokio::test]
    async fn test_run_scrubs_secrets_from_errors() {
        let server = wiremock::MockServer::start().await;
        let (a, b) = testing::args_for(&server);

        let response = run("do thing", a, b, |_client| async {
            Err(FrostError::config("password s3cret-pw rejected"))
        })
        .await;

        assert!(!response.success);
        assert!(!response.message.contains("s3cret-pw"));
        assert!(response.message.starts_with("Failed to do thing: "));
    }

    #[tokio::test]
    async fn test_run_scrubs_token_fetched_during_the_call() {
        use crate::auth::CredentialProvider;
        use crate::config::{AuthConfig, DestinationConfig, OAuthAuth};
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth_token.do"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok-xyz",
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/now/table/incident"))
            .respond_with(
                ResponseTemplate::new(500).set_body_string("session for Bearer tok-xyz expired"),
            )
            .mount(&server)
            .await;

        let destination = DestinationConfig::new(server.uri()).unwrap();
        let credentials = CredentialProvider::new(
            AuthConfig::oauth(OAuthAuth {
                client_id: "client-id".into(),
                client_secret: "client-secret".into(),
                username: "admin".into(),
                password: "pw".into(),
                token_url: Some(format!("{}/oauth_token.do", server.uri())),
            }),
            &destination,
        )
        .unwrap();

        let response = run(
            "list incidents",
            ToolArg::from(Arc::new(credentials)),
            ToolArg::from(Arc::new(destination)),
            |client| async move {
                let _: Value = client.get("/table/incident", Vec::new()).await?;
                Ok(ToolResponse::done("unreachable"))
            },
        )
        .await;

        assert!(!response.success);
        assert!(response.message.contains("HTTP 500"), "{}", response.message);
        assert!(!response.message.contains("tok-xyz"), "{}", response.message);
    }
}
