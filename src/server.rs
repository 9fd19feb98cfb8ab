//! MCP server implementation for Frost.
//!
//! This module defines the `FrostServer` struct that implements the MCP
//! `ServerHandler` trait, exposing ServiceNow operations as tools.
//!
//! Tools take their arguments as a raw JSON object. Deciding whether a call
//! shape is acceptable (including unwrapping a stray `params` envelope) is
//! left to [`crate::resolve`], so the transport never rejects a call the
//! resolver would have accepted. The advertised input schema is still the
//! one of the tool's parameter struct.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{JsonObject, ServerCapabilities, ServerInfo},
    schemars::{self, JsonSchema},
    tool, tool_handler, tool_router, ServerHandler,
};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::CredentialProvider;
use crate::config::DestinationConfig;
use crate::resolve::ToolArg;
use crate::tools::{self, ToolResponse};

macro_rules! tool_args {
    ($($name:ident => $params:tt),* $(,)?) => {
        $(
            #[doc = concat!("Raw tool arguments, described by [`", $params, "`].")]
            #[derive(Debug, Deserialize, JsonSchema)]
            pub struct $name {
                #[serde(flatten)]
                #[schemars(with = $params)]
                args: JsonObject,
            }

            impl $name {
                fn into_value(self) -> Value {
                    Value::Object(self.args)
                }
            }
        )*
    };
}

tool_args! {
    CreateIncidentArgs => "tools::CreateIncidentParams",
    UpdateIncidentArgs => "tools::UpdateIncidentParams",
    AddCommentArgs => "tools::AddCommentParams",
    ResolveIncidentArgs => "tools::ResolveIncidentParams",
    ListIncidentsArgs => "tools::ListIncidentsParams",
    CreateChangeRequestArgs => "tools::CreateChangeRequestParams",
    ListChangeRequestsArgs => "tools::ListChangeRequestsParams",
    GetChangeRequestDetailsArgs => "tools::GetChangeRequestDetailsParams",
    ApproveChangeArgs => "tools::ApproveChangeParams",
    RejectChangeArgs => "tools::RejectChangeParams",
    ListUsersArgs => "tools::ListUsersParams",
    GetUserArgs => "tools::GetUserParams",
}

/// The Frost MCP server.
#[derive(Clone)]
pub struct FrostServer {
    /// Credentials shared by every tool call.
    credentials: Arc<CredentialProvider>,
    /// Instance the tools talk to.
    destination: Arc<DestinationConfig>,
    /// Tool router for MCP tool dispatch.
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl FrostServer {
    /// Creates a new Frost server instance.
    pub fn new(credentials: Arc<CredentialProvider>, destination: Arc<DestinationConfig>) -> Self {
        Self {
            credentials,
            destination,
            tool_router: Self::tool_router(),
        }
    }

    /// The role arguments every tool receives.
    fn context(&self) -> (ToolArg, ToolArg) {
        (
            ToolArg::from(Arc::clone(&self.credentials)),
            ToolArg::from(Arc::clone(&self.destination)),
        )
    }

    /// A simple ping tool to verify the server is running.
    ///
    /// Returns "pong" on success.
    #[tool(description = "Test connectivity to the Frost MCP server. Returns 'pong' if the server is running correctly.")]
    fn ping(&self) -> String {
        tracing::debug!("ping tool called");
        "pong".to_string()
    }

    // ========================================================================
    // Incidents
    // ========================================================================

    #[tool(description = "Create an incident. Arguments: short_description (required), description, caller_id, category, subcategory, priority, impact, urgency, assigned_to, assignment_group.")]
    async fn create_incident(
        &self,
        Parameters(args): Parameters<CreateIncidentArgs>,
    ) -> Result<String, String> {
        let (a, b) = self.context();
        respond(tools::create_incident(a, b, args.into_value()).await)
    }

    #[tool(description = "Update an incident. Arguments: incident_id (number or sys_id, required), and any of short_description, description, state, category, subcategory, priority, impact, urgency, assigned_to, assignment_group, work_notes, close_notes, close_code.")]
    async fn update_incident(
        &self,
        Parameters(args): Parameters<UpdateIncidentArgs>,
    ) -> Result<String, String> {
        let (a, b) = self.context();
        respond(tools::update_incident(a, b, args.into_value()).await)
    }

    #[tool(description = "Add a comment to an incident. Arguments: incident_id (required), comment (required), is_work_note (true for an internal work note).")]
    async fn add_comment(
        &self,
        Parameters(args): Parameters<AddCommentArgs>,
    ) -> Result<String, String> {
        let (a, b) = self.context();
        respond(tools::add_comment(a, b, args.into_value()).await)
    }

    #[tool(description = "Resolve an incident. Arguments: incident_id, resolution_code, resolution_notes (all required).")]
    async fn resolve_incident(
        &self,
        Parameters(args): Parameters<ResolveIncidentArgs>,
    ) -> Result<String, String> {
        let (a, b) = self.context();
        respond(tools::resolve_incident(a, b, args.into_value()).await)
    }

    #[tool(description = "List incidents. Arguments: limit (default 10, max 100), offset, state, assigned_to, category, query (searched in short description and description).")]
    async fn list_incidents(
        &self,
        Parameters(args): Parameters<ListIncidentsArgs>,
    ) -> Result<String, String> {
        let (a, b) = self.context();
        respond(tools::list_incidents(a, b, args.into_value()).await)
    }

    // ========================================================================
    // Change requests
    // ========================================================================

    #[tool(description = "Create a change request. Arguments: short_description (required), type (normal, standard or emergency; required), description, risk, impact, category, requested_by, assignment_group, start_date, end_date.")]
    async fn create_change_request(
        &self,
        Parameters(args): Parameters<CreateChangeRequestArgs>,
    ) -> Result<String, String> {
        let (a, b) = self.context();
        respond(tools::create_change_request(a, b, args.into_value()).await)
    }

    #[tool(description = "List change requests. Arguments: limit, offset, state, type, category, assignment_group, timeframe (upcoming, in-progress or completed), query (encoded query).")]
    async fn list_change_requests(
        &self,
        Parameters(args): Parameters<ListChangeRequestsArgs>,
    ) -> Result<String, String> {
        let (a, b) = self.context();
        respond(tools::list_change_requests(a, b, args.into_value()).await)
    }

    #[tool(description = "Get a change request with its change tasks. Arguments: change_id (number or sys_id, required).")]
    async fn get_change_request_details(
        &self,
        Parameters(args): Parameters<GetChangeRequestDetailsArgs>,
    ) -> Result<String, String> {
        let (a, b) = self.context();
        respond(tools::get_change_request_details(a, b, args.into_value()).await)
    }

    #[tool(description = "Approve a change request and move it to implement. Arguments: change_id (required), approver_id, approval_comments.")]
    async fn approve_change(
        &self,
        Parameters(args): Parameters<ApproveChangeArgs>,
    ) -> Result<String, String> {
        let (a, b) = self.context();
        respond(tools::approve_change(a, b, args.into_value()).await)
    }

    #[tool(description = "Reject a change request and cancel it. Arguments: change_id (required), rejection_reason (required), approver_id.")]
    async fn reject_change(
        &self,
        Parameters(args): Parameters<RejectChangeArgs>,
    ) -> Result<String, String> {
        let (a, b) = self.context();
        respond(tools::reject_change(a, b, args.into_value()).await)
    }

    // ========================================================================
    // Users
    // ========================================================================

    #[tool(description = "List users. Arguments: limit, offset, active, department, query (searched in name, user name and email).")]
    async fn list_users(
        &self,
        Parameters(args): Parameters<ListUsersArgs>,
    ) -> Result<String, String> {
        let (a, b) = self.context();
        respond(tools::list_users(a, b, args.into_value()).await)
    }

    #[tool(description = "Get one user. Arguments: one of user_id (sys_id), user_name or email.")]
    async fn get_user(
        &self,
        Parameters(args): Parameters<GetUserArgs>,
    ) -> Result<String, String> {
        let (a, b) = self.context();
        respond(tools::get_user(a, b, args.into_value()).await)
    }
}

#[tool_handler]
impl ServerHandler for FrostServer {
    /// Returns server information for the MCP initialize handshake.
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Frost provides access to ServiceNow incidents, change requests and users. \
                 Records can be referenced by number (INC0010001, CHG0030001) or sys_id. \
                 Every tool answers with a JSON object carrying success, message and data. \
                 Start with 'ping' to verify connectivity."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Renders a tool response as pretty JSON; failures go out as tool errors.
fn respond(response: ToolResponse) -> Result<String, String> {
    let rendered = serde_json::to_string_pretty(&response)
        .unwrap_or_else(|_| response.message.clone());
    if response.success {
        Ok(rendered)
    } else {
        Err(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_server(base_url: &str) -> FrostServer {
        let destination = DestinationConfig::new(base_url).unwrap();
        let credentials =
            CredentialProvider::new(AuthConfig::api_key("test_key_12345"), &destination).unwrap();
        FrostServer::new(Arc::new(credentials), Arc::new(destination))
    }

    #[test]
    fn test_server_info_has_tools_capability() {
        let server = test_server("https://dev1.service-now.com");
        let info = server.get_info();
        assert!(info.instructions.is_some());
        assert!(info.capabilities.tools.is_some());
    }

    #[test]
    fn test_ping_tool_returns_pong() {
        let server = test_server("https://dev1.service-now.com");
        assert_eq!(server.ping(), "pong");
    }

    #[test]
    fn test_respond_splits_on_success() {
        let ok = respond(ToolResponse::done("fine")).unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&ok).unwrap(),
            json!({"success": true, "message": "fine"})
        );

        let err = respond(ToolResponse::failure("Failed to x: y")).unwrap_err();
        assert!(err.contains("Failed to x: y"));
    }

    #[test]
    fn test_tool_schema_lists_fields_without_requiring_them() {
        let schema = serde_json::to_value(schemars::schema_for!(CreateChangeRequestArgs)).unwrap();

        let properties = schema["properties"].as_object().unwrap();
        assert!(properties.contains_key("short_description"));
        assert!(properties.contains_key("type"));
        assert!(properties.contains_key("start_date"));
        let required = schema.get("required").and_then(Value::as_array);
        assert!(required.map_or(true, |fields| fields.is_empty()));
    }

    #[test]
    fn test_tool_args_keep_unknown_shapes() {
        let args: GetUserArgs =
            serde_json::from_value(json!({"params": "{\"email\": \"a@example.com\"}"})).unwrap();
        assert_eq!(
            args.into_value(),
            json!({"params": "{\"email\": \"a@example.com\"}"})
        );
    }

    #[tokio::test]
    async fn test_tool_method_passes_raw_arguments_through() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/now/table/sys_user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": []})))
            .expect(1)
            .mount(&mock)
            .await;

        let server = test_server(&mock.uri());
        let args: ListUsersArgs = serde_json::from_value(json!({"params": {"limit": "3"}})).unwrap();

        let rendered = server.list_users(Parameters(args)).await.unwrap();
        let body: Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(body["message"], "Found 0 users");
    }
}
