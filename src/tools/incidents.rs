//! Incident tools (`table/incident`).

use serde_json::{json, Value};

use super::{run, to_data, ToolResponse};
use crate::client::record_path;
use crate::error::FrostError;
use crate::models::{EncodedQuery, Incident, IncidentSummary};
use crate::resolve::{resolve_params, ToolArg};
use crate::tools::inputs::{
    page_size, AddCommentParams, CreateIncidentParams, ListIncidentsParams,
    ResolveIncidentParams, UpdateIncidentParams,
};

const TABLE: &str = "incident";

/// State code for a resolved incident.
const STATE_RESOLVED: &str = "6";

fn created(incident: Incident, message: &str) -> Result<ToolResponse, FrostError> {
    let summary = IncidentSummary::from(incident);
    Ok(ToolResponse::ok(
        message,
        json!({
            "incident_id": summary.sys_id,
            "incident_number": summary.number,
        }),
    ))
}

/// Creates an incident. `short_description` is required.
pub async fn create_incident(a: ToolArg, b: ToolArg, raw: Value) -> ToolResponse {
    run("create incident", a, b, |client| async move {
        let params: CreateIncidentParams = resolve_params(raw, &["short_description"])?;
        let params = params.sanitize();
        if params.short_description.is_empty() {
            return Err(FrostError::missing_field("short_description"));
        }
        tracing::debug!(short_description = %params.short_description, "create_incident called");

        let incident: Incident = client
            .post(&format!("/table/{}", TABLE), &to_data(&params)?)
            .await?;
        created(incident, "Incident created successfully")
    })
    .await
}

/// Updates fields of an incident given by number or sys_id.
pub async fn update_incident(a: ToolArg, b: ToolArg, raw: Value) -> ToolResponse {
    run("update incident", a, b, |client| async move {
        let params: UpdateIncidentParams = resolve_params(raw, &["incident_id"])?;
        let params = params.sanitize();
        tracing::debug!(incident_id = %params.incident_id, "update_incident called");

        let sys_id = client.resolve_record_id(TABLE, &params.incident_id).await?;
        let incident: Incident = client
            .put(&record_path(TABLE, &sys_id), &to_data(&params)?)
            .await?;
        created(incident, "Incident updated successfully")
    })
    .await
}

/// Adds a customer-visible comment or an internal work note.
pub async fn add_comment(a: ToolArg, b: ToolArg, raw: Value) -> ToolResponse {
    run("add comment", a, b, |client| async move {
        let params: AddCommentParams = resolve_params(raw, &["incident_id", "comment"])?;
        let field = if params.is_work_note.unwrap_or(false) {
            "work_notes"
        } else {
            "comments"
        };
        tracing::debug!(incident_id = %params.incident_id, field, "add_comment called");

        let sys_id = client
            .resolve_record_id(TABLE, params.incident_id.trim())
            .await?;
        let incident: Incident = client
            .put(&record_path(TABLE, &sys_id), &json!({ field: params.comment }))
            .await?;
        created(incident, "Comment added successfully")
    })
    .await
}

/// Moves an incident to the resolved state with a close code and notes.
pub async fn resolve_incident(a: ToolArg, b: ToolArg, raw: Value) -> ToolResponse {
    run("resolve incident", a, b, |client| async move {
        let params: ResolveIncidentParams = resolve_params(
            raw,
            &["incident_id", "resolution_code", "resolution_notes"],
        )?;
        tracing::debug!(incident_id = %params.incident_id, "resolve_incident called");

        let sys_id = client
            .resolve_record_id(TABLE, params.incident_id.trim())
            .await?;
        let body = json!({
            "state": STATE_RESOLVED,
            "close_code": params.resolution_code,
            "close_notes": params.resolution_notes,
            "resolved_at": "now",
        });
        let incident: Incident = client.put(&record_path(TABLE, &sys_id), &body).await?;
        created(incident, "Incident resolved successfully")
    })
    .await
}

/// Lists incidents with optional filters.
///
/// `query` is matched against the short description and description.
pub async fn list_incidents(a: ToolArg, b: ToolArg, raw: Value) -> ToolResponse {
    run("list incidents", a, b, |client| async move {
        let params: ListIncidentsParams = resolve_params(raw, &[])?;
        tracing::debug!(?params, "list_incidents called");

        let search = params
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("short_descriptionLIKE{q}^ORdescriptionLIKE{q}"));
        let filter = EncodedQuery::new()
            .equals("state", params.state.as_deref())
            .equals("assigned_to", params.assigned_to.as_deref())
            .equals("category", params.category.as_deref())
            .raw(search.as_deref())
            .build();

        let mut query = vec![
            ("sysparm_limit", page_size(params.limit).to_string()),
            ("sysparm_offset", params.offset.unwrap_or(0).to_string()),
            ("sysparm_display_value", "true".to_string()),
            ("sysparm_exclude_reference_link", "true".to_string()),
        ];
        if let Some(filter) = filter {
            query.push(("sysparm_query", filter));
        }

        let incidents: Vec<Incident> = client.get(&format!("/table/{}", TABLE), query).await?;
        let incidents: Vec<IncidentSummary> =
            incidents.into_iter().map(IncidentSummary::from).collect();

        Ok(ToolResponse::ok(
            format!("Found {} incidents", incidents.len()),
            json!({ "incidents": to_data(&incidents)? }),
        ))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::args_for;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SYS_ID: &str = "9d385017c611228701d22104cc95c371";

    async fn mount_number_lookup(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/now/table/incident"))
            .and(query_param("sysparm_query", "number=INC0010001"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"result": [{"sys_id": SYS_ID}]})),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_create_incident_posts_given_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/now/table/incident"))
            .and(body_json(json!({"short_description": "VPN down", "urgency": "1"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "result": {"sys_id": SYS_ID, "number": "INC0010001"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (a, b) = args_for(&server);
        let response =
            create_incident(a, b, json!({"short_description": " VPN down ", "urgency": "1"})).await;

        assert_eq!(
            response,
            ToolResponse::ok(
                "Incident created successfully",
                json!({"incident_id": SYS_ID, "incident_number": "INC0010001"})
            )
        );
    }

    #[tokio::test]
    async fn test_create_incident_accepts_swapped_and_wrapped_arguments() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/now/table/incident"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "result": {"sys_id": SYS_ID, "number": "INC0010002"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (credentials, destination) = args_for(&server);
        let response = create_incident(
            destination,
            credentials,
            json!({"params": {"short_description": "Printer jam"}}),
        )
        .await;

        assert!(response.success, "{}", response.message);
    }

    #[tokio::test]
    async fn test_create_incident_requires_short_description() {
        let server = MockServer::start().await;
        let (a, b) = args_for(&server);

        let response = create_incident(a, b, json!({"description": "no summary"})).await;

        assert_eq!(
            response,
            ToolResponse::failure(
                "Failed to create incident: missing required parameter 'short_description'"
            )
        );
    }

    #[tokio::test]
    async fn test_update_incident_resolves_number_first() {
        let server = MockServer::start().await;
        mount_number_lookup(&server).await;
        Mock::given(method("PUT"))
            .and(path(format!("/api/now/table/incident/{}", SYS_ID)))
            .and(body_json(json!({"state": "2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"sys_id": SYS_ID, "number": "INC0010001"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (a, b) = args_for(&server);
        let response = update_incident(a, b, json!({"incident_id": "INC0010001", "state": "2"})).await;

        assert!(response.success, "{}", response.message);
        assert_eq!(response.message, "Incident updated successfully");
    }

    #[tokio::test]
    async fn test_update_incident_unknown_number() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/now/table/incident"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": []})))
            .mount(&server)
            .await;

        let (a, b) = args_for(&server);
        let response = update_incident(a, b, json!({"incident_id": "INC404"})).await;

        assert_eq!(
            response,
            ToolResponse::failure("Failed to update incident: incident not found: INC404")
        );
    }

    #[tokio::test]
    async fn test_update_incident_refuses_number_with_extra_conditions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"result": [{"sys_id": SYS_ID}]})),
            )
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {}})))
            .expect(0)
            .mount(&server)
            .await;

        let (a, b) = args_for(&server);
        let response = update_incident(
            a,
            b,
            json!({"incident_id": "INC404^ORnumberISNOTEMPTY", "state": "7"}),
        )
        .await;

        assert!(!response.success);
        assert!(response.message.contains("record id: must not contain '^'"));
    }

    #[tokio::test]
    async fn test_add_comment_as_work_note() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(format!("/api/now/table/incident/{}", SYS_ID)))
            .and(body_json(json!({"work_notes": "checked logs"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"sys_id": SYS_ID, "number": "INC0010001"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (a, b) = args_for(&server);
        let response = add_comment(
            a,
            b,
            json!({"incident_id": SYS_ID, "comment": "checked logs", "is_work_note": "true"}),
        )
        .await;

        assert!(response.success, "{}", response.message);
    }

    #[tokio::test]
    async fn test_resolve_incident_sets_resolved_state() {
        let server = MockServer::start().await;
        mount_number_lookup(&server).await;
        Mock::given(method("PUT"))
            .and(path(format!("/api/now/table/incident/{}", SYS_ID)))
            .and(body_json(json!({
                "state": "6",
                "close_code": "Solved (Permanently)",
                "close_notes": "Rebooted router",
                "resolved_at": "now"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"sys_id": SYS_ID, "number": "INC0010001", "state": "6"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (a, b) = args_for(&server);
        let response = resolve_incident(
            a,
            b,
            json!({
                "incident_id": "INC0010001",
                "resolution_code": "Solved (Permanently)",
                "resolution_notes": "Rebooted router"
            }),
        )
        .await;

        assert!(response.success, "{}", response.message);
    }

    #[tokio::test]
    async fn test_list_incidents_builds_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/now/table/incident"))
            .and(query_param("sysparm_limit", "5"))
            .and(query_param("sysparm_offset", "0"))
            .and(query_param("sysparm_display_value", "true"))
            .and(query_param(
                "sysparm_query",
                "state=1^short_descriptionLIKEemail^ORdescriptionLIKEemail",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [{
                    "sys_id": SYS_ID,
                    "number": "INC0010001",
                    "short_description": "Email down",
                    "state": "New",
                    "assigned_to": "Beth Anglin"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (a, b) = args_for(&server);
        let response =
            list_incidents(a, b, json!({"limit": "5", "state": "1", "query": "email"})).await;

        assert!(response.success, "{}", response.message);
        assert_eq!(response.message, "Found 1 incidents");
        let data = response.data.unwrap();
        assert_eq!(data["incidents"][0]["assigned_to"], "Beth Anglin");
        assert_eq!(data["incidents"][0]["number"], "INC0010001");
    }

    #[tokio::test]
    async fn test_list_incidents_rejects_non_object_arguments() {
        let server = MockServer::start().await;
        let (a, b) = args_for(&server);

        let response = list_incidents(a, b, json!([1, 2])).await;

        assert_eq!(
            response,
            ToolResponse::failure(
                "Failed to list incidents: invalid parameters format: expected an object, got array"
            )
        );
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let (a, b) = args_for(&server);
        let response = list_incidents(a, b, json!({})).await;

        assert!(!response.success);
        assert!(response.message.starts_with("Failed to list incidents: HTTP 500"));
    }
}
