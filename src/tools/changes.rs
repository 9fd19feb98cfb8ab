//! Change management tools (`table/change_request`).
//!
//! Approval and rejection touch two tables: the first pending row in
//! `sysapproval_approver` for the change is updated, then the change itself
//! is moved to its next state. The target states are the defaults of a
//! stock instance and may differ on customized workflows.

use serde_json::{json, Value};

use super::{run, to_data, ToolResponse};
use crate::client::{query_literal, record_path, ApiClient};
use crate::error::FrostError;
use crate::models::{Approval, ChangeRequest, ChangeSummary, ChangeTask, EncodedQuery};
use crate::resolve::{resolve_params, ToolArg};
use crate::tools::inputs::{
    page_size, ApproveChangeParams, CreateChangeRequestParams, GetChangeRequestDetailsParams,
    ListChangeRequestsParams, RejectChangeParams,
};

const TABLE: &str = "change_request";
const TASK_TABLE: &str = "change_task";
const APPROVAL_TABLE: &str = "sysapproval_approver";

/// Change state after approval.
const STATE_IMPLEMENT: &str = "implement";

/// Change state after rejection.
const STATE_CANCELED: &str = "canceled";

/// Creates a change request. `short_description` and `type` are required.
pub async fn create_change_request(a: ToolArg, b: ToolArg, raw: Value) -> ToolResponse {
    run("create change request", a, b, |client| async move {
        let params: CreateChangeRequestParams =
            resolve_params(raw, &["short_description", "type"])?;
        let params = params.sanitize();
        tracing::debug!(
            short_description = %params.short_description,
            change_type = params.change_type.as_str(),
            "create_change_request called"
        );

        let change: ChangeRequest = client
            .post(&format!("/table/{}", TABLE), &to_data(&params)?)
            .await?;
        Ok(ToolResponse::ok(
            "Change request created successfully",
            json!({ "change_request": to_data(&ChangeSummary::from(change))? }),
        ))
    })
    .await
}

/// Lists change requests with optional filters.
pub async fn list_change_requests(a: ToolArg, b: ToolArg, raw: Value) -> ToolResponse {
    run("list change requests", a, b, |client| async move {
        let params: ListChangeRequestsParams = resolve_params(raw, &[])?;
        tracing::debug!(?params, "list_change_requests called");

        let filter = EncodedQuery::new()
            .equals("state", params.state.as_deref())
            .equals("type", params.change_type.as_ref().map(|t| t.as_str()))
            .equals("category", params.category.as_deref())
            .equals("assignment_group", params.assignment_group.as_deref())
            .raw(params.timeframe.as_ref().map(|t| t.condition()))
            .raw(params.query.as_deref())
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

        let changes: Vec<ChangeRequest> = client.get(&format!("/table/{}", TABLE), query).await?;
        let changes: Vec<ChangeSummary> = changes.into_iter().map(ChangeSummary::from).collect();

        Ok(ToolResponse::ok(
            format!("Found {} change requests", changes.len()),
            json!({ "change_requests": to_data(&changes)?, "count": changes.len() }),
        ))
    })
    .await
}

/// Fetches one change request together with its change tasks.
pub async fn get_change_request_details(a: ToolArg, b: ToolArg, raw: Value) -> ToolResponse {
    run("get change request details", a, b, |client| async move {
        let params: GetChangeRequestDetailsParams = resolve_params(raw, &["change_id"])?;
        let sys_id = client
            .resolve_record_id(TABLE, params.change_id.trim())
            .await?;
        tracing::debug!(change_id = %params.change_id, sys_id = %sys_id, "get_change_request_details called");

        let display = || {
            vec![
                ("sysparm_display_value", "true".to_string()),
                ("sysparm_exclude_reference_link", "true".to_string()),
            ]
        };

        let change: ChangeRequest = client.get(&record_path(TABLE, &sys_id), display()).await?;

        let mut task_query = display();
        task_query.push(("sysparm_query", format!("change_request={}", sys_id)));
        let tasks: Vec<ChangeTask> = client
            .get(&format!("/table/{}", TASK_TABLE), task_query)
            .await?;

        Ok(ToolResponse::ok(
            "Change request retrieved successfully",
            json!({
                "change_request": to_data(&ChangeSummary::from(change))?,
                "tasks": to_data(&tasks)?,
            }),
        ))
    })
    .await
}

/// Approves a change and moves it to `implement`.
pub async fn approve_change(a: ToolArg, b: ToolArg, raw: Value) -> ToolResponse {
    run("approve change", a, b, |client| async move {
        let params: ApproveChangeParams = resolve_params(raw, &["change_id"])?;
        let sys_id = client
            .resolve_record_id(TABLE, params.change_id.trim())
            .await?;
        tracing::debug!(change_id = %params.change_id, "approve_change called");

        let mut approval = json!({ "state": "approved" });
        if let Some(comments) = params.approval_comments.as_deref() {
            approval["comments"] = json!(comments);
        }
        let approval_id = find_approval(&client, &sys_id, params.approver_id.as_deref()).await?;
        let _: Value = client
            .patch(&record_path(APPROVAL_TABLE, &approval_id), &approval)
            .await?;

        let _: Value = client
            .patch(&record_path(TABLE, &sys_id), &json!({ "state": STATE_IMPLEMENT }))
            .await?;

        Ok(ToolResponse::done("Change request approved successfully"))
    })
    .await
}

/// Rejects a change and moves it to `canceled`. `rejection_reason` is required.
pub async fn reject_change(a: ToolArg, b: ToolArg, raw: Value) -> ToolResponse {
    run("reject change", a, b, |client| async move {
        let params: RejectChangeParams = resolve_params(raw, &["change_id", "rejection_reason"])?;
        let sys_id = client
            .resolve_record_id(TABLE, params.change_id.trim())
            .await?;
        tracing::debug!(change_id = %params.change_id, "reject_change called");

        let approval_id = find_approval(&client, &sys_id, params.approver_id.as_deref()).await?;
        let _: Value = client
            .patch(
                &record_path(APPROVAL_TABLE, &approval_id),
                &json!({ "state": "rejected", "comments": params.rejection_reason }),
            )
            .await?;

        let _: Value = client
            .patch(
                &record_path(TABLE, &sys_id),
                &json!({
                    "state": STATE_CANCELED,
                    "work_notes": format!("Change request rejected: {}", params.rejection_reason),
                }),
            )
            .await?;

        Ok(ToolResponse::done("Change request rejected successfully"))
    })
    .await
}

/// Returns the sys_id of the first approval row for a change.
async fn find_approval(
    client: &ApiClient,
    change_sys_id: &str,
    approver: Option<&str>,
) -> Result<String, FrostError> {
    let approver = approver
        .map(|id| query_literal("approver_id", id.trim()))
        .transpose()?;
    let filter = EncodedQuery::new()
        .equals("document_id", Some(change_sys_id))
        .equals("approver", approver)
        .build()
        .unwrap_or_default();

    let approvals: Vec<Approval> = client
        .get(
            &format!("/table/{}", APPROVAL_TABLE),
            vec![
                ("sysparm_query", filter),
                ("sysparm_limit", "1".to_string()),
            ],
        )
        .await?;

    approvals
        .into_iter()
        .next()
        .map(|approval| approval.sys_id)
        .ok_or_else(|| FrostError::not_found("approval record for change request", change_sys_id))
}
