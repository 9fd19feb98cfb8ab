//! User tools (`table/sys_user`).

use serde_json::{json, Value};

use super::{run, to_data, ToolResponse};
use crate::error::FrostError;
use crate::models::{EncodedQuery, User, UserSummary};
use crate::resolve::{resolve_params, ToolArg};
use crate::tools::inputs::{page_size, GetUserParams, ListUsersParams};

const TABLE: &str = "sys_user";

/// Lists users, optionally filtered by active flag, department or a search
/// term matched against name, user name and email.
pub async fn list_users(a: ToolArg, b: ToolArg, raw: Value) -> ToolResponse {
    run("list users", a, b, |client| async move {
        let params: ListUsersParams = resolve_params(raw, &[])?;
        tracing::debug!(?params, "list_users called");

        let search = params
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("nameLIKE{q}^ORuser_nameLIKE{q}^ORemailLIKE{q}"));
        let filter = EncodedQuery::new()
            .flag("active", params.active)
            .equals("department", params.department.as_deref())
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

        let users: Vec<User> = client.get(&format!("/table/{}", TABLE), query).await?;
        let users: Vec<UserSummary> = users.into_iter().map(UserSummary::from).collect();

        Ok(ToolResponse::ok(
            format!("Found {} users", users.len()),
            json!({ "users": to_data(&users)?, "count": users.len() }),
        ))
    })
    .await
}

/// Fetches a single user by sys_id, user name or email.
pub async fn get_user(a: ToolArg, b: ToolArg, raw: Value) -> ToolResponse {
    run("get user", a, b, |client| async move {
        let params: GetUserParams = resolve_params(raw, &[])?;
        let params = params.sanitize();
        let Some(selector) = params.selector()? else {
            return Err(FrostError::missing_field("user_id, user_name or email"));
        };
        tracing::debug!(selector = %selector, "get_user called");

        let users: Vec<User> = client
            .get(
                &format!("/table/{}", TABLE),
                vec![
                    ("sysparm_query", selector.clone()),
                    ("sysparm_limit", "1".to_string()),
                    ("sysparm_display_value", "true".to_string()),
                    ("sysparm_exclude_reference_link", "true".to_string()),
                ],
            )
            .await?;

        match users.into_iter().next() {
            Some(user) => Ok(ToolResponse::ok(
                "User found",
                json!({ "user": to_data(&UserSummary::from(user))? }),
            )),
            None => Err(FrostError::not_found("user", selector)),
        }
    })
    .await
}
