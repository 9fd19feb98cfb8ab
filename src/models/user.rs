//! User models for the ServiceNow Table API.

use serde::{Deserialize, Serialize};

use super::{display_field, FieldValue};

/// A user record as returned by `table/sys_user`.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// Unique record id.
    pub sys_id: String,

    /// Login name.
    #[serde(default)]
    pub user_name: Option<String>,

    /// Full display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Email address.
    #[serde(default)]
    pub email: Option<String>,

    /// Job title.
    #[serde(default)]
    pub title: Option<String>,

    /// Department reference.
    #[serde(default)]
    pub department: Option<FieldValue>,

    /// Active flag, as the API renders it (`"true"` / `"false"`).
    #[serde(default)]
    pub active: Option<FieldValue>,
}

/// Flattened user returned to tool callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub sys_id: String,
    pub user_name: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub title: Option<String>,
    pub department: Option<String>,
    pub active: Option<bool>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            department: display_field(&user.department),
            active: display_field(&user.active).map(|a| a.eq_ignore_ascii_case("true")),
            sys_id: user.sys_id,
            user_name: user.user_name,
            name: user.name,
            email: user.email,
            title: user.title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_summary_parses_active_flag() {
        let user: User = serde_json::from_value(serde_json::json!({
            "sys_id": "u1",
            "user_name": "beth.anglin",
            "active": "true",
            "department": {"display_value": "IT", "value": "d1"}
        }))
        .unwrap();

        let summary = UserSummary::from(user);
        assert_eq!(summary.active, Some(true));
        assert_eq!(summary.department.as_deref(), Some("IT"));
    }
}
