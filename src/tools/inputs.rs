//! Tool parameter structs.
//!
//! Each struct is the decoded form of one tool's arguments, produced by
//! [`crate::resolve::resolve_params`]. Write-side structs double as the
//! request body: fields that are `None` are left out, and identifier
//! fields that only select the record are never serialized.
//!
//! # Input Sanitization
//!
//! String fields are trimmed by `sanitize()`; blank optional strings
//! become `None`.
//!
//! The derived JSON schemas describe the flat argument shape to MCP clients.
//! Required fields are advertised as optional there, because a call wrapped
//! in a `params` envelope must still pass client-side validation. Presence
//! is checked by the resolver instead.

use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

use crate::client::query_literal;
use crate::error::FrostError;
use crate::resolve::coerce;

/// Default page size for list tools.
pub const DEFAULT_LIMIT: u32 = 10;

/// Upper bound on page size for list tools.
pub const MAX_LIMIT: u32 = 100;

/// Helper function to trim an optional string.
fn trim_option(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Clamps an optional page size to `1..=MAX_LIMIT`.
pub fn page_size(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

// ============================================================================
// Incidents
// ============================================================================

/// Parameters for the create_incident tool.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct CreateIncidentParams {
    /// Short description of the incident (required).
    #[schemars(with = "Option<String>")]
    pub short_description: String,

    /// Detailed description of the incident.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// User who reported the incident.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_id: Option<String>,

    /// Category of the incident.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Subcategory of the incident.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,

    /// Priority of the incident.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    /// Impact of the incident.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,

    /// Urgency of the incident.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,

    /// User assigned to the incident.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,

    /// Group assigned to the incident.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_group: Option<String>,
}

impl CreateIncidentParams {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            short_description: self.short_description.trim().to_string(),
            description: trim_option(self.description),
            caller_id: trim_option(self.caller_id),
            category: trim_option(self.category),
            subcategory: trim_option(self.subcategory),
            priority: trim_option(self.priority),
            impact: trim_option(self.impact),
            urgency: trim_option(self.urgency),
            assigned_to: trim_option(self.assigned_to),
            assignment_group: trim_option(self.assignment_group),
        }
    }
}

/// Parameters for the update_incident tool.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct UpdateIncidentParams {
    /// Incident number or sys_id (required).
    #[serde(skip_serializing)]
    #[schemars(with = "Option<String>")]
    pub incident_id: String,

    /// New short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,

    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// New state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// New category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// New subcategory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,

    /// New priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    /// New impact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,

    /// New urgency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,

    /// New assignee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,

    /// New assignment group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_group: Option<String>,

    /// Work notes to append.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_notes: Option<String>,

    /// Close notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_notes: Option<String>,

    /// Close code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_code: Option<String>,
}

impl UpdateIncidentParams {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            incident_id: self.incident_id.trim().to_string(),
            short_description: trim_option(self.short_description),
            description: trim_option(self.description),
            state: trim_option(self.state),
            category: trim_option(self.category),
            subcategory: trim_option(self.subcategory),
            priority: trim_option(self.priority),
            impact: trim_option(self.impact),
            urgency: trim_option(self.urgency),
            assigned_to: trim_option(self.assigned_to),
            assignment_group: trim_option(self.assignment_group),
            work_notes: trim_option(self.work_notes),
            close_notes: trim_option(self.close_notes),
            close_code: trim_option(self.close_code),
        }
    }
}

/// Parameters for the add_comment tool.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct AddCommentParams {
    /// Incident number or sys_id (required).
    #[schemars(with = "Option<String>")]
    pub incident_id: String,

    /// Comment text (required).
    #[schemars(with = "Option<String>")]
    pub comment: String,

    /// Post as an internal work note instead of a customer-visible comment.
    #[serde(default, deserialize_with = "coerce::opt_bool")]
    pub is_work_note: Option<bool>,
}

/// Parameters for the resolve_incident tool.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ResolveIncidentParams {
    /// Incident number or sys_id (required).
    #[schemars(with = "Option<String>")]
    pub incident_id: String,

    /// Resolution (close) code (required).
    #[schemars(with = "Option<String>")]
    pub resolution_code: String,

    /// Resolution (close) notes (required).
    #[schemars(with = "Option<String>")]
    pub resolution_notes: String,
}

/// Parameters for the list_incidents tool.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct ListIncidentsParams {
    /// Maximum number of incidents to return (default 10, max 100).
    #[serde(default, deserialize_with = "coerce::opt_u32")]
    pub limit: Option<u32>,

    /// Offset for pagination.
    #[serde(default, deserialize_with = "coerce::opt_u32")]
    pub offset: Option<u32>,

    /// Filter by state.
    #[serde(default)]
    pub state: Option<String>,

    /// Filter by assignee.
    #[serde(default)]
    pub assigned_to: Option<String>,

    /// Filter by category.
    #[serde(default)]
    pub category: Option<String>,

    /// Additional encoded query.
    #[serde(default)]
    pub query: Option<String>,
}

// ============================================================================
// Change requests
// ============================================================================

/// Kind of change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// Assessed and approved per change.
    Normal,
    /// Pre-approved, low risk.
    Standard,
    /// Expedited.
    Emergency,
}

impl ChangeType {
    /// Value as stored in the `type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Normal => "normal",
            ChangeType::Standard => "standard",
            ChangeType::Emergency => "emergency",
        }
    }
}

/// Time window filter for change requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum Timeframe {
    /// Planned to start in the future.
    #[serde(rename = "upcoming")]
    Upcoming,
    /// Started and not yet ended.
    #[serde(rename = "in-progress")]
    InProgress,
    /// Already ended.
    #[serde(rename = "completed")]
    Completed,
}

impl Timeframe {
    /// Encoded-query fragment selecting the window relative to now.
    pub fn condition(&self) -> &'static str {
        match self {
            Timeframe::Upcoming => "start_date>javascript:gs.nowDateTime()",
            Timeframe::InProgress => {
                "start_date<javascript:gs.nowDateTime()^end_date>javascript:gs.nowDateTime()"
            }
            Timeframe::Completed => "end_date<javascript:gs.nowDateTime()",
        }
    }
}

/// Parameters for the create_change_request tool.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct CreateChangeRequestParams {
    /// Short description of the change (required).
    #[schemars(with = "Option<String>")]
    pub short_description: String,

    /// Change type (required).
    #[serde(rename = "type")]
    #[schemars(with = "Option<ChangeType>")]
    pub change_type: ChangeType,

    /// Detailed description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Risk level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<String>,

    /// Impact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,

    /// Category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Requesting user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,

    /// Owning group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_group: Option<String>,

    /// Planned start (YYYY-MM-DD HH:MM:SS).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    /// Planned end (YYYY-MM-DD HH:MM:SS).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl CreateChangeRequestParams {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            short_description: self.short_description.trim().to_string(),
            change_type: self.change_type,
            description: trim_option(self.description),
            risk: trim_option(self.risk),
            impact: trim_option(self.impact),
            category: trim_option(self.category),
            requested_by: trim_option(self.requested_by),
            assignment_group: trim_option(self.assignment_group),
            start_date: trim_option(self.start_date),
            end_date: trim_option(self.end_date),
        }
    }
}

/// Parameters for the list_change_requests tool.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct ListChangeRequestsParams {
    /// Maximum number of records to return (default 10, max 100).
    #[serde(default, deserialize_with = "coerce::opt_u32")]
    pub limit: Option<u32>,

    /// Offset for pagination.
    #[serde(default, deserialize_with = "coerce::opt_u32")]
    pub offset: Option<u32>,

    /// Filter by state.
    #[serde(default)]
    pub state: Option<String>,

    /// Filter by change type.
    #[serde(default, rename = "type")]
    pub change_type: Option<ChangeType>,

    /// Filter by category.
    #[serde(default)]
    pub category: Option<String>,

    /// Filter by assignment group.
    #[serde(default)]
    pub assignment_group: Option<String>,

    /// Filter by planned window.
    #[serde(default)]
    pub timeframe: Option<Timeframe>,

    /// Additional encoded query.
    #[serde(default)]
    pub query: Option<String>,
}

/// Parameters for the get_change_request_details tool.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct GetChangeRequestDetailsParams {
    /// Change request number or sys_id (required).
    #[schemars(with = "Option<String>")]
    pub change_id: String,
}

/// Parameters for the approve_change tool.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ApproveChangeParams {
    /// Change request number or sys_id (required).
    #[schemars(with = "Option<String>")]
    pub change_id: String,

    /// Approver recorded on the approval.
    #[serde(default)]
    pub approver_id: Option<String>,

    /// Comments for the approval.
    #[serde(default)]
    pub approval_comments: Option<String>,
}

/// Parameters for the reject_change tool.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct RejectChangeParams {
    /// Change request number or sys_id (required).
    #[schemars(with = "Option<String>")]
    pub change_id: String,

    /// Approver recorded on the rejection.
    #[serde(default)]
    pub approver_id: Option<String>,

    /// Reason for rejection (required).
    #[schemars(with = "Option<String>")]
    pub rejection_reason: String,
}

// ============================================================================
// Users
// ============================================================================

/// Parameters for the list_users tool.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct ListUsersParams {
    /// Maximum number of users to return (default 10, max 100).
    #[serde(default, deserialize_with = "coerce::opt_u32")]
    pub limit: Option<u32>,

    /// Offset for pagination.
    #[serde(default, deserialize_with = "coerce::opt_u32")]
    pub offset: Option<u32>,

    /// Filter by active flag.
    #[serde(default, deserialize_with = "coerce::opt_bool")]
    pub active: Option<bool>,

    /// Filter by department.
    #[serde(default)]
    pub department: Option<String>,

    /// Matched against name, user name and email.
    #[serde(default)]
    pub query: Option<String>,
}

/// Parameters for the get_user tool.
///
/// One of the three selectors is needed; `user_id` wins over `user_name`,
/// which wins over `email`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct GetUserParams {
    /// User sys_id.
    #[serde(default)]
    pub user_id: Option<String>,

    /// Login name.
    #[serde(default)]
    pub user_name: Option<String>,

    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
}

impl GetUserParams {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            user_id: trim_option(self.user_id),
            user_name: trim_option(self.user_name),
            email: trim_option(self.email),
        }
    }

    /// Encoded query for the chosen selector, if any was given.
    ///
    /// # Errors
    ///
    /// Returns `FrostError::Validation` if the chosen value contains `^`.
    pub fn selector(&self) -> Result<Option<String>, FrostError> {
        let chosen = if let Some(id) = &self.user_id {
            Some(("sys_id", id))
        } else if let Some(name) = &self.user_name {
            Some(("user_name", name))
        } else {
            self.email.as_ref().map(|email| ("email", email))
        };

        match chosen {
            Some((field, value)) => Ok(Some(format!("{}={}", field, query_literal(field, value)?))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve_params;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_page_size_defaults_and_clamps() {
        assert_eq!(page_size(None), DEFAULT_LIMIT);
        assert_eq!(page_size(Some(0)), 1);
        assert_eq!(page_size(Some(500)), MAX_LIMIT);
    }

    #[test]
    fn test_create_incident_body_skips_missing_fields() {
        let params: CreateIncidentParams = resolve_params(
            json!({"short_description": "  Email down ", "priority": " ", "urgency": "1"}),
            &["short_description"],
        )
        .unwrap();
        let body = serde_json::to_value(params.sanitize()).unwrap();

        assert_eq!(body, json!({"short_description": "Email down", "urgency": "1"}));
    }

    #[test]
    fn test_update_incident_body_omits_identifier() {
        let params: UpdateIncidentParams =
            resolve_params(json!({"incident_id": "INC1", "state": "2"}), &["incident_id"]).unwrap();
        let body = serde_json::to_value(params.sanitize()).unwrap();

        assert_eq!(body, json!({"state": "2"}));
    }

    #[test]
    fn test_change_type_must_be_known() {
        let result = resolve_params::<CreateChangeRequestParams>(
            json!({"short_description": "Patch", "type": "whenever"}),
            &["short_description", "type"],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_timeframe_accepts_hyphenated_name() {
        let params: ListChangeRequestsParams =
            resolve_params(json!({"timeframe": "in-progress", "limit": "5"}), &[]).unwrap();
        assert_eq!(params.timeframe, Some(Timeframe::InProgress));
        assert_eq!(params.limit, Some(5));
    }

    #[test]
    fn test_get_user_selector_precedence() {
        let params = GetUserParams {
            user_id: None,
            user_name: Some("beth.anglin".into()),
            email: Some("beth@example.com".into()),
        };
        assert_eq!(
            params.selector().unwrap().as_deref(),
            Some("user_name=beth.anglin")
        );
        assert_eq!(GetUserParams::default().selector().unwrap(), None);
    }

    #[test]
    fn test_get_user_selector_rejects_extra_conditions() {
        let params = GetUserParams {
            email: Some("a@example.com^ORactive=true".into()),
            ..GetUserParams::default()
        };
        assert!(params.selector().is_err());
    }
}
