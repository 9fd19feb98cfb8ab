//! Change management models for the ServiceNow Table API.

use serde::{Deserialize, Serialize};

use super::{display_field, FieldValue};

/// A change request as returned by `table/change_request`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeRequest {
    /// Unique record id.
    pub sys_id: String,

    /// Human-facing number, e.g. `CHG0030001`.
    #[serde(default)]
    pub number: Option<String>,

    /// One-line summary.
    #[serde(default)]
    pub short_description: Option<String>,

    /// Full description.
    #[serde(default)]
    pub description: Option<String>,

    /// Change type: normal, standard or emergency.
    #[serde(default, rename = "type")]
    pub change_type: Option<FieldValue>,

    /// Workflow state.
    #[serde(default)]
    pub state: Option<FieldValue>,

    /// Risk rating.
    #[serde(default)]
    pub risk: Option<FieldValue>,

    /// Impact rating.
    #[serde(default)]
    pub impact: Option<FieldValue>,

    /// Category.
    #[serde(default)]
    pub category: Option<FieldValue>,

    /// Owning group reference.
    #[serde(default)]
    pub assignment_group: Option<FieldValue>,

    /// Planned start.
    #[serde(default)]
    pub start_date: Option<String>,

    /// Planned end.
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Flattened change request returned to tool callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeSummary {
    pub sys_id: String,
    pub number: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub change_type: Option<String>,
    pub state: Option<String>,
    pub risk: Option<String>,
    pub impact: Option<String>,
    pub category: Option<String>,
    pub assignment_group: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl From<ChangeRequest> for ChangeSummary {
    fn from(change: ChangeRequest) -> Self {
        Self {
            change_type: display_field(&change.change_type),
            state: display_field(&change.state),
            risk: display_field(&change.risk),
            impact: display_field(&change.impact),
            category: display_field(&change.category),
            assignment_group: display_field(&change.assignment_group),
            sys_id: change.sys_id,
            number: change.number,
            short_description: change.short_description,
            description: change.description,
            start_date: change.start_date,
            end_date: change.end_date,
        }
    }
}

/// A task attached to a change request (`table/change_task`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChangeTask {
    /// Unique record id.
    pub sys_id: String,

    /// Task number.
    #[serde(default)]
    pub number: Option<String>,

    /// One-line summary.
    #[serde(default)]
    pub short_description: Option<String>,

    /// Task state.
    #[serde(default)]
    pub state: Option<FieldValue>,
}

/// An approval row (`table/sysapproval_approver`).
#[derive(Debug, Clone, Deserialize)]
pub struct Approval {
    /// Unique record id.
    pub sys_id: String,

    /// Approval state, e.g. `requested`.
    #[serde(default)]
    pub state: Option<FieldValue>,
}
