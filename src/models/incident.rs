//! Incident models for the ServiceNow Table API.

use serde::{Deserialize, Serialize};

use super::{display_field, FieldValue};

/// An incident record as returned by `table/incident`.
#[derive(Debug, Clone, Deserialize)]
pub struct Incident {
    /// Unique record id.
    pub sys_id: String,

    /// Human-facing number, e.g. `INC0010001`.
    #[serde(default)]
    pub number: Option<String>,

    /// One-line summary.
    #[serde(default)]
    pub short_description: Option<String>,

    /// Full description.
    #[serde(default)]
    pub description: Option<String>,

    /// Incident state (numeric code or display value).
    #[serde(default)]
    pub state: Option<FieldValue>,

    /// Priority (numeric code or display value).
    #[serde(default)]
    pub priority: Option<FieldValue>,

    /// Assignee reference.
    #[serde(default)]
    pub assigned_to: Option<FieldValue>,

    /// Category.
    #[serde(default)]
    pub category: Option<FieldValue>,

    /// Subcategory.
    #[serde(default)]
    pub subcategory: Option<FieldValue>,

    /// Creation timestamp.
    #[serde(default)]
    pub sys_created_on: Option<String>,

    /// Last update timestamp.
    #[serde(default)]
    pub sys_updated_on: Option<String>,
}

/// Flattened incident returned to tool callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentSummary {
    pub sys_id: String,
    pub number: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub state: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub created_on: Option<String>,
    pub updated_on: Option<String>,
}

impl From<Incident> for IncidentSummary {
    fn from(incident: Incident) -> Self {
        Self {
            state: display_field(&incident.state),
            priority: display_field(&incident.priority),
            assigned_to: display_field(&incident.assigned_to),
            category: display_field(&incident.category),
            subcategory: display_field(&incident.subcategory),
            sys_id: incident.sys_id,
            number: incident.number,
            short_description: incident.short_description,
            description: incident.description,
            created_on: incident.sys_created_on,
            updated_on: incident.sys_updated_on,
        }
    }
}
