//! Common types shared across Table API models.
//!
//! This module defines the field representation used by every record and
//! the builder for `sysparm_query` encoded queries.

use serde::{Deserialize, Serialize};

/// A single field value as returned by the Table API.
///
/// Plain fields arrive as strings. Reference fields arrive as an object
/// with `value`/`display_value`/`link` unless the request asked for display
/// values with reference links excluded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A plain string value.
    Text(String),
    /// A reference to another record.
    Reference {
        /// The referenced record's display value.
        #[serde(default)]
        display_value: Option<String>,
        /// The referenced record's sys_id.
        #[serde(default)]
        value: Option<String>,
        /// REST link to the referenced record.
        #[serde(default)]
        link: Option<String>,
    },
}

impl FieldValue {
    /// Returns the human-readable form of the field.
    ///
    /// Empty strings and references without a value read as `None`.
    pub fn display(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) if text.is_empty() => None,
            FieldValue::Text(text) => Some(text.as_str()),
            FieldValue::Reference {
                display_value,
                value,
                ..
            } => display_value
                .as_deref()
                .or(value.as_deref())
                .filter(|v| !v.is_empty()),
        }
    }
}

/// Returns the display form of an optional field as an owned string.
pub fn display_field(field: &Option<FieldValue>) -> Option<String> {
    field.as_ref().and_then(FieldValue::display).map(str::to_string)
}

/// Builder for `sysparm_query` encoded queries.
///
/// Conditions are joined with `^` (AND).
#[derive(Debug, Clone, Default)]
pub struct EncodedQuery {
    parts: Vec<String>,
}

impl EncodedQuery {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `field=value` when a value is present.
    pub fn equals(mut self, field: &str, value: Option<&str>) -> Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.parts.push(format!("{}={}", field, value));
        }
        self
    }

    /// Adds `field=true|false` when a flag is present.
    pub fn flag(mut self, field: &str, value: Option<bool>) -> Self {
        if let Some(value) = value {
            self.parts.push(format!("{}={}", field, value));
        }
        self
    }

    /// Adds a raw encoded-query fragment when present.
    pub fn raw(mut self, fragment: Option<&str>) -> Self {
        if let Some(fragment) = fragment.map(str::trim).filter(|f| !f.is_empty()) {
            self.parts.push(fragment.to_string());
        }
        self
    }

    /// Renders the query, or `None` if it is empty.
    pub fn build(self) -> Option<String> {
        if self.parts.is_empty() {
            None
        } else {
            Some(self.parts.join("^"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_text() {
        let field: FieldValue = serde_json::from_str("\"2\"").unwrap();
        assert_eq!(field.display(), Some("2"));
    }

    #[test]
    fn test_field_value_reference_prefers_display_value() {
        let field: FieldValue = serde_json::from_str(
            r#"{"display_value": "Beth Anglin", "value": "46d44a", "link": "https://x"}"#,
        )
        .unwrap();
        assert_eq!(field.display(), Some("Beth Anglin"));
    }

    #[test]
    fn test_field_value_empty_reads_as_none() {
        let field: FieldValue = serde_json::from_str("\"\"").unwrap();
        assert_eq!(field.display(), None);
        assert_eq!(display_field(&None), None);
    }

    #[test]
    fn test_encoded_query_joins_present_parts() {
        let query = EncodedQuery::new()
            .equals("state", Some("2"))
            .equals("category", None)
            .flag("active", Some(false))
            .raw(Some("  priority<=2 "))
            .build();
        assert_eq!(query.as_deref(), Some("state=2^active=false^priority<=2"));
    }

    #[test]
    fn test_encoded_query_empty() {
        let query = EncodedQuery::new().equals("state", Some("")).raw(None);
        assert_eq!(query.build(), None);
    }
}
