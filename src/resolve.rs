//! Parameter and role resolution for tool calls.
//!
//! Tool callers are not consistent about how they pass arguments: some wrap
//! the real parameters in an extra `{"params": {...}}` envelope, some send a
//! stringified JSON object, and some call sites hand over the credential
//! provider and destination config in swapped order. Everything here turns
//! those shapes into one typed value or a specific `FrostError`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::auth::{CredentialProvider, HeaderProvider};
use crate::config::{ConfigProvider, DestinationConfig};
use crate::error::FrostError;

/// Key of the envelope some callers wrap their parameters in.
const PARAMS_ENVELOPE_KEY: &str = "params";

/// Decodes raw call arguments into the operation's parameter type.
///
/// 1. A mapping whose only key is `params` holding another mapping is
///    unwrapped, once.
/// 2. A string holding a JSON object is decoded; any other non-mapping is
///    rejected with `InvalidInput`.
/// 3. Every name in `required` must be present as a key, regardless of
///    whether `T` itself marks the field optional.
/// 4. The mapping is decoded into `T`; type and enum mismatches become
///    `Validation`.
///
/// # Errors
///
/// Returns `InvalidInput`, `MissingField` or `Validation` as described above.
pub fn resolve_params<T>(raw: Value, required: &[&str]) -> Result<T, FrostError>
where
    T: DeserializeOwned,
{
    let mapping = into_mapping(unwrap_envelope(raw))?;
    check_required(&mapping, required)?;
    serde_json::from_value(Value::Object(mapping)).map_err(FrostError::validation)
}

/// Resolves parameters handed over as an already-typed value.
///
/// The value is serialized to a mapping and then goes through the same
/// checks as [`resolve_params`], so operation-level required fields are
/// still enforced.
///
/// # Errors
///
/// Returns `InvalidInput` naming `S` if it does not serialize to a mapping.
pub fn resolve_typed<S, T>(typed: &S, required: &[&str]) -> Result<T, FrostError>
where
    S: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let type_name = std::any::type_name::<S>();
    match serde_json::to_value(typed) {
        Ok(value @ Value::Object(_)) => resolve_params(value, required),
        Ok(_) | Err(_) => Err(FrostError::invalid_input(type_name)),
    }
}

fn unwrap_envelope(raw: Value) -> Value {
    match raw {
        Value::Object(mut mapping)
            if mapping.len() == 1
                && matches!(mapping.get(PARAMS_ENVELOPE_KEY), Some(Value::Object(_))) =>
        {
            tracing::warn!("Detected parameters wrapped in a 'params' key, unwrapping");
            mapping
                .remove(PARAMS_ENVELOPE_KEY)
                .unwrap_or(Value::Object(Map::new()))
        }
        other => other,
    }
}

fn into_mapping(value: Value) -> Result<Map<String, Value>, FrostError> {
    match value {
        Value::Object(mapping) => Ok(mapping),
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(mapping)) => {
                tracing::warn!("Parameters arrived as a JSON string, decoding");
                Ok(mapping)
            }
            _ => Err(FrostError::invalid_input("string")),
        },
        other => Err(FrostError::invalid_input(json_type_name(&other))),
    }
}

fn check_required(mapping: &Map<String, Value>, required: &[&str]) -> Result<(), FrostError> {
    match required.iter().find(|field| !mapping.contains_key(**field)) {
        Some(field) => Err(FrostError::missing_field(*field)),
        None => Ok(()),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One of the two context arguments a tool function receives.
#[derive(Clone)]
pub enum ToolArg {
    /// Produces request headers.
    Credentials(Arc<dyn HeaderProvider>),
    /// Describes the remote instance.
    Destination(Arc<dyn ConfigProvider>),
    /// Anything else; the string names what it was.
    Other(String),
}

impl ToolArg {
    /// Wraps any header provider.
    pub fn credentials<P: HeaderProvider + 'static>(provider: Arc<P>) -> Self {
        ToolArg::Credentials(provider)
    }

    /// Wraps any destination description.
    pub fn destination<C: ConfigProvider + 'static>(config: Arc<C>) -> Self {
        ToolArg::Destination(config)
    }

    fn role(&self) -> &str {
        match self {
            ToolArg::Credentials(_) => "credentials",
            ToolArg::Destination(_) => "destination config",
            ToolArg::Other(what) => what.as_str(),
        }
    }
}

impl From<Arc<CredentialProvider>> for ToolArg {
    fn from(provider: Arc<CredentialProvider>) -> Self {
        ToolArg::Credentials(provider)
    }
}

impl From<Arc<DestinationConfig>> for ToolArg {
    fn from(config: Arc<DestinationConfig>) -> Self {
        ToolArg::Destination(config)
    }
}

/// Header provider and destination pair a tool call works with.
pub type ToolContext = (Arc<dyn HeaderProvider>, Arc<dyn ConfigProvider>);

/// Sorts two context arguments into (credentials, destination).
///
/// Both the documented order and the swapped order are accepted.
///
/// # Errors
///
/// Returns `FrostError::Configuration` if the pair is not exactly one
/// credentials argument and one destination argument.
pub fn resolve_credentials_and_config(a: ToolArg, b: ToolArg) -> Result<ToolContext, FrostError> {
    match (a, b) {
        (ToolArg::Credentials(credentials), ToolArg::Destination(destination)) => {
            Ok((credentials, destination))
        }
        (ToolArg::Destination(destination), ToolArg::Credentials(credentials)) => {
            tracing::debug!("Tool context arguments arrived swapped");
            Ok((credentials, destination))
        }
        (a, b) => Err(FrostError::config(format!(
            "cannot determine credential/config roles (got {} and {})",
            a.role(),
            b.role()
        ))),
    }
}

/// Lenient field decoders for parameters produced by language models.
///
/// Numbers and booleans frequently arrive as strings; these accept both.
pub mod coerce {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    /// Decodes an optional `u32` from a number or a numeric string.
    pub fn opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<NumberOrString>::deserialize(deserializer)? {
            None => Ok(None),
            Some(NumberOrString::Number(n)) => u32::try_from(n)
                .map(Some)
                .map_err(|_| D::Error::custom(format!("number {} is out of range", n))),
            Some(NumberOrString::String(s)) => s
                .trim()
                .parse::<u32>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("expected a whole number, got '{}'", s))),
        }
    }

    /// Decodes an optional `bool` from a boolean or `"true"`/`"false"`.
    pub fn opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<BoolOrString>::deserialize(deserializer)? {
            None => Ok(None),
            Some(BoolOrString::Bool(b)) => Ok(Some(b)),
            Some(BoolOrString::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(D::Error::custom(format!("expected true or false, got '{}'", s))),
            },
        }
    }
}
