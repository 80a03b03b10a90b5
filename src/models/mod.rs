//! View models shared by the aggregator, the JSON endpoint and the renderer

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::arduino::{ApiDevice, ApiThing};

/// Name given to devices synthesized from a thing that carries no device name
pub const UNKNOWN_DEVICE_NAME: &str = "Unknown Device";

// ============================================================================
// Property values
// ============================================================================

/// Dynamically typed property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum PropertyValue {
    Number(serde_json::Number),
    Boolean(bool),
    Text(String),
    /// Objects, arrays and `null`
    Structured(Value),
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => PropertyValue::Number(n),
            Value::Bool(b) => PropertyValue::Boolean(b),
            Value::String(s) => PropertyValue::Text(s),
            other => PropertyValue::Structured(other),
        }
    }
}

impl From<PropertyValue> for Value {
    fn from(value: PropertyValue) -> Self {
        match value {
            PropertyValue::Number(n) => Value::Number(n),
            PropertyValue::Boolean(b) => Value::Bool(b),
            PropertyValue::Text(s) => Value::String(s),
            PropertyValue::Structured(v) => v,
        }
    }
}

impl PropertyValue {
    /// JSON text of the value: strings quoted, integral floats without a fraction
    pub fn display(&self) -> String {
        match self {
            PropertyValue::Number(n) => match n.as_f64() {
                Some(f) if n.is_f64() => number_text(f),
                _ => n.to_string(),
            },
            PropertyValue::Boolean(b) => b.to_string(),
            PropertyValue::Text(s) => Value::String(s.clone()).to_string(),
            PropertyValue::Structured(v) => v.to_string(),
        }
    }
}

/// Shortest round-trip text; exponent form outside `[1e-6, 1e21)`, as in JSON.stringify
fn number_text(f: f64) -> String {
    let magnitude = f.abs();
    if magnitude != 0.0 && !(1e-6..1e21).contains(&magnitude) {
        let text = format!("{f:e}");
        match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => text,
        }
    } else {
        format!("{f}")
    }
}

/// Wraps any value that is present in the payload, `null` included.
/// Pair with `#[serde(default)]` so an absent field stays `None`.
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Treats an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// ============================================================================
// Device / Thing / Property
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PropertyRecord")]
pub struct Property {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: String,
    pub permission: String,
    /// `None` when the record has no value field at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<PropertyValue>,
    pub update_strategy: String,
    pub variable_name: String,
}

/// Property as it arrives on the wire. The API reports `last_value`;
/// `value` wins when both are present.
#[derive(Deserialize)]
struct PropertyRecord {
    id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    name: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    property_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    permission: String,
    #[serde(default, deserialize_with = "present")]
    value: Option<PropertyValue>,
    #[serde(default, deserialize_with = "present")]
    last_value: Option<PropertyValue>,
    #[serde(default, deserialize_with = "null_as_default")]
    update_strategy: String,
    #[serde(default, deserialize_with = "null_as_default")]
    variable_name: String,
}

impl From<PropertyRecord> for Property {
    fn from(record: PropertyRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            property_type: record.property_type,
            permission: record.permission,
            value: record.value.or(record.last_value),
            update_strategy: record.update_strategy,
            variable_name: record.variable_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thing {
    pub id: String,
    pub name: String,
    pub device_id: String,
    /// Denormalized owner name, used when the owning device has to be synthesized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl Thing {
    pub fn from_api(thing: ApiThing, properties: Vec<Property>) -> Self {
        Self {
            id: thing.id,
            name: thing.name.unwrap_or_default(),
            device_id: thing.device_id.unwrap_or_default(),
            device_name: thing.device_name,
            created_at: thing.created_at,
            properties,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(default)]
    pub things: Vec<Thing>,
}

impl Device {
    pub fn from_api(device: ApiDevice, things: Vec<Thing>) -> Self {
        Self {
            id: device.id,
            name: device.name.unwrap_or_else(|| UNKNOWN_DEVICE_NAME.to_string()),
            serial: device.serial,
            device_type: device.device_type,
            things,
        }
    }

    /// Device entry created on first sight of an unseen device id
    pub fn synthesized(id: &str, name: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            name: name.unwrap_or(UNKNOWN_DEVICE_NAME).to_string(),
            serial: None,
            device_type: None,
            things: Vec::new(),
        }
    }
}
