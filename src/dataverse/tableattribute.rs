use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attribute metadata as returned inside an expanded table definition.
///
/// Type-specific fields (`MaxLength`, `Targets`) are only present on the
/// attribute kinds that carry them.
#[derive(Debug, Serialize, Deserialize)]
pub struct TableAttribute {
    /// Logical name of the attribute.
    #[serde(rename = "LogicalName")]
    pub logical_name: String,
    /// Schema name of the attribute.
    #[serde(rename = "SchemaName")]
    pub schema_name: Option<String>,
    /// Attribute type name, e.g. `String`, `Picklist`, `Lookup`.
    #[serde(rename = "AttributeType")]
    pub attribute_type: Option<String>,
    /// Required-level payload.
    #[serde(rename = "RequiredLevel")]
    pub required_level: Option<Value>,
    /// Maximum length, for string attributes.
    #[serde(rename = "MaxLength")]
    pub max_length: Option<i32>,
    /// Lookup target tables, for lookup attributes.
    #[serde(rename = "Targets")]
    pub targets: Option<Vec<String>>,
    /// True if the attribute is custom.
    #[serde(rename = "IsCustomAttribute")]
    pub is_custom_attribute: Option<bool>,
}
