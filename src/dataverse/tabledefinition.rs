use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dataverse::tableattribute::TableAttribute;

/// Projection of one custom table returned by
/// [`AdminClient::get_tables`](crate::dataverse::adminclient::AdminClient::get_tables).
#[derive(Debug, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Logical name of the table.
    #[serde(rename = "LogicalName")]
    pub logical_name: String,
    /// Schema name of the table.
    #[serde(rename = "SchemaName")]
    pub schema_name: String,
    /// Display name payload as returned by the platform.
    #[serde(rename = "DisplayName")]
    pub display_name: Option<Value>,
    /// Entity set (collection) name used for record operations.
    #[serde(rename = "EntitySetName")]
    pub entity_set_name: String,
    /// Additional fields returned by the API.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// One table's full definition with its attribute list expanded in the same
/// response, as returned by
/// [`AdminClient::get_table_schema`](crate::dataverse::adminclient::AdminClient::get_table_schema).
#[derive(Debug, Serialize, Deserialize)]
pub struct TableDetails {
    /// Logical name of the table.
    #[serde(rename = "LogicalName")]
    pub logical_name: String,
    /// Schema name of the table.
    #[serde(rename = "SchemaName")]
    pub schema_name: String,
    /// Display name payload as returned by the platform.
    #[serde(rename = "DisplayName")]
    pub display_name: Option<Value>,
    /// Entity set (collection) name.
    #[serde(rename = "EntitySetName")]
    pub entity_set_name: Option<String>,
    /// Primary ID attribute logical name.
    #[serde(rename = "PrimaryIdAttribute")]
    pub primary_id_attribute: Option<String>,
    /// Expanded attribute list.
    #[serde(rename = "Attributes", default)]
    pub attributes: Vec<TableAttribute>,
}
