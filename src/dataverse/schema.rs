use serde::{Deserialize, Serialize};

/// Describes a table to create.
///
/// Constructed by a caller and consumed once by
/// [`AdminClient::create_table`](crate::dataverse::adminclient::AdminClient::create_table).
/// Logical names are expected to carry a publisher prefix (e.g. `cr123_project`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    /// Platform-qualified logical name.
    pub logical_name: String,
    /// Display name of the table.
    pub display_name: String,
    /// Plural display name of the table.
    pub plural_name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Columns to create, in order.
    pub columns: Vec<ColumnSchema>,
}

/// Describes one column of a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Platform-qualified logical name.
    pub logical_name: String,
    /// Display name of the column.
    pub display_name: String,
    /// Whether the platform should require a value.
    pub required: bool,
    /// Data type, with type-specific settings as payload.
    pub column_type: ColumnType,
}

/// Closed set of column data types.
///
/// Each variant maps to exactly one attribute-metadata wire shape; `Other`
/// carries an unrecognized source tag and maps to the base attribute shape
/// with no type-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnType {
    /// Single-line text; `max_length` defaults to 100 when unset.
    String {
        /// Maximum length in characters.
        max_length: Option<i32>,
    },
    /// Signed 32-bit whole number.
    Number,
    /// Money with two-decimal precision.
    Currency,
    /// Date without a time component.
    Date,
    /// Date and time.
    DateTime,
    /// Two-valued choice rendered with Yes/No labels.
    Boolean,
    /// Local (non-global) option set.
    Choice {
        /// Options in display order.
        options: Vec<ChoiceOption>,
    },
    /// Reference to a record of another table.
    Lookup {
        /// Logical name of the target table.
        target: Option<String>,
    },
    /// Unrecognized source tag; degraded to the base attribute shape.
    Other(String),
}

/// One entry of a [`ColumnType::Choice`] option set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Numeric option value.
    pub value: i32,
    /// Display label for the option.
    pub label: String,
}
