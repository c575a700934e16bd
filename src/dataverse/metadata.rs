//! Builders for the `EntityMetadata`/`AttributeMetadata` documents the Web
//! API expects when defining tables and columns.

use serde_json::{Value, json};

use crate::dataverse::schema::{ColumnSchema, ColumnType, TableSchema};

/// Fixed locale used for every localized label.
pub(crate) const LANGUAGE_CODE: i32 = 1033;

/// Default `MaxLength` for string columns that do not specify one.
pub(crate) const DEFAULT_STRING_LENGTH: i32 = 100;

/// Money bounds the platform accepts, two-decimal precision.
pub(crate) const MONEY_BOUND: f64 = 922_337_203_685_477.0;

/// Localized label document under the fixed locale.
pub(crate) fn label(text: &str) -> Value {
    json!({
        "@odata.type": "Microsoft.Dynamics.CRM.Label",
        "LocalizedLabels": [{
            "@odata.type": "Microsoft.Dynamics.CRM.LocalizedLabel",
            "Label": text,
            "LanguageCode": LANGUAGE_CODE,
        }],
    })
}

/// Required level is two-valued; the platform's intermediate "Recommended"
/// level is not modeled.
fn required_level(required: bool) -> Value {
    json!({
        "Value": if required { "ApplicationRequired" } else { "None" },
        "CanBeChanged": true,
        "ManagedPropertyLogicalName": "canmodifyrequirementlevelsettings",
    })
}

/// Primary name attribute inferred from the table's logical name.
fn primary_name_attribute(table_logical_name: &str) -> Value {
    json!({
        "@odata.type": "Microsoft.Dynamics.CRM.StringAttributeMetadata",
        "SchemaName": format!("{table_logical_name}_name"),
        "DisplayName": label("Name"),
        "RequiredLevel": required_level(false),
        "IsPrimaryName": true,
        "FormatName": { "Value": "Text" },
        "MaxLength": DEFAULT_STRING_LENGTH,
    })
}

/// Full `EntityMetadata` document for one table: user-owned, no activities,
/// notes enabled, labels under the fixed locale.
pub(crate) fn table_definition(schema: &TableSchema) -> Value {
    json!({
        "@odata.type": "Microsoft.Dynamics.CRM.EntityMetadata",
        "SchemaName": schema.logical_name,
        "DisplayName": label(&schema.display_name),
        "DisplayCollectionName": label(&schema.plural_name),
        "Description": label(schema.description.as_deref().unwrap_or("")),
        "OwnershipType": "UserOwned",
        "HasActivities": false,
        "HasNotes": true,
        "IsActivity": false,
        "Attributes": [primary_name_attribute(&schema.logical_name)],
    })
}

/// `AttributeMetadata` document for one column.
///
/// Every column shares the base shape (schema name, localized display name,
/// required level, empty description); the data type selects exactly one
/// `@odata.type` extension. An unrecognized type yields the base shape only.
pub(crate) fn attribute_definition(column: &ColumnSchema) -> Value {
    let mut doc = json!({
        "SchemaName": column.logical_name,
        "DisplayName": label(&column.display_name),
        "Description": label(""),
        "RequiredLevel": required_level(column.required),
    });

    let typed = match &column.column_type {
        ColumnType::String { max_length } => Some(json!({
            "@odata.type": "Microsoft.Dynamics.CRM.StringAttributeMetadata",
            "FormatName": { "Value": "Text" },
            "MaxLength": max_length.unwrap_or(DEFAULT_STRING_LENGTH),
        })),
        ColumnType::Number => Some(json!({
            "@odata.type": "Microsoft.Dynamics.CRM.IntegerAttributeMetadata",
            "Format": "None",
            "MinValue": i32::MIN,
            "MaxValue": i32::MAX,
        })),
        ColumnType::Currency => Some(json!({
            "@odata.type": "Microsoft.Dynamics.CRM.MoneyAttributeMetadata",
            "Precision": 2,
            "PrecisionSource": 2,
            "MinValue": -MONEY_BOUND,
            "MaxValue": MONEY_BOUND,
        })),
        ColumnType::Date => Some(json!({
            "@odata.type": "Microsoft.Dynamics.CRM.DateTimeAttributeMetadata",
            "Format": "DateOnly",
        })),
        ColumnType::DateTime => Some(json!({
            "@odata.type": "Microsoft.Dynamics.CRM.DateTimeAttributeMetadata",
            "Format": "DateAndTime",
        })),
        ColumnType::Boolean => Some(json!({
            "@odata.type": "Microsoft.Dynamics.CRM.BooleanAttributeMetadata",
            "DefaultValue": false,
            "OptionSet": {
                "@odata.type": "Microsoft.Dynamics.CRM.BooleanOptionSetMetadata",
                "TrueOption": { "Value": 1, "Label": label("Yes") },
                "FalseOption": { "Value": 0, "Label": label("No") },
            },
        })),
        ColumnType::Choice { options } => Some(json!({
            "@odata.type": "Microsoft.Dynamics.CRM.PicklistAttributeMetadata",
            "OptionSet": {
                "@odata.type": "Microsoft.Dynamics.CRM.OptionSetMetadata",
                "IsGlobal": false,
                "OptionSetType": "Picklist",
                "Options": options
                    .iter()
                    .map(|option| json!({
                        "Value": option.value,
                        "Label": label(&option.label),
                    }))
                    .collect::<Vec<_>>(),
            },
        })),
        ColumnType::Lookup { target } => Some(json!({
            "@odata.type": "Microsoft.Dynamics.CRM.LookupAttributeMetadata",
            "Targets": target.as_ref().map(|t| vec![t.clone()]).unwrap_or_default(),
        })),
        ColumnType::Other(_) => None,
    };

    if let (Value::Object(fields), Some(Value::Object(extension))) = (&mut doc, typed) {
        fields.extend(extension);
    }

    doc
}
