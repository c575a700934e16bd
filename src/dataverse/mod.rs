/// Metadata and record operations against the Dataverse Web API.
pub mod adminclient;
/// Wire-format builders for entity and attribute metadata documents.
pub mod metadata;
/// OData query clause options.
pub mod query;
/// Abstract table and column schema types.
pub mod schema;
/// Attribute metadata returned by the platform.
pub mod tableattribute;
/// Table metadata returned by the platform.
pub mod tabledefinition;

pub(crate) mod parse;
