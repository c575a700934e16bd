use std::collections::HashMap;

use log::debug;
use reqwest::{Client, Method, Response};
use serde_json::Value;

use crate::LogLevel;
use crate::connection::ConnectionDescriptor;
use crate::dataverse::metadata;
use crate::dataverse::parse;
use crate::dataverse::query::QueryOptions;
use crate::dataverse::schema::{ColumnSchema, TableSchema};
use crate::dataverse::tabledefinition::{TableDefinition, TableDetails};
use crate::error::{DataverseError, Stage};

/// Untyped field values for one record. Values are caller-supplied and not
/// validated against the table schema; the platform validates server-side.
pub type RecordPayload = HashMap<String, Value>;

/// OData list wrapper returned by Dataverse collection endpoints.
#[derive(Debug, serde::Deserialize)]
struct ODataList<T> {
    value: Vec<T>,
}

/// Outcome of [`AdminClient::test_connection`]. Never surfaced as an `Err`.
#[derive(Debug)]
pub enum ConnectionStatus {
    /// The Web API root answered with a success status.
    Ok,
    /// The probe failed; `error` names the likely cause.
    Failed {
        /// Human-readable failure description.
        error: String,
        /// Raw error body from the platform, when one was returned.
        details: Option<Value>,
    },
}

impl ConnectionStatus {
    /// True when the probe succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(self, ConnectionStatus::Ok)
    }
}

/// Client for Dataverse Web API table metadata and record operations.
///
/// Holds no mutable state beyond the immutable connection descriptor, so a
/// single instance can serve concurrent callers. Constructed explicitly and
/// passed by reference to consuming code; no module-level singleton. Every
/// operation is one stateless round trip with no retries and no timeout
/// beyond the transport default; retry policy belongs to the caller.
pub struct AdminClient {
    client: Client,
    connection: ConnectionDescriptor,
    token: String,
    log_level: LogLevel,
}

impl AdminClient {
    /// Create a client for the given environment and bearer token.
    pub fn new(connection: ConnectionDescriptor, token: &str, log_level: LogLevel) -> Self {
        Self {
            client: Client::new(),
            connection,
            token: token.to_string(),
            log_level,
        }
    }

    /// The environment this client talks to.
    pub fn connection(&self) -> &ConnectionDescriptor {
        &self.connection
    }

    /// Request builder with the fixed Web API header set.
    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .header("OData-MaxVersion", "4.0")
            .header("OData-Version", "4.0")
    }

    fn log_request(&self, method: &str, url: &str) {
        if matches!(self.log_level, LogLevel::Debug) {
            debug!("{method} {url}");
        }
    }

    /// Consume a non-success response into a platform-tier error.
    async fn platform_error(stage: Stage, resp: Response) -> DataverseError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        DataverseError::Platform {
            stage,
            status,
            message: parse::error_message_from_body(&body, status),
        }
    }

    /// Probe the environment with a metadata GET against the Web API root.
    ///
    /// Never fails: precondition, transport, and platform failures are all
    /// folded into [`ConnectionStatus::Failed`].
    pub async fn test_connection(&self) -> ConnectionStatus {
        if let Err(err) = self.connection.validate(Stage::ConnectionTest) {
            return ConnectionStatus::Failed {
                error: err.to_string(),
                details: None,
            };
        }

        let url = self.connection.api_root();
        self.log_request("GET", &url);

        match self.request(Method::GET, &url).send().await {
            Ok(resp) if resp.status().is_success() => ConnectionStatus::Ok,
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                ConnectionStatus::Failed {
                    error: format!("Dataverse answered {status}"),
                    details: serde_json::from_str(&body).ok(),
                }
            }
            Err(err) => {
                let details = Value::String(err.to_string());
                ConnectionStatus::Failed {
                    error: DataverseError::from_transport(Stage::ConnectionTest, err).to_string(),
                    details: Some(details),
                }
            }
        }
    }

    /// Create a table and then its columns, in order.
    ///
    /// Returns the new table's id parsed from the `OData-EntityId` response
    /// header, or `None` when the platform omitted the header (the table was
    /// still created).
    ///
    /// Columns are created sequentially, each awaited before the next: the
    /// platform serializes schema changes per table, and a stable order
    /// keeps the failure point meaningful. On the first column failure the
    /// error propagates immediately; the table and the columns already
    /// created remain — there is no compensating rollback.
    pub async fn create_table(&self, schema: &TableSchema) -> Result<Option<String>, DataverseError> {
        self.connection.validate(Stage::TableCreation)?;

        let url = format!("{}/EntityDefinitions", self.connection.api_root());
        self.log_request("POST", &url);

        let payload = metadata::table_definition(schema);
        if matches!(self.log_level, LogLevel::Debug) {
            debug!("entity definition: {payload}");
        }

        let resp = self
            .request(Method::POST, &url)
            .json(&payload)
            .send()
            .await
            .map_err(|err| DataverseError::from_transport(Stage::TableCreation, err))?;

        if !resp.status().is_success() {
            return Err(Self::platform_error(Stage::TableCreation, resp).await);
        }

        let table_id = resp
            .headers()
            .get("OData-EntityId")
            .and_then(|value| value.to_str().ok())
            .and_then(parse::entity_id_from_header);

        for column in &schema.columns {
            self.create_column(&schema.logical_name, column).await?;
        }

        Ok(table_id)
    }

    /// Create one column on an existing table.
    pub async fn create_column(
        &self,
        table_logical_name: &str,
        column: &ColumnSchema,
    ) -> Result<(), DataverseError> {
        self.connection.validate(Stage::ColumnCreation)?;

        let url = format!(
            "{}/EntityDefinitions(LogicalName='{}')/Attributes",
            self.connection.api_root(),
            quoted(table_logical_name)
        );
        self.log_request("POST", &url);

        let payload = metadata::attribute_definition(column);
        if matches!(self.log_level, LogLevel::Debug) {
            debug!("attribute definition: {payload}");
        }

        let resp = self
            .request(Method::POST, &url)
            .json(&payload)
            .send()
            .await
            .map_err(|err| DataverseError::from_transport(Stage::ColumnCreation, err))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DataverseError::Platform {
                stage: Stage::ColumnCreation,
                status,
                message: format!(
                    "column '{}': {}",
                    column.logical_name,
                    parse::error_message_from_body(&body, status)
                ),
            });
        }

        Ok(())
    }

    /// Delete a table by logical name.
    pub async fn delete_table(&self, logical_name: &str) -> Result<(), DataverseError> {
        self.connection.validate(Stage::TableDeletion)?;

        let url = format!(
            "{}/EntityDefinitions(LogicalName='{}')",
            self.connection.api_root(),
            quoted(logical_name)
        );
        self.log_request("DELETE", &url);

        let resp = self
            .request(Method::DELETE, &url)
            .send()
            .await
            .map_err(|err| DataverseError::from_transport(Stage::TableDeletion, err))?;

        if !resp.status().is_success() {
            return Err(Self::platform_error(Stage::TableDeletion, resp).await);
        }

        Ok(())
    }

    /// Delete one column from a table.
    pub async fn delete_column(
        &self,
        table_logical_name: &str,
        column_logical_name: &str,
    ) -> Result<(), DataverseError> {
        self.connection.validate(Stage::ColumnDeletion)?;

        let url = format!(
            "{}/EntityDefinitions(LogicalName='{}')/Attributes(LogicalName='{}')",
            self.connection.api_root(),
            quoted(table_logical_name),
            quoted(column_logical_name)
        );
        self.log_request("DELETE", &url);

        let resp = self
            .request(Method::DELETE, &url)
            .send()
            .await
            .map_err(|err| DataverseError::from_transport(Stage::ColumnDeletion, err))?;

        if !resp.status().is_success() {
            return Err(Self::platform_error(Stage::ColumnDeletion, resp).await);
        }

        Ok(())
    }

    /// List custom tables, projected to the four fields the admin surface
    /// needs. System tables are filtered out server-side.
    pub async fn get_tables(&self) -> Result<Vec<TableDefinition>, DataverseError> {
        self.connection.validate(Stage::TableListing)?;

        let url = format!(
            "{}/EntityDefinitions?$select=LogicalName,DisplayName,SchemaName,EntitySetName&$filter=IsCustomEntity eq true",
            self.connection.api_root()
        );
        self.log_request("GET", &url);

        let resp = self
            .request(Method::GET, &url)
            .send()
            .await
            .map_err(|err| DataverseError::from_transport(Stage::TableListing, err))?;

        if !resp.status().is_success() {
            return Err(Self::platform_error(Stage::TableListing, resp).await);
        }

        let parsed: ODataList<TableDefinition> =
            resp.json().await.map_err(|err| DataverseError::Decode {
                stage: Stage::TableListing,
                message: format!("failed to retrieve tables: {err}"),
            })?;

        Ok(parsed.value)
    }

    /// Retrieve one table's definition with its attributes expanded in the
    /// same response, avoiding a follow-up call per column.
    pub async fn get_table_schema(&self, logical_name: &str) -> Result<TableDetails, DataverseError> {
        self.connection.validate(Stage::SchemaRetrieval)?;

        let url = format!(
            "{}/EntityDefinitions(LogicalName='{}')?$expand=Attributes",
            self.connection.api_root(),
            quoted(logical_name)
        );
        self.log_request("GET", &url);

        let resp = self
            .request(Method::GET, &url)
            .send()
            .await
            .map_err(|err| DataverseError::from_transport(Stage::SchemaRetrieval, err))?;

        if !resp.status().is_success() {
            return Err(Self::platform_error(Stage::SchemaRetrieval, resp).await);
        }

        resp.json().await.map_err(|err| DataverseError::Decode {
            stage: Stage::SchemaRetrieval,
            message: format!("failed to parse table definition: {err}"),
        })
    }

    /// Create one record; the new id is parsed from the `OData-EntityId`
    /// response header when present.
    pub async fn create_record(
        &self,
        entity_set: &str,
        data: &RecordPayload,
    ) -> Result<Option<String>, DataverseError> {
        self.connection.validate(Stage::RecordCreation)?;

        let url = format!("{}/{}", self.connection.api_root(), entity_set);
        self.log_request("POST", &url);

        let resp = self
            .request(Method::POST, &url)
            .json(data)
            .send()
            .await
            .map_err(|err| DataverseError::from_transport(Stage::RecordCreation, err))?;

        if !resp.status().is_success() {
            return Err(Self::platform_error(Stage::RecordCreation, resp).await);
        }

        Ok(resp
            .headers()
            .get("OData-EntityId")
            .and_then(|value| value.to_str().ok())
            .and_then(parse::entity_id_from_header))
    }

    /// Update a record with partial (PATCH) semantics; unspecified fields
    /// are left untouched server-side.
    pub async fn update_record(
        &self,
        entity_set: &str,
        id: &str,
        data: &RecordPayload,
    ) -> Result<(), DataverseError> {
        self.connection.validate(Stage::RecordUpdate)?;

        let url = self.record_url(entity_set, id);
        self.log_request("PATCH", &url);

        let resp = self
            .request(Method::PATCH, &url)
            .json(data)
            .send()
            .await
            .map_err(|err| DataverseError::from_transport(Stage::RecordUpdate, err))?;

        if !resp.status().is_success() {
            return Err(Self::platform_error(Stage::RecordUpdate, resp).await);
        }

        Ok(())
    }

    /// Delete a record by id.
    pub async fn delete_record(&self, entity_set: &str, id: &str) -> Result<(), DataverseError> {
        self.connection.validate(Stage::RecordDeletion)?;

        let url = self.record_url(entity_set, id);
        self.log_request("DELETE", &url);

        let resp = self
            .request(Method::DELETE, &url)
            .send()
            .await
            .map_err(|err| DataverseError::from_transport(Stage::RecordDeletion, err))?;

        if !resp.status().is_success() {
            return Err(Self::platform_error(Stage::RecordDeletion, resp).await);
        }

        Ok(())
    }

    /// List records of an entity set, shaped by the optional query clauses.
    pub async fn get_records(
        &self,
        entity_set: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Value>, DataverseError> {
        self.connection.validate(Stage::RecordRetrieval)?;
        options.validate(Stage::RecordRetrieval)?;

        let url = format!(
            "{}/{}{}",
            self.connection.api_root(),
            entity_set,
            options.to_query_string()
        );
        self.log_request("GET", &url);

        let resp = self
            .request(Method::GET, &url)
            .send()
            .await
            .map_err(|err| DataverseError::from_transport(Stage::RecordRetrieval, err))?;

        if !resp.status().is_success() {
            return Err(Self::platform_error(Stage::RecordRetrieval, resp).await);
        }

        let parsed: ODataList<Value> = resp.json().await.map_err(|err| DataverseError::Decode {
            stage: Stage::RecordRetrieval,
            message: format!("failed to retrieve records: {err}"),
        })?;

        Ok(parsed.value)
    }

    fn record_url(&self, entity_set: &str, id: &str) -> String {
        let trimmed = id.trim_matches(|ch| ch == '{' || ch == '}');
        format!("{}/{}({})", self.connection.api_root(), entity_set, trimmed)
    }
}

/// Escape single quotes for use inside an OData key literal.
fn quoted(logical_name: &str) -> String {
    logical_name.replace('\'', "''")
}
