use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use dataverse_admin_client::LogLevel;
use dataverse_admin_client::connection::ConnectionDescriptor;
use dataverse_admin_client::dataverse::adminclient::{AdminClient, ConnectionStatus, RecordPayload};
use dataverse_admin_client::dataverse::query::QueryOptions;
use dataverse_admin_client::dataverse::schema::{ColumnSchema, ColumnType, TableSchema};
use dataverse_admin_client::error::{DataverseError, Stage};

const TABLE_ID: &str = "12345678-90ab-cdef-1234-567890abcdef";

/// Request line and body as seen by the stub server.
struct ReceivedRequest {
    method: String,
    target: String,
    body: String,
}

fn canned(status_line: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut response = format!("HTTP/1.1 {status_line}\r\n");
    for (name, value) in headers {
        response.push_str(&format!("{name}: {value}\r\n"));
    }
    response.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    ));
    response
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

async fn read_request(socket: &mut TcpStream) -> ReceivedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let n = socket.read(&mut chunk).await.expect("read request");
        assert!(n > 0, "connection closed before a full request arrived");
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end_of_headers) = find_subslice(&buf, b"\r\n\r\n") {
            let header_text = String::from_utf8_lossy(&buf[..end_of_headers]).to_string();
            let content_length = header_text
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if name.eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);

            let mut body = buf[end_of_headers + 4..].to_vec();
            while body.len() < content_length {
                let n = socket.read(&mut chunk).await.expect("read body");
                assert!(n > 0, "connection closed mid-body");
                body.extend_from_slice(&chunk[..n]);
            }

            let request_line = header_text.lines().next().unwrap_or_default();
            let mut parts = request_line.split_whitespace();
            return ReceivedRequest {
                method: parts.next().unwrap_or_default().to_string(),
                target: parts.next().unwrap_or_default().to_string(),
                body: String::from_utf8_lossy(&body).to_string(),
            };
        }
    }
}

/// Serve one scripted response per incoming request, recording what was
/// received. Responses carry `Connection: close` so the client reconnects
/// for every request instead of pooling.
async fn serve_script(listener: TcpListener, responses: Vec<String>) -> Vec<ReceivedRequest> {
    let mut seen = Vec::new();
    for response in responses {
        let (mut socket, _) = listener.accept().await.expect("accept");
        seen.push(read_request(&mut socket).await);
        socket
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        socket.shutdown().await.ok();
    }
    seen
}

async fn start_stub(responses: Vec<String>) -> (SocketAddr, JoinHandle<Vec<ReceivedRequest>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub address");
    (addr, tokio::spawn(serve_script(listener, responses)))
}

fn client_for(addr: SocketAddr) -> AdminClient {
    AdminClient::new(
        ConnectionDescriptor::new(&format!("http://{addr}"), "9.2", "stub"),
        "test-token",
        LogLevel::Information,
    )
}

fn project_schema(columns: Vec<ColumnSchema>) -> TableSchema {
    TableSchema {
        logical_name: "cr123_project".to_string(),
        display_name: "Project".to_string(),
        plural_name: "Projects".to_string(),
        description: Some("Tracked projects".to_string()),
        columns,
    }
}

fn column(logical_name: &str, column_type: ColumnType) -> ColumnSchema {
    ColumnSchema {
        logical_name: logical_name.to_string(),
        display_name: logical_name.to_string(),
        required: false,
        column_type,
    }
}

#[tokio::test]
async fn test_connection_succeeds_on_a_2xx_root_response() {
    let (addr, server) = start_stub(vec![canned("200 OK", &[], "{}")]).await;

    let status = client_for(addr).test_connection().await;
    assert!(status.is_ok());

    let seen = server.await.expect("stub finished");
    assert_eq!(seen[0].method, "GET");
    assert_eq!(seen[0].target, "/api/data/v9.2");
}

#[tokio::test]
async fn test_connection_reports_platform_failures_without_panicking() {
    let (addr, server) = start_stub(vec![canned(
        "403 Forbidden",
        &[],
        r#"{"error":{"message":"Caller has no roles"}}"#,
    )])
    .await;

    match client_for(addr).test_connection().await {
        ConnectionStatus::Failed {
            error,
            details,
        } => {
            assert!(error.contains("403"), "unexpected error: {error}");
            assert!(details.is_some());
        }
        other => panic!("expected a failed status, got {other:?}"),
    }

    server.await.expect("stub finished");
}

#[tokio::test]
async fn test_connection_reports_transport_failures_without_panicking() {
    // Bind and immediately drop the listener so the port refuses connections.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let status = client_for(addr).test_connection().await;
    match status {
        ConnectionStatus::Failed {
            error, ..
        } => assert!(!error.is_empty()),
        other => panic!("expected a failed status, got {other:?}"),
    }
}

#[tokio::test]
async fn create_table_returns_the_id_and_creates_columns_in_order() {
    let entity_id = format!("http://stub/api/data/v9.2/EntityDefinitions({TABLE_ID})");
    let (addr, server) = start_stub(vec![
        canned("204 No Content", &[("OData-EntityId", &entity_id)], ""),
        canned("204 No Content", &[], ""),
        canned("204 No Content", &[], ""),
    ])
    .await;

    let schema = project_schema(vec![
        column("cr123_budget", ColumnType::Currency),
        column("cr123_due", ColumnType::Date),
    ]);
    let id = client_for(addr)
        .create_table(&schema)
        .await
        .expect("create_table");
    assert_eq!(id.as_deref(), Some(TABLE_ID));

    let seen = server.await.expect("stub finished");
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].target, "/api/data/v9.2/EntityDefinitions");
    assert!(seen[0].body.contains("Microsoft.Dynamics.CRM.EntityMetadata"));
    assert!(
        seen[1]
            .target
            .ends_with("EntityDefinitions(LogicalName='cr123_project')/Attributes")
    );
    assert!(seen[1].body.contains("cr123_budget"));
    assert!(seen[2].body.contains("cr123_due"));
}

#[tokio::test]
async fn create_table_without_an_entity_id_header_still_succeeds() {
    let (addr, server) = start_stub(vec![canned("204 No Content", &[], "")]).await;

    let id = client_for(addr)
        .create_table(&project_schema(vec![]))
        .await
        .expect("create_table");
    assert_eq!(id, None);

    server.await.expect("stub finished");
}

#[tokio::test]
async fn create_table_surfaces_the_failing_column_and_keeps_earlier_ones() {
    let entity_id = format!("http://stub/api/data/v9.2/EntityDefinitions({TABLE_ID})");
    let (addr, server) = start_stub(vec![
        canned("204 No Content", &[("OData-EntityId", &entity_id)], ""),
        canned("204 No Content", &[], ""),
        canned(
            "400 Bad Request",
            &[],
            r#"{"error":{"message":"Attribute name is reserved"}}"#,
        ),
    ])
    .await;

    let schema = project_schema(vec![
        column("cr123_first", ColumnType::Number),
        column("cr123_second", ColumnType::Boolean),
        column("cr123_third", ColumnType::Number),
    ]);
    let err = client_for(addr)
        .create_table(&schema)
        .await
        .expect_err("second column should fail");

    assert_eq!(err.stage(), Stage::ColumnCreation);
    let message = err.to_string();
    assert!(message.contains("column creation"), "message: {message}");
    assert!(message.contains("cr123_second"), "message: {message}");
    assert!(
        message.contains("Attribute name is reserved"),
        "message: {message}"
    );

    // Table plus exactly two column attempts: the first succeeded and the
    // second failed before the third was ever sent.
    let seen = server.await.expect("stub finished");
    assert_eq!(seen.len(), 3);
}

#[tokio::test]
async fn create_table_with_an_empty_base_url_fails_before_any_request() {
    let client = AdminClient::new(
        ConnectionDescriptor::new("", "9.2", "broken"),
        "test-token",
        LogLevel::Information,
    );

    let err = client
        .create_table(&project_schema(vec![]))
        .await
        .expect_err("precondition should fail");
    assert!(matches!(
        err,
        DataverseError::Precondition {
            stage: Stage::TableCreation,
            ..
        }
    ));
}

#[tokio::test]
async fn get_tables_requests_custom_tables_only() {
    let body = r#"{"value":[{"LogicalName":"cr123_project","SchemaName":"cr123_Project","DisplayName":null,"EntitySetName":"cr123_projects"}]}"#;
    let (addr, server) = start_stub(vec![canned("200 OK", &[], body)]).await;

    let tables = client_for(addr).get_tables().await.expect("get_tables");
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].logical_name, "cr123_project");
    assert_eq!(tables[0].entity_set_name, "cr123_projects");

    let seen = server.await.expect("stub finished");
    assert!(seen[0].target.contains("$select=LogicalName,DisplayName,SchemaName,EntitySetName"));
    assert!(seen[0].target.contains("$filter=IsCustomEntity%20eq%20true"));
}

#[tokio::test]
async fn get_table_schema_expands_attributes_in_one_round_trip() {
    let body = r#"{
        "LogicalName": "cr123_project",
        "SchemaName": "cr123_Project",
        "DisplayName": null,
        "EntitySetName": "cr123_projects",
        "PrimaryIdAttribute": "cr123_projectid",
        "Attributes": [
            {"LogicalName": "cr123_name", "AttributeType": "String", "MaxLength": 100},
            {"LogicalName": "cr123_client", "AttributeType": "Lookup", "Targets": ["cr123_client"]}
        ]
    }"#;
    let (addr, server) = start_stub(vec![canned("200 OK", &[], body)]).await;

    let details = client_for(addr)
        .get_table_schema("cr123_project")
        .await
        .expect("get_table_schema");
    assert_eq!(details.attributes.len(), 2);
    assert_eq!(details.attributes[0].max_length, Some(100));
    assert_eq!(
        details.attributes[1].targets.as_deref(),
        Some(&["cr123_client".to_string()][..])
    );

    let seen = server.await.expect("stub finished");
    assert_eq!(
        seen[0].target,
        "/api/data/v9.2/EntityDefinitions(LogicalName='cr123_project')?$expand=Attributes"
    );
}

#[tokio::test]
async fn get_records_without_options_sends_no_query_string() {
    let (addr, server) = start_stub(vec![canned("200 OK", &[], r#"{"value":[]}"#)]).await;

    let records = client_for(addr)
        .get_records("cr123_projects", &QueryOptions::default())
        .await
        .expect("get_records");
    assert!(records.is_empty());

    let seen = server.await.expect("stub finished");
    assert_eq!(seen[0].target, "/api/data/v9.2/cr123_projects");
}

#[tokio::test]
async fn get_records_composes_top_and_order_by() {
    let (addr, server) = start_stub(vec![canned(
        "200 OK",
        &[],
        r#"{"value":[{"cr123_name":"Alpha"}]}"#,
    )])
    .await;

    let options = QueryOptions {
        top: Some(10),
        order_by: Some("createdon desc".to_string()),
        ..QueryOptions::default()
    };
    let records = client_for(addr)
        .get_records("cr123_projects", &options)
        .await
        .expect("get_records");
    assert_eq!(records[0]["cr123_name"], "Alpha");

    let seen = server.await.expect("stub finished");
    assert!(seen[0].target.contains("$top=10"));
    assert!(seen[0].target.contains("$orderby=createdon%20desc"));
}

#[tokio::test]
async fn create_record_returns_the_id_from_the_response_header() {
    let entity_id = format!("http://stub/api/data/v9.2/cr123_projects({TABLE_ID})");
    let (addr, server) = start_stub(vec![canned(
        "204 No Content",
        &[("OData-EntityId", &entity_id)],
        "",
    )])
    .await;

    let mut data = RecordPayload::new();
    data.insert("cr123_name".to_string(), serde_json::json!("Alpha"));
    let id = client_for(addr)
        .create_record("cr123_projects", &data)
        .await
        .expect("create_record");
    assert_eq!(id.as_deref(), Some(TABLE_ID));

    let seen = server.await.expect("stub finished");
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].target, "/api/data/v9.2/cr123_projects");
    assert!(seen[0].body.contains("Alpha"));
}

#[tokio::test]
async fn update_record_patches_the_braced_id() {
    let (addr, server) = start_stub(vec![canned("204 No Content", &[], "")]).await;

    let mut data = RecordPayload::new();
    data.insert("cr123_name".to_string(), serde_json::json!("Beta"));
    client_for(addr)
        .update_record("cr123_projects", &format!("{{{TABLE_ID}}}"), &data)
        .await
        .expect("update_record");

    let seen = server.await.expect("stub finished");
    assert_eq!(seen[0].method, "PATCH");
    assert_eq!(
        seen[0].target,
        format!("/api/data/v9.2/cr123_projects({TABLE_ID})")
    );
}

#[tokio::test]
async fn delete_record_surfaces_the_platform_message() {
    let (addr, server) = start_stub(vec![canned(
        "404 Not Found",
        &[],
        r#"{"error":{"message":"cr123_project With Id Does Not Exist"}}"#,
    )])
    .await;

    let err = client_for(addr)
        .delete_record("cr123_projects", TABLE_ID)
        .await
        .expect_err("delete should fail");
    assert_eq!(err.stage(), Stage::RecordDeletion);
    let message = err.to_string();
    assert!(message.contains("record deletion"), "message: {message}");
    assert!(message.contains("Does Not Exist"), "message: {message}");

    server.await.expect("stub finished");
}

#[tokio::test]
async fn delete_column_targets_the_attribute_sub_collection() {
    let (addr, server) = start_stub(vec![canned("204 No Content", &[], "")]).await;

    client_for(addr)
        .delete_column("cr123_project", "cr123_budget")
        .await
        .expect("delete_column");

    let seen = server.await.expect("stub finished");
    assert_eq!(seen[0].method, "DELETE");
    assert_eq!(
        seen[0].target,
        "/api/data/v9.2/EntityDefinitions(LogicalName='cr123_project')/Attributes(LogicalName='cr123_budget')"
    );
}
