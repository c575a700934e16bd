use reqwest::StatusCode;
use serde_json::Value;
use uuid::Uuid;

/// Extract the created record id from an `OData-EntityId` header value.
///
/// The header carries the canonical record URL, e.g.
/// `https://org.crm.dynamics.com/api/data/v9.2/cr123_projects(<guid>)`; the
/// id is the trailing parenthesized segment. Returns `None` when the value
/// has no such segment or the segment is not a well-formed id.
pub(crate) fn entity_id_from_header(value: &str) -> Option<String> {
    let start = value.rfind('(')? + 1;
    let end = value.rfind(')')?;
    if end <= start {
        return None;
    }

    let id = &value[start..end];
    Uuid::parse_str(id).ok()?;
    Some(id.to_string())
}

/// Best-effort extraction of a human-readable message from an OData error
/// body, falling back to the HTTP status line when the body does not parse
/// as the expected envelope.
pub(crate) fn error_message_from_body(body: &str, status: StatusCode) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|json| {
        let error = json.get("error")?;
        error
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| error.get("message")?.get("value")?.as_str())
            .map(str::to_string)
    });

    message.unwrap_or_else(|| status.to_string())
}
