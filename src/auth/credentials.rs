use std::collections::HashMap;

use reqwest::Client;
use serde_json::Value;

use crate::error::{DataverseError, Stage};

/// Azure AD application credentials for the client-credentials grant.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    /// Application (client) id.
    pub client_id: String,
    /// Application client secret.
    pub client_secret: String,
    /// Azure AD tenant id.
    pub tenant_id: String,
    /// Web API scope, e.g. `https://org.crm.dynamics.com/.default`.
    pub scope: String,
}

/// Fetch a bearer token for the Web API using the client-credentials grant.
///
/// One-shot: no caching and no refresh. Callers that need a fresh token
/// simply call again.
pub async fn fetch_access_token(credentials: &ClientCredentials) -> Result<String, DataverseError> {
    let client = Client::new();
    let token_url = format!(
        "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
        credentials.tenant_id
    );

    let mut params = HashMap::new();
    params.insert("client_id", credentials.client_id.as_str());
    params.insert("client_secret", credentials.client_secret.as_str());
    params.insert("scope", credentials.scope.as_str());
    params.insert("grant_type", "client_credentials");

    let resp = client
        .post(&token_url)
        .form(&params)
        .send()
        .await
        .map_err(|err| DataverseError::from_transport(Stage::TokenRequest, err))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(DataverseError::Platform {
            stage: Stage::TokenRequest,
            status,
            message: token_error_message(&body, status),
        });
    }

    let json: Value = resp.json().await.map_err(|err| DataverseError::Decode {
        stage: Stage::TokenRequest,
        message: format!("token response was not valid JSON: {err}"),
    })?;

    let access_token = json
        .get("access_token")
        .and_then(Value::as_str)
        .ok_or_else(|| DataverseError::Decode {
            stage: Stage::TokenRequest,
            message: "token response had no access_token".to_string(),
        })?;

    if access_token.trim().is_empty() {
        return Err(DataverseError::Decode {
            stage: Stage::TokenRequest,
            message: "token response carried an empty access_token".to_string(),
        });
    }

    Ok(access_token.to_string())
}

/// The identity endpoint uses an `error_description` envelope rather than
/// the Web API's OData error shape.
fn token_error_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error_description")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| status.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_error_prefers_the_error_description() {
        let body = r#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret."}"#;
        assert_eq!(
            token_error_message(body, reqwest::StatusCode::UNAUTHORIZED),
            "AADSTS7000215: Invalid client secret."
        );
    }

    #[test]
    fn token_error_falls_back_to_the_status_line() {
        assert_eq!(
            token_error_message("not json", reqwest::StatusCode::UNAUTHORIZED),
            "401 Unauthorized"
        );
    }
}
