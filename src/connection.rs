use serde::{Deserialize, Serialize};

use crate::error::{DataverseError, Stage};

/// Identifies one target Dataverse environment.
///
/// Built once by configuration code and handed to the client by reference;
/// the client never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    base_url: String,
    api_version: String,
    /// User-facing name of the environment.
    pub display_name: String,
    /// Whether this is the currently selected environment.
    pub active: bool,
}

impl ConnectionDescriptor {
    /// Create a descriptor; any trailing slash on the base URL is trimmed.
    pub fn new(base_url: &str, api_version: &str, display_name: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
            display_name: display_name.to_string(),
            active: true,
        }
    }

    /// Environment base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Web API version, e.g. `"9.2"`.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Versioned Web API root, e.g. `https://org.crm.dynamics.com/api/data/v9.2`.
    pub fn api_root(&self) -> String {
        format!("{}/api/data/v{}", self.base_url, self.api_version)
    }

    /// Fail fast before any network call when the descriptor cannot produce
    /// a usable request URL.
    ///
    /// Configuration stores that lose their state tend to hand over an empty
    /// string or the literal `"undefined"`; both are rejected here with a
    /// message naming the fix.
    pub(crate) fn validate(&self, stage: Stage) -> Result<(), DataverseError> {
        if self.base_url.trim().is_empty() || self.base_url == "undefined" {
            return Err(DataverseError::Precondition {
                stage,
                message: "connection base URL is empty; select an environment before calling the Web API"
                    .to_string(),
            });
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(DataverseError::Precondition {
                stage,
                message: format!(
                    "connection base URL '{}' does not start with an HTTP scheme",
                    self.base_url
                ),
            });
        }

        Ok(())
    }
}
