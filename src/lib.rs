/// Authentication helpers for the Microsoft identity platform.
pub mod auth;
/// Target-environment connection descriptors.
pub mod connection;
/// Dataverse-specific types and the admin client.
pub mod dataverse;
/// Error taxonomy shared by every client operation.
pub mod error;

/// Logging verbosity for client operations.
#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Emit request URLs and metadata payloads at debug level.
    Debug,
    /// Emit standard informational output.
    Information,
}

impl Default for LogLevel {
    /// Defaults to `Information` logging.
    fn default() -> Self {
        LogLevel::Information
    }
}
