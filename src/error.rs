use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// Client operation a failure belongs to.
///
/// Carried on every error so multi-step callers (table creation followed by a
/// column loop) can tell which stage failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Connectivity probe against the Web API root.
    ConnectionTest,
    /// POST of an entity definition.
    TableCreation,
    /// POST of an attribute definition.
    ColumnCreation,
    /// DELETE of an entity definition.
    TableDeletion,
    /// DELETE of an attribute definition.
    ColumnDeletion,
    /// Listing of custom entity definitions.
    TableListing,
    /// Retrieval of one table's expanded schema.
    SchemaRetrieval,
    /// POST of a record.
    RecordCreation,
    /// PATCH of a record.
    RecordUpdate,
    /// DELETE of a record.
    RecordDeletion,
    /// Listing of records in an entity set.
    RecordRetrieval,
    /// OAuth token request.
    TokenRequest,
}

impl Stage {
    /// Human-readable stage name used in error messages.
    pub fn describe(self) -> &'static str {
        match self {
            Stage::ConnectionTest => "connection test",
            Stage::TableCreation => "table creation",
            Stage::ColumnCreation => "column creation",
            Stage::TableDeletion => "table deletion",
            Stage::ColumnDeletion => "column deletion",
            Stage::TableListing => "table listing",
            Stage::SchemaRetrieval => "schema retrieval",
            Stage::RecordCreation => "record creation",
            Stage::RecordUpdate => "record update",
            Stage::RecordDeletion => "record deletion",
            Stage::RecordRetrieval => "record retrieval",
            Stage::TokenRequest => "token request",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Classification of a transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// The endpoint could not be reached at all (DNS, refused, TLS).
    Connect,
    /// The endpoint was reached but never answered.
    Timeout,
    /// The request failed for a reason the transport could not name.
    Unknown,
}

/// Error shape shared by every client operation.
///
/// Three tiers: preconditions rejected before any request is sent, transport
/// failures where no HTTP response exists, and platform errors where Dataverse
/// answered with a non-success status. `Decode` covers success responses whose
/// body did not match the expected shape.
#[derive(Debug, Error)]
pub enum DataverseError {
    /// Rejected before any network call.
    #[error("{stage} failed: {message}")]
    Precondition {
        /// Operation that was rejected.
        stage: Stage,
        /// What precondition was violated.
        message: String,
    },

    /// The HTTP exchange itself failed; no response status is available.
    #[error("{stage} failed: {message}")]
    Transport {
        /// Operation whose request failed.
        stage: Stage,
        /// Failure classification.
        kind: TransportKind,
        /// Likely cause plus the underlying transport message.
        message: String,
    },

    /// Dataverse answered with a non-success status.
    #[error("{stage} failed ({status}): {message}")]
    Platform {
        /// Operation the platform rejected.
        stage: Stage,
        /// HTTP status of the response.
        status: StatusCode,
        /// Message extracted from the OData error envelope, or the status
        /// line when the body was not parseable.
        message: String,
    },

    /// A success response whose body could not be decoded.
    #[error("{stage} failed: {message}")]
    Decode {
        /// Operation whose response was undecodable.
        stage: Stage,
        /// Decode failure description.
        message: String,
    },
}

impl DataverseError {
    /// The stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            DataverseError::Precondition { stage, .. }
            | DataverseError::Transport { stage, .. }
            | DataverseError::Platform { stage, .. }
            | DataverseError::Decode { stage, .. } => *stage,
        }
    }

    /// Classify a fetch-layer failure into the transport tier.
    ///
    /// Connection-level failures get a message naming the likely cause
    /// (wrong environment URL, DNS, proxy) so callers can show actionable
    /// guidance instead of a bare transport string.
    pub(crate) fn from_transport(stage: Stage, err: reqwest::Error) -> Self {
        let (kind, hint) = if err.is_connect() {
            (
                TransportKind::Connect,
                "could not reach the Dataverse endpoint; check the environment URL, DNS, and any proxy or firewall in the path",
            )
        } else if err.is_timeout() {
            (
                TransportKind::Timeout,
                "the Dataverse endpoint did not answer in time",
            )
        } else {
            (
                TransportKind::Unknown,
                "the request failed before a response was received",
            )
        };

        DataverseError::Transport {
            stage,
            kind,
            message: format!("{hint}: {err}"),
        }
    }
}
