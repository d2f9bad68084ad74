//! Error taxonomy for the report pipeline
//!
//! Every variant is terminal for a run: the coordinator never recovers
//! locally, it records where the error happened and stops.

use thiserror::Error;

/// Result alias used throughout the pipeline
pub type ReportResult<T> = std::result::Result<T, ReportError>;

#[derive(Debug, Error)]
pub enum ReportError {
    /// Timeout, connection failure or non-success status from Prism Central
    #[error("transport error calling {url}: {message}")]
    Transport { url: String, message: String },

    /// Interleaved name/value array could not be split into pairs
    #[error("malformed series for {attribute}: {reason}")]
    MalformedSeries { attribute: String, reason: String },

    /// Non-numeric content where a number was expected
    #[error("value {value:?} for {field} is not numeric")]
    ValueFormat { field: String, value: String },

    /// A metric series names a cluster that is not in the inventory
    #[error("cluster {name:?} not found in cluster inventory")]
    DirectoryLookup { name: String },

    /// A cluster present in one series is missing from another
    #[error("cluster {cluster:?} has no sample for {attribute}")]
    MissingSample { cluster: String, attribute: String },

    /// Zero or invalid denominator in a derived percentage
    #[error("cannot compute storage percentage for {address}: {reason}")]
    Arithmetic { address: String, reason: String },

    /// Per-cluster storage pool endpoint failed
    #[error("storage pool query against {address} failed: {message}")]
    StorageQuery { address: String, message: String },

    /// Response body did not have the documented shape
    #[error("unexpected response from {url}: {message}")]
    UnexpectedResponse { url: String, message: String },
}

impl ReportError {
    pub fn transport(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            url: url.into(),
            message: err.to_string(),
        }
    }

    pub fn storage_query(address: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::StorageQuery {
            address: address.into(),
            message: err.to_string(),
        }
    }

    pub fn malformed(attribute: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedSeries {
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }

    /// Short machine-friendly label, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            ReportError::Transport { .. } => "transport",
            ReportError::MalformedSeries { .. } => "malformed_series",
            ReportError::ValueFormat { .. } => "value_format",
            ReportError::DirectoryLookup { .. } => "directory_lookup",
            ReportError::MissingSample { .. } => "missing_sample",
            ReportError::Arithmetic { .. } => "arithmetic",
            ReportError::StorageQuery { .. } => "storage_query",
            ReportError::UnexpectedResponse { .. } => "unexpected_response",
        }
    }
}
