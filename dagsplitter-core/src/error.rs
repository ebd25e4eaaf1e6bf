use thiserror::Error;

/// The error taxonomy of the splitting algorithm (see the error handling design).
///
/// The packer never fails; every variant here originates in the walker, the
/// oracle, or configuration validation that runs before traversal begins.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("failed to fetch block {cid}: {source}")]
    FetchFailure {
        cid: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("unsupported node kind: {0}")]
    UnsupportedKind(&'static str),

    #[error("unrecognized node kind")]
    UnrecognizedKind,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("traversal cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, SplitError>;
