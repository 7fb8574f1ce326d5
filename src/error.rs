// src/error.rs
use thiserror::Error;

/// Failure modes of a single upstream fetch call.
///
/// `Saturated` is not a fault: providers cap how many results a key or plan
/// may page through, and hitting that cap is the expected end of a lineage.
/// Every other variant fails the job invocation and is subject to the queue
/// retry policy.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream reported no more results available for this key/plan")]
    Saturated,

    #[error("upstream rejected the request: {0}")]
    Upstream(String),

    #[error("transport failure talking to upstream")]
    Transport(#[from] reqwest::Error),

    #[error("could not decode upstream payload")]
    Decode(#[from] serde_json::Error),

    #[error("upstream returned a malformed record")]
    Malformed(#[from] ValidationError),
}

impl FetchError {
    pub fn is_saturated(&self) -> bool {
        matches!(self, FetchError::Saturated)
    }
}

/// Raised when a normalized article is constructed without a required field.
/// Fetchers surface this as [`FetchError::Malformed`] instead of letting the
/// record enter a batch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}
