use thiserror::Error;

/// Transport-level failure: the request never produced an HTTP reply.
#[derive(Debug, Clone, Error)]
#[error("transport failure: {0}")]
pub struct TransportError(pub String);

#[derive(Debug, Error)]
pub enum PositionError {
    #[error("API credential not configured")]
    MissingCredential,
    #[error("observer location is missing coordinates")]
    IncompleteLocation,
    #[error("invalid API credential")]
    InvalidCredential,
    #[error("authentication rejected by position service")]
    AuthFailed,
    #[error("API rate limit exceeded")]
    RateLimited,
    #[error("position service error: {0}")]
    Upstream(String),
    #[error("position request rejected: {0}")]
    Api(String),
    #[error("no position data for this satellite")]
    NoData,
    #[error("malformed response from position service: {0}")]
    Malformed(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
