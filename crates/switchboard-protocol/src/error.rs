use thiserror::Error;

/// Errors raised while decoding inbound wire payloads.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The body (or an embedded JSON field) is not valid JSON for the expected shape.
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A field required to interpret the payload is absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The form body could not be interpreted.
    #[error("invalid form payload: {0}")]
    InvalidForm(String),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
