use thiserror::Error;

/// Errors raised by the dedup backend.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The dedup backend could not answer. Callers fail open.
    #[error("dedup store unavailable: {0}")]
    StoreUnavailable(String),
}

/// A well-formed payload that cannot become an [`Activity`](switchboard_core::Activity).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// Neither the payload nor its envelope names a channel or a team.
    #[error("no conversation could be resolved for {kind}")]
    NoConversation { kind: String },

    /// The payload kind is recognised on the wire but has no activity mapping.
    #[error("unsupported payload kind: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;
