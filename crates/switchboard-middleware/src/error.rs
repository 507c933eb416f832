use switchboard_channels::ChannelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// An outbound call failed. Already logged with turn context by the sink.
    #[error("delivery failed: {0}")]
    Delivery(#[from] ChannelError),

    /// A stage rejected the turn.
    #[error("stage {stage} failed: {reason}")]
    Stage { stage: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
