use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwitchboardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid conversation id: {0}")]
    InvalidConversation(String),
}

impl SwitchboardError {
    /// Short, stable error code for logs and metrics labels.
    pub fn code(&self) -> &'static str {
        match self {
            SwitchboardError::Config(_) => "CONFIG_ERROR",
            SwitchboardError::InvalidConversation(_) => "INVALID_CONVERSATION",
        }
    }
}

pub type Result<T> = std::result::Result<T, SwitchboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(SwitchboardError::Config("x".into()).code(), "CONFIG_ERROR");
        assert_eq!(
            SwitchboardError::InvalidConversation("".into()).code(),
            "INVALID_CONVERSATION"
        );
    }
}
