#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("task queue is empty")]
    QueueEmptyError,
    #[error("error processing task: {message}")]
    ProcessError { message: String },
}

/// Reasons a companion command is refused.
#[derive(Debug, thiserror::Error)]
pub enum CompanionError {
    #[error("unknown blueprint: {0}")]
    UnknownBlueprint(String),
    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}
