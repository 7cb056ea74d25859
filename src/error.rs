use thiserror::Error;

/// Errors reported by every stage of the topic model pipeline
#[derive(Error, Debug)]
pub enum TopicModelError {
    /// A precondition on the input was violated
    /// (empty corpus, zero-sum row, rank out of bounds, single document, ...)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A word is absent from the vocabulary
    #[error("not found: {0}")]
    NotFound(String),

    /// Reading a settings file failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot encoding / decoding failed
    #[error("snapshot codec error: {0}")]
    Snapshot(#[from] serde_cbor::Error),
}

impl TopicModelError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        TopicModelError::InvalidInput(msg.into())
    }

    pub(crate) fn not_found(word: &str) -> Self {
        TopicModelError::NotFound(format!("word `{}` is not in the vocabulary", word))
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, TopicModelError::InvalidInput(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TopicModelError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, TopicModelError>;
