use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A vector's length disagrees with the configured index dimension.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The embedder, vector index or document store failed.
    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a collaborator failure, keeping the source's message.
    pub fn upstream(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Upstream(format!("{context}: {err}"))
    }

    /// True for errors that come from misconfiguration rather than a single request.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::InvalidConfig(_) | Self::DimensionMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
