use thiserror::Error;

/// A convenience `Result` alias using [`RagError`].
pub type RagResult<T> = Result<T, RagError>;

/// Top-level error type for Ragchat.
///
/// Validation variants are raised before any side effect. Upstream variants
/// abort the current pipeline invocation without committing anything.
#[derive(Error, Debug)]
pub enum RagError {
    /// A splitter, retrieval, or loader setting is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A vector's length differs from the dimensionality locked by the index.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality established by the first inserted record.
        expected: usize,
        /// Length of the offending vector.
        actual: usize,
    },

    /// A query was issued against an index holding zero records.
    #[error("Vector index is empty")]
    EmptyIndex,

    /// The session identifier is not usable (e.g. empty).
    #[error("Invalid session id: {0:?}")]
    InvalidSession(String),

    /// The caller supplied an unusable argument.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A document source could not be read.
    #[error("Failed to load source '{source_id}': {reason}")]
    SourceLoadFailure {
        /// Path or URL of the source.
        source_id: String,
        /// What went wrong.
        reason: String,
    },

    /// The embedding service failed.
    #[error("Embedding service failed: {0}")]
    UpstreamEmbeddingFailure(String),

    /// The generation service failed.
    #[error("Generation service failed: {0}")]
    UpstreamGenerationFailure(String),

    /// The caller cancelled the invocation while it was in the named stage.
    #[error("Cancelled during {stage}")]
    Cancelled {
        /// Pipeline stage that was pending when cancellation was observed.
        stage: String,
    },

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RagError {
    /// Whether the error came from an external collaborator rather than local validation.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            RagError::UpstreamEmbeddingFailure(_)
                | RagError::UpstreamGenerationFailure(_)
                | RagError::SourceLoadFailure { .. }
        )
    }

    /// Re-tag a failure raised inside an embedding call.
    ///
    /// Cancellation and errors that are already embedding failures pass
    /// through; anything else becomes [`RagError::UpstreamEmbeddingFailure`].
    pub fn into_embedding_failure(self) -> Self {
        match self {
            e @ (RagError::UpstreamEmbeddingFailure(_) | RagError::Cancelled { .. }) => e,
            other => RagError::UpstreamEmbeddingFailure(other.to_string()),
        }
    }

    /// Re-tag a failure raised inside a generation call.
    pub fn into_generation_failure(self) -> Self {
        match self {
            e @ (RagError::UpstreamGenerationFailure(_) | RagError::Cancelled { .. }) => e,
            other => RagError::UpstreamGenerationFailure(other.to_string()),
        }
    }

    /// Shorthand for a [`RagError::SourceLoadFailure`].
    pub fn source_load(source_id: impl Into<String>, reason: impl ToString) -> Self {
        RagError::SourceLoadFailure {
            source_id: source_id.into(),
            reason: reason.to_string(),
        }
    }
}
