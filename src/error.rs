use thiserror::Error;

/// Convenience result type for ingestion and egress operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Convenience result type for building and applying transformations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Convenience result type for conversation ports and chat backends.
pub type ConversationResult<T> = Result<T, ConversationError>;

/// Convenience result type for a query-building pass.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error type returned by ingestion and egress functions.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader/writer error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The input has no header row.
    #[error("missing header row")]
    MissingHeader,

    /// The configured delimiter cannot be used.
    #[error("invalid delimiter {delimiter:?}: {message}")]
    InvalidDelimiter { delimiter: String, message: String },

    /// The source format could not be determined from the path.
    #[error("unsupported source: {message}")]
    UnsupportedSource { message: String },
}

/// Errors raised while building or applying a transformation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// Name (or catalog index) does not match any catalog entry.
    #[error("transformation \"{0}\" not supported")]
    UnknownTransformation(String),

    /// Fewer arguments than the transformation's steps.
    #[error("not enough arguments for {transformation} transformation: expected {expected}, got {actual}")]
    InsufficientArguments {
        transformation: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A referenced column is not present in the dataset.
    #[error("field \"{0}\" not found")]
    ColumnNotFound(String),

    /// Relation that cannot be evaluated (e.g. `InRange`) or is not a relation at all.
    #[error("relation \"{0}\" not implemented")]
    UnsupportedRelation(String),

    /// Aggregation outside the implemented set.
    #[error("aggregation \"{0}\" not supported")]
    UnsupportedAggregation(String),

    /// Argument index outside the transformation's fixed vocabulary.
    #[error("argument index {index} out of range for {transformation} (0..{len})")]
    ArgumentOutOfRange {
        transformation: &'static str,
        index: usize,
        len: usize,
    },

    /// Argument word not recognized by the transformation.
    #[error("argument \"{argument}\" unrecognized for {transformation}")]
    InvalidArgument {
        transformation: &'static str,
        argument: String,
    },
}

impl TransformError {
    /// Whether a query pass can report this error and retry the round.
    ///
    /// Unsupported relations/aggregations abort the pass instead.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            TransformError::UnsupportedRelation(_) | TransformError::UnsupportedAggregation(_)
        )
    }
}

/// A responder's answer that cannot be used for the current round.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidAnswer {
    #[error("Invalid input: Empty message received!")]
    Empty,

    #[error("Invalid input: Non-integer message received! ({0:?})")]
    NotAnInteger(String),

    #[error("Invalid input: Message out of range received! ({index} not in 0..{len})")]
    OutOfRange { index: i64, len: usize },
}

/// Errors raised by a conversation port or its backend.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend answered, but not with anything usable.
    #[error("backend error: {0}")]
    Backend(String),

    /// No pending question was stored before asking for a live answer.
    #[error("no pending question")]
    NoPendingQuestion,

    /// The responder has nothing more to say (closed input, exhausted script).
    #[error("responder closed")]
    Closed,
}

/// Pass-level failures of the query builder.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Unrecoverable transformation failure (unsupported relation/aggregation).
    #[error("transformation failed: {0}")]
    Transform(#[from] TransformError),

    /// A round kept receiving invalid answers.
    #[error("pass aborted: round {round} received {attempts} invalid answers (last: {last})")]
    PassAborted {
        round: usize,
        attempts: usize,
        last: String,
    },

    #[error("conversation failed: {0}")]
    Conversation(#[from] ConversationError),

    #[error("ingestion failed: {0}")]
    Ingestion(#[from] IngestionError),

    /// The session has no dataset loaded.
    #[error("input fields are not loaded")]
    NoDataset,

    #[error("session {0} not found")]
    SessionNotFound(uuid::Uuid),
}
