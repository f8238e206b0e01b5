//! Error types for essay grading
//!
//! Provides the error taxonomy surfaced by the orchestration components:
//! - missing templates, questions, answers and participants
//! - transient store failures and lock timeouts (retryable)
//! - validation failures (caller must correct the request)
//!
//! The scoring algorithms never fail; only orchestration returns these.

use crate::types::{AnswerId, ExamId, ParticipantId, QuestionId};

/// Main grading error type
#[derive(Debug, thiserror::Error)]
pub enum GradingError {
    /// No template authored for the question
    #[error("no answer template for question {question_id} of exam {exam_id}")]
    TemplateNotFound {
        /// Exam
        exam_id: ExamId,
        /// Question
        question_id: QuestionId,
    },

    /// Question does not exist
    #[error("question not found: {0}")]
    QuestionNotFound(QuestionId),

    /// Answer does not exist
    #[error("answer not found: {0}")]
    AnswerNotFound(AnswerId),

    /// Participant does not exist
    #[error("participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    /// Persistence failed or timed out
    #[error("store error: {0}")]
    TransientStore(#[from] StoreError),

    /// Keyed lock not acquired before the deadline
    #[error("timed out after {waited_ms}ms waiting for lock on {resource}")]
    LockTimeout {
        /// Locked resource
        resource: String,
        /// Time waited
        waited_ms: u64,
    },

    /// Request rejected
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl GradingError {
    /// Check if error is retryable
    ///
    /// Grading and review are idempotent given identical inputs, so store
    /// failures and lock timeouts can be retried blindly.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientStore(_) | Self::LockTimeout { .. })
    }

    /// Taxonomy bucket
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TemplateNotFound { .. } => ErrorKind::TemplateNotFound,
            Self::QuestionNotFound(_) => ErrorKind::QuestionNotFound,
            Self::AnswerNotFound(_) => ErrorKind::AnswerNotFound,
            Self::ParticipantNotFound(_) => ErrorKind::ParticipantNotFound,
            Self::TransientStore(_) | Self::LockTimeout { .. } => ErrorKind::TransientStoreError,
            Self::Validation(_) => ErrorKind::ValidationError,
        }
    }
}

/// Error taxonomy exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Author the template, then retry
    TemplateNotFound,
    /// Referenced question missing
    QuestionNotFound,
    /// Referenced answer missing
    AnswerNotFound,
    /// Referenced participant missing
    ParticipantNotFound,
    /// Timeout or contention; safe to retry
    TransientStoreError,
    /// Malformed request
    ValidationError,
}

/// Store-level failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Backend unreachable or failing
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Call exceeded its deadline
    #[error("store call timed out after {waited_ms}ms")]
    Timeout {
        /// Time waited
        waited_ms: u64,
    },

    /// Write rejected (missing row, concurrent modification)
    #[error("store conflict: {0}")]
    Conflict(String),
}

/// Request validation failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Review score outside `[0, max_points]`
    #[error("score {score} outside [0, {max_points}]")]
    ScoreOutOfRange {
        /// Submitted score
        score: i64,
        /// Points available
        max_points: u32,
    },

    /// Threshold outside `[0, 100]`
    #[error("minimum match percentage {0} outside [0, 100]")]
    ThresholdOutOfRange(f64),

    /// Nonzero threshold without keywords
    #[error("a minimum match percentage of {threshold} requires at least one keyword")]
    KeywordsRequired {
        /// Requested threshold
        threshold: f64,
    },

    /// Operation not applicable to this question kind
    #[error("question {question_id} is {actual}, expected {expected}")]
    WrongQuestionKind {
        /// Question
        question_id: QuestionId,
        /// Required kind
        expected: &'static str,
        /// Actual kind
        actual: &'static str,
    },

    /// Entity belongs to another exam
    #[error("expected exam {expected}, found exam {actual}")]
    ExamMismatch {
        /// Exam of the request
        expected: ExamId,
        /// Exam of the entity
        actual: ExamId,
    },

    /// Answer already graded; resubmission is closed
    #[error("answer {0} is already graded")]
    AlreadyGraded(AnswerId),

    /// Reviewed answer given new text; the reviewed text is kept
    #[error("answer {0} has been reviewed; its text can no longer change")]
    AlreadyReviewed(AnswerId),

    /// Question options rejected
    #[error("invalid question: {0}")]
    InvalidQuestion(String),

    /// Scoring configuration rejected
    #[error("invalid scoring configuration: {0}")]
    InvalidScoring(String),

    /// Policy name not registered
    #[error("unknown scoring policy: {0}")]
    UnknownPolicy(String),
}

impl From<exam_scoring::CombinerError> for ValidationError {
    fn from(err: exam_scoring::CombinerError) -> Self {
        Self::InvalidScoring(err.to_string())
    }
}

/// Configuration loading failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML could not be parsed
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML could not be produced
    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Values out of range
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}
