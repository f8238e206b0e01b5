//! Persistence interface
//!
//! Grading consumes storage through [`GradingStore`]; the engine behind it is
//! not this crate's concern. Three logical tables: answer templates, answers
//! (with their analysis records) and participants, plus a question lookup.
//!
//! Every call made by the grading components is bounded by the configured
//! store timeout; an expired call surfaces as [`StoreError::Timeout`].

mod memory;

pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::types::{
    AnalysisDraft, AnalysisRecord, Answer, AnswerId, AnswerSlot, AnswerTemplate, ExamId,
    NewAnswer, Participant, ParticipantId, Question, QuestionId, UserId,
};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Storage backend for grading
#[async_trait]
pub trait GradingStore: Send + Sync + std::fmt::Debug {
    /// Look up a question
    async fn question(&self, id: QuestionId) -> Result<Option<Question>, StoreError>;

    /// Insert or replace a question
    async fn put_question(&self, question: Question) -> Result<(), StoreError>;

    /// Look up the template of a question
    async fn template(
        &self,
        exam_id: ExamId,
        question_id: QuestionId,
    ) -> Result<Option<AnswerTemplate>, StoreError>;

    /// Create or update the template of a question, keeping its ID on update
    async fn upsert_template(
        &self,
        exam_id: ExamId,
        question_id: QuestionId,
        content: String,
        keywords: Vec<String>,
        minimum_match_percentage: f64,
    ) -> Result<AnswerTemplate, StoreError>;

    /// Look up an answer
    async fn answer(&self, id: AnswerId) -> Result<Option<Answer>, StoreError>;

    /// Look up the answer occupying a slot
    async fn answer_in_slot(&self, slot: AnswerSlot) -> Result<Option<Answer>, StoreError>;

    /// Create an ungraded answer
    ///
    /// Fails with `StoreError::Conflict` if the slot is taken.
    async fn insert_answer(&self, answer: NewAnswer) -> Result<Answer, StoreError>;

    /// Replace an existing answer
    async fn save_answer(&self, answer: &Answer) -> Result<(), StoreError>;

    /// All answers of a participant, ordered by answer ID
    async fn answers_for_participant(
        &self,
        participant_id: ParticipantId,
    ) -> Result<Vec<Answer>, StoreError>;

    /// Authoritative analysis record of an answer
    async fn analysis_for_answer(
        &self,
        answer_id: AnswerId,
    ) -> Result<Option<AnalysisRecord>, StoreError>;

    /// Save an auto-graded answer together with its analysis record
    ///
    /// Both rows are written or neither is. The answer's single record is
    /// updated in place, or created: on update it keeps its ID and review
    /// fields while measured fields and `analyzed_at` are replaced.
    async fn save_graded(
        &self,
        answer: &Answer,
        draft: AnalysisDraft,
    ) -> Result<AnalysisRecord, StoreError>;

    /// Save a reviewed answer and mirror its final score and comments into
    /// its analysis record, if one exists
    ///
    /// Both rows are written or neither is.
    async fn save_reviewed(&self, answer: &Answer) -> Result<Option<AnalysisRecord>, StoreError>;

    /// Look up a participant
    async fn participant(&self, id: ParticipantId) -> Result<Option<Participant>, StoreError>;

    /// Register a participant with score 0
    async fn insert_participant(
        &self,
        exam_id: ExamId,
        user_id: UserId,
    ) -> Result<Participant, StoreError>;

    /// Replace an existing participant
    async fn save_participant(&self, participant: &Participant) -> Result<(), StoreError>;
}

/// Run a store call under a deadline
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout {
            waited_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
