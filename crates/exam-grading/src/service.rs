//! Grading service facade
//!
//! Wires the template catalog, auto-grader, review coordinator and aggregate
//! updater around one store and configuration, and exposes the operations
//! callers use: template lookup and authoring, essay grading, review, plus
//! submission, objective grading, re-grading and participant lookups.

use crate::aggregate::AggregateUpdater;
use crate::catalog::TemplateCatalog;
use crate::config::GradingConfig;
use crate::context::GradingContext;
use crate::error::{GradingError, ValidationError};
use crate::grader::AutoGrader;
use crate::review::ReviewCoordinator;
use crate::store::GradingStore;
use crate::types::{
    Answer, AnswerId, AnswerSlot, AnswerStatus, AnswerTemplate, ExamId, GradeReport, NewAnswer,
    Participant, ParticipantId, ParticipantSheet, Question, QuestionId, ReviewRequest,
    TemplateDraft, UserId,
};
use exam_scoring::{PolicyRegistry, ScoringPolicy};
use std::sync::Arc;

/// Essay grading and review service
#[derive(Debug)]
pub struct GradingService {
    ctx: Arc<GradingContext>,
    catalog: Arc<TemplateCatalog>,
    aggregator: Arc<AggregateUpdater>,
    grader: AutoGrader,
    reviewer: ReviewCoordinator,
}

impl GradingService {
    /// Create service scoring with the configured parameters
    ///
    /// # Errors
    /// - `ValidationError` if the configuration is out of range
    pub fn new(store: Arc<dyn GradingStore>, config: GradingConfig) -> Result<Self, ValidationError> {
        let policy = config.scoring.policy()?;
        Self::with_policy(store, config, policy)
    }

    /// Create service with an explicit scoring policy
    ///
    /// The policy replaces the scoring weights of `config`; the default
    /// threshold still applies to template authoring.
    ///
    /// # Errors
    /// - `ValidationError` if the configuration is out of range
    pub fn with_policy(
        store: Arc<dyn GradingStore>,
        config: GradingConfig,
        policy: ScoringPolicy,
    ) -> Result<Self, ValidationError> {
        config.validate()?;

        let ctx = Arc::new(GradingContext::new(store, config));
        let catalog = Arc::new(TemplateCatalog::new(Arc::clone(&ctx)));
        let aggregator = Arc::new(AggregateUpdater::new(Arc::clone(&ctx)));
        let grader = AutoGrader::new(
            Arc::clone(&ctx),
            Arc::clone(&catalog),
            Arc::clone(&aggregator),
            policy,
        );
        let reviewer = ReviewCoordinator::new(Arc::clone(&ctx), Arc::clone(&aggregator));

        Ok(Self {
            ctx,
            catalog,
            aggregator,
            grader,
            reviewer,
        })
    }

    /// Create service with a policy looked up by name
    ///
    /// # Errors
    /// - `ValidationError::UnknownPolicy` if `name` is not registered
    /// - `ValidationError` if the configuration is out of range
    pub fn from_registry(
        store: Arc<dyn GradingStore>,
        config: GradingConfig,
        registry: &PolicyRegistry,
        name: &str,
    ) -> Result<Self, ValidationError> {
        let policy = registry
            .get(name)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownPolicy(name.to_string()))?;
        Self::with_policy(store, config, policy)
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GradingConfig {
        &self.ctx.config
    }

    /// Template catalog
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Automatic grader
    #[inline]
    #[must_use]
    pub fn grader(&self) -> &AutoGrader {
        &self.grader
    }

    /// Review coordinator
    #[inline]
    #[must_use]
    pub fn reviewer(&self) -> &ReviewCoordinator {
        &self.reviewer
    }

    /// Aggregate updater
    #[inline]
    #[must_use]
    pub fn aggregator(&self) -> &AggregateUpdater {
        &self.aggregator
    }

    /// Template of a question
    ///
    /// # Errors
    /// - `GradingError::TemplateNotFound` if none has been authored
    /// - `GradingError::TransientStore` on store failure
    pub async fn get_template(
        &self,
        exam_id: ExamId,
        question_id: QuestionId,
    ) -> Result<AnswerTemplate, GradingError> {
        self.catalog.get(exam_id, question_id).await
    }

    /// Create or update a template; see [`TemplateCatalog::upsert`]
    ///
    /// # Errors
    /// - `ValidationError` for a bad threshold, missing keywords, or a
    ///   question that is not an essay of this exam
    /// - `GradingError::QuestionNotFound` / `TransientStore`
    pub async fn upsert_template(&self, draft: TemplateDraft) -> Result<AnswerTemplate, GradingError> {
        self.catalog.upsert(draft).await
    }

    /// Grade an essay answer; see [`AutoGrader::grade_essay`]
    ///
    /// # Errors
    /// - any error of [`AutoGrader::grade_essay`]
    pub async fn grade_essay(
        &self,
        exam_id: ExamId,
        participant_id: ParticipantId,
        question_id: QuestionId,
        text: &str,
    ) -> Result<GradeReport, GradingError> {
        self.grader
            .grade_essay(exam_id, participant_id, question_id, text)
            .await
    }

    /// Override an answer's score; see [`ReviewCoordinator::review`]
    ///
    /// # Errors
    /// - any error of [`ReviewCoordinator::review`]
    pub async fn review_answer(
        &self,
        answer_id: AnswerId,
        request: ReviewRequest,
        reviewer: UserId,
    ) -> Result<Answer, GradingError> {
        self.reviewer.review(answer_id, request, reviewer).await
    }

    /// Register or replace a question
    ///
    /// # Errors
    /// - `GradingError::TransientStore` on store failure
    pub async fn add_question(&self, question: Question) -> Result<(), GradingError> {
        self.ctx.call(self.ctx.store.put_question(question)).await
    }

    /// Register a participant with score 0
    ///
    /// # Errors
    /// - `GradingError::TransientStore` on store failure
    pub async fn register_participant(
        &self,
        exam_id: ExamId,
        user_id: UserId,
    ) -> Result<Participant, GradingError> {
        let participant = self
            .ctx
            .call(self.ctx.store.insert_participant(exam_id, user_id))
            .await?;
        tracing::info!(
            "Participant {} registered for exam {} (user {})",
            participant.id,
            exam_id,
            user_id
        );
        Ok(participant)
    }

    /// Submit an answer without grading it
    ///
    /// Fills the participant's slot for the question, or replaces the text
    /// while the answer is still ungraded.
    ///
    /// # Errors
    /// - `GradingError::ParticipantNotFound` / `QuestionNotFound`
    /// - `ValidationError::ExamMismatch` if the question belongs to another exam
    /// - `ValidationError::AlreadyGraded` once the answer has been graded
    /// - `GradingError::LockTimeout` / `TransientStore` (retryable)
    pub async fn submit_answer(
        &self,
        participant_id: ParticipantId,
        question_id: QuestionId,
        text: &str,
    ) -> Result<Answer, GradingError> {
        let participant = self.ctx.participant(participant_id).await?;
        let question = self.ctx.question(question_id).await?;
        question.expect_exam(participant.exam_id)?;

        let slot = AnswerSlot::new(participant_id, question_id);
        let _guard = self.ctx.lock_answer(slot).await?;

        match self.ctx.call(self.ctx.store.answer_in_slot(slot)).await? {
            Some(existing) if existing.status != AnswerStatus::Ungraded => {
                Err(ValidationError::AlreadyGraded(existing.id).into())
            }
            Some(mut existing) => {
                existing.text = text.to_string();
                self.ctx.call(self.ctx.store.save_answer(&existing)).await?;
                Ok(existing)
            }
            None => {
                self.ctx
                    .call(self.ctx.store.insert_answer(NewAnswer {
                        slot,
                        text: text.to_string(),
                    }))
                    .await
            }
        }
    }

    /// Grade a multiple-choice answer; see [`AutoGrader::grade_objective`]
    ///
    /// # Errors
    /// - any error of [`AutoGrader::grade_objective`]
    pub async fn grade_objective(&self, answer_id: AnswerId) -> Result<Answer, GradingError> {
        self.grader.grade_objective(answer_id).await
    }

    /// Re-run essay grading on a stored answer; see [`AutoGrader::regrade`]
    ///
    /// # Errors
    /// - any error of [`AutoGrader::regrade`]
    pub async fn regrade_answer(&self, answer_id: AnswerId) -> Result<GradeReport, GradingError> {
        self.grader.regrade(answer_id).await
    }

    /// Look up a participant
    ///
    /// # Errors
    /// - `GradingError::ParticipantNotFound` / `TransientStore`
    pub async fn participant(&self, participant_id: ParticipantId) -> Result<Participant, GradingError> {
        self.ctx.participant(participant_id).await
    }

    /// Participant with all answers and their analysis records
    ///
    /// # Errors
    /// - `GradingError::ParticipantNotFound` / `TransientStore`
    pub async fn participant_sheet(
        &self,
        participant_id: ParticipantId,
    ) -> Result<ParticipantSheet, GradingError> {
        let participant = self.ctx.participant(participant_id).await?;
        let answers = self
            .ctx
            .call(self.ctx.store.answers_for_participant(participant_id))
            .await?;

        let mut analyses = Vec::with_capacity(answers.len());
        for answer in &answers {
            if let Some(record) = self
                .ctx
                .call(self.ctx.store.analysis_for_answer(answer.id))
                .await?
            {
                analyses.push(record);
            }
        }

        Ok(ParticipantSheet {
            participant,
            answers,
            analyses,
        })
    }
}
