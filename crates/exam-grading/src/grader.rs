//! Automatic grading
//!
//! Essay answers are scored against their question's template through the
//! configured [`ScoringPolicy`]; multiple-choice answers against the correct
//! choice. Each pass updates the answer's single analysis record in place,
//! never regresses a reviewed answer, and finishes with an aggregate
//! recompute for the owning participant.

use crate::aggregate::{AggregateUpdater, RecomputeTrigger};
use crate::catalog::TemplateCatalog;
use crate::context::GradingContext;
use crate::error::{GradingError, ValidationError};
use crate::state::after_auto_grade;
use crate::types::{
    AnalysisDraft, Answer, AnswerId, AnswerSlot, AnswerStatus, AnswerTemplate, ExamId, GradeReport,
    NewAnswer, ParticipantId, Question, QuestionId,
};
use exam_scoring::{Analysis, ScoringPolicy};
use std::sync::Arc;

/// Automatic grading pass
#[derive(Debug)]
pub struct AutoGrader {
    ctx: Arc<GradingContext>,
    catalog: Arc<TemplateCatalog>,
    aggregator: Arc<AggregateUpdater>,
    policy: ScoringPolicy,
}

impl AutoGrader {
    pub(crate) fn new(
        ctx: Arc<GradingContext>,
        catalog: Arc<TemplateCatalog>,
        aggregator: Arc<AggregateUpdater>,
        policy: ScoringPolicy,
    ) -> Self {
        Self {
            ctx,
            catalog,
            aggregator,
            policy,
        }
    }

    /// Scoring policy in use
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Score an answer text against a template; no I/O
    #[must_use]
    pub fn analyze(&self, text: &str, template: &AnswerTemplate, max_points: u32) -> Analysis {
        self.policy.analyze(
            text,
            &template.reference(),
            template.minimum_match_percentage,
            max_points,
        )
    }

    /// Grade a participant's essay answer, creating the answer if needed
    ///
    /// The text replaces the stored one until the answer is reviewed; after
    /// that only the reviewed text can be graded again.
    ///
    /// A failure after the answer is saved leaves the participant aggregate
    /// behind; repeating the call saves the same grade and recomputes it.
    ///
    /// # Errors
    /// - `GradingError::ParticipantNotFound` / `QuestionNotFound`
    /// - `ValidationError::ExamMismatch` if either belongs to another exam
    /// - `ValidationError::WrongQuestionKind` for non-essay questions
    /// - `ValidationError::AlreadyReviewed` for new text on a reviewed answer
    /// - `GradingError::TemplateNotFound` if no template is authored
    /// - `GradingError::LockTimeout` / `TransientStore` (retryable)
    pub async fn grade_essay(
        &self,
        exam_id: ExamId,
        participant_id: ParticipantId,
        question_id: QuestionId,
        text: &str,
    ) -> Result<GradeReport, GradingError> {
        let participant = self.ctx.participant(participant_id).await?;
        if participant.exam_id != exam_id {
            return Err(ValidationError::ExamMismatch {
                expected: exam_id,
                actual: participant.exam_id,
            }
            .into());
        }

        let question = self.ctx.question(question_id).await?;
        question.expect_exam(exam_id)?;
        question.expect_kind("essay")?;
        let template = self.catalog.get(exam_id, question_id).await?;

        tracing::info!(
            "Grading essay of participant {} for question {}",
            participant_id,
            question_id
        );

        let slot = AnswerSlot::new(participant_id, question_id);
        let report = {
            let _guard = self.ctx.lock_answer(slot).await?;
            let mut answer = match self.ctx.call(self.ctx.store.answer_in_slot(slot)).await? {
                Some(existing) => existing,
                None => {
                    self.ctx
                        .call(self.ctx.store.insert_answer(NewAnswer {
                            slot,
                            text: text.to_string(),
                        }))
                        .await?
                }
            };
            if answer.text != text {
                if answer.status == AnswerStatus::Reviewed {
                    return Err(ValidationError::AlreadyReviewed(answer.id).into());
                }
                answer.text = text.to_string();
            }
            self.apply(answer, &question, &template).await?
        };

        self.aggregator
            .recompute(participant_id, RecomputeTrigger::AutoGrade)
            .await?;
        Ok(report)
    }

    /// Grade the stored text of an essay answer again, e.g. after its
    /// template changed
    ///
    /// # Errors
    /// - `GradingError::AnswerNotFound` / `QuestionNotFound` / `TemplateNotFound`
    /// - `ValidationError::WrongQuestionKind` for non-essay questions
    /// - `GradingError::LockTimeout` / `TransientStore` (retryable)
    pub async fn regrade(&self, answer_id: AnswerId) -> Result<GradeReport, GradingError> {
        let answer = self.ctx.answer(answer_id).await?;
        let question = self.ctx.question(answer.question_id).await?;
        question.expect_kind("essay")?;
        let template = self.catalog.get(question.exam_id, question.id).await?;

        let report = {
            let _guard = self.ctx.lock_answer(answer.slot()).await?;
            let current = self.ctx.answer(answer_id).await?;
            self.apply(current, &question, &template).await?
        };

        self.aggregator
            .recompute(answer.participant_id, RecomputeTrigger::AutoGrade)
            .await?;
        Ok(report)
    }

    /// Score a multiple-choice answer: full points when correct, else 0
    ///
    /// A reviewed answer keeps its reviewer verdict.
    ///
    /// # Errors
    /// - `GradingError::AnswerNotFound` / `QuestionNotFound`
    /// - `ValidationError::WrongQuestionKind` for other question kinds
    /// - `GradingError::LockTimeout` / `TransientStore` (retryable)
    pub async fn grade_objective(&self, answer_id: AnswerId) -> Result<Answer, GradingError> {
        let answer = self.ctx.answer(answer_id).await?;
        let question = self.ctx.question(answer.question_id).await?;
        let options = question.choices()?;

        let graded = {
            let _guard = self.ctx.lock_answer(answer.slot()).await?;
            let mut current = self.ctx.answer(answer_id).await?;

            let correct = options.is_correct(&current.text);
            current.auto_score = Some(if correct { question.max_points } else { 0 });
            if current.status != AnswerStatus::Reviewed {
                current.is_correct = Some(correct);
            }
            current.status = after_auto_grade(current.status);

            self.ctx.call(self.ctx.store.save_answer(&current)).await?;
            current
        };

        tracing::info!(
            "Answer {} to question {} graded {}/{}",
            answer_id,
            question.id,
            graded.auto_score.unwrap_or_default(),
            question.max_points
        );

        self.aggregator
            .recompute(graded.participant_id, RecomputeTrigger::AutoGrade)
            .await?;
        Ok(graded)
    }

    /// Analyze, then save the answer and its analysis in one write. Caller
    /// holds the answer lock.
    async fn apply(
        &self,
        mut answer: Answer,
        question: &Question,
        template: &AnswerTemplate,
    ) -> Result<GradeReport, GradingError> {
        let analysis = self.analyze(&answer.text, template, question.max_points);

        answer.auto_score = Some(analysis.score);
        answer.status = after_auto_grade(answer.status);
        let record = self
            .ctx
            .call(
                self.ctx
                    .store
                    .save_graded(&answer, AnalysisDraft::from_analysis(answer.id, &analysis)),
            )
            .await?;

        tracing::info!(
            "Answer {} scored {}/{} (match {:.1}%, keywords {}/{}, content {:.1}%)",
            answer.id,
            analysis.score,
            analysis.max_points,
            analysis.match_percentage,
            analysis.keywords_matched,
            analysis.total_keywords,
            analysis.content_similarity
        );

        Ok(GradeReport {
            answer_id: answer.id,
            match_percentage: analysis.match_percentage,
            keywords_matched: analysis.keywords_matched,
            total_keywords: analysis.total_keywords,
            content_similarity: analysis.content_similarity,
            score: analysis.score,
            max_points: analysis.max_points,
            analysis_id: record.id,
            status: answer.status,
        })
    }
}
