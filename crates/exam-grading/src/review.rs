//! Human review of answers

use crate::aggregate::{AggregateUpdater, RecomputeTrigger};
use crate::context::GradingContext;
use crate::error::{GradingError, ValidationError};
use crate::types::{Answer, AnswerId, AnswerStatus, ReviewRequest, UserId};
use std::sync::Arc;

/// Applies reviewer overrides
#[derive(Debug)]
pub struct ReviewCoordinator {
    ctx: Arc<GradingContext>,
    aggregator: Arc<AggregateUpdater>,
}

impl ReviewCoordinator {
    pub(crate) fn new(ctx: Arc<GradingContext>, aggregator: Arc<AggregateUpdater>) -> Self {
        Self { ctx, aggregator }
    }

    /// Record a reviewer's score and verdict
    ///
    /// The answer becomes `Reviewed` with the given final score; an existing
    /// analysis record mirrors the score and comments. Reviewing again with
    /// the same request leaves the same state, so a call that failed after
    /// the answer was saved can be repeated to bring the participant aggregate
    /// up to date.
    ///
    /// # Errors
    /// - `GradingError::AnswerNotFound` if the answer does not exist
    /// - `ValidationError::ScoreOutOfRange` outside `[0, max_points]`
    /// - `GradingError::LockTimeout` / `TransientStore` (retryable)
    pub async fn review(
        &self,
        answer_id: AnswerId,
        request: ReviewRequest,
        reviewer: UserId,
    ) -> Result<Answer, GradingError> {
        let answer = self.ctx.answer(answer_id).await?;
        let question = self.ctx.question(answer.question_id).await?;

        let score = u32::try_from(request.score)
            .ok()
            .filter(|s| *s <= question.max_points)
            .ok_or(ValidationError::ScoreOutOfRange {
                score: request.score,
                max_points: question.max_points,
            })?;

        let reviewed = {
            let _guard = self.ctx.lock_answer(answer.slot()).await?;
            let mut current = self.ctx.answer(answer_id).await?;

            current.final_score = Some(score);
            current.is_correct = Some(request.is_correct);
            current.reviewer_comments = request.reviewer_comments;
            current.status = AnswerStatus::Reviewed;
            self.ctx.call(self.ctx.store.save_reviewed(&current)).await?;
            current
        };

        tracing::info!(
            "Answer {} reviewed by {}: {}/{}",
            answer_id,
            reviewer,
            score,
            question.max_points
        );

        self.aggregator
            .recompute(reviewed.participant_id, RecomputeTrigger::Review { reviewer })
            .await?;
        Ok(reviewed)
    }
}
