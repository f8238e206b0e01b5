//! Participant aggregate score
//!
//! The aggregate is the mean effective score over a participant's graded
//! answers. Ungraded answers are left out rather than counted as zero; with no
//! graded answer the aggregate is 0. Recomputation is serialized per
//! participant.

use crate::context::GradingContext;
use crate::error::GradingError;
use crate::types::{Answer, Participant, ParticipantId, ParticipantStatus, UserId};
use chrono::Utc;
use std::sync::Arc;

/// What caused a recompute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeTrigger {
    /// An automatic grading pass; only the score changes
    AutoGrade,
    /// A human review; the participant is marked reviewed
    Review {
        /// Reviewer
        reviewer: UserId,
    },
}

/// Mean effective score of the graded answers, 0 when none are graded
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate_score(answers: &[Answer]) -> f64 {
    let scores: Vec<u32> = answers.iter().filter_map(Answer::effective_score).collect();
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().copied().map(f64::from).sum::<f64>() / scores.len() as f64
}

/// Keeps `Participant::score` in step with the participant's answers
#[derive(Debug)]
pub struct AggregateUpdater {
    ctx: Arc<GradingContext>,
}

impl AggregateUpdater {
    pub(crate) fn new(ctx: Arc<GradingContext>) -> Self {
        Self { ctx }
    }

    /// Recompute and persist a participant's aggregate
    ///
    /// # Errors
    /// - `GradingError::ParticipantNotFound` if the participant does not exist
    /// - `GradingError::LockTimeout` if another recompute holds the participant
    /// - `GradingError::TransientStore` on store failure
    pub async fn recompute(
        &self,
        participant_id: ParticipantId,
        trigger: RecomputeTrigger,
    ) -> Result<Participant, GradingError> {
        let _guard = self.ctx.lock_participant(participant_id).await?;

        let mut participant = self.ctx.participant(participant_id).await?;
        let answers = self
            .ctx
            .call(self.ctx.store.answers_for_participant(participant_id))
            .await?;

        participant.score = aggregate_score(&answers);
        if let RecomputeTrigger::Review { reviewer } = trigger {
            participant.status = ParticipantStatus::Reviewed;
            participant.reviewed_by = Some(reviewer);
            participant.reviewed_at = Some(Utc::now());
        }

        self.ctx.call(self.ctx.store.save_participant(&participant)).await?;

        tracing::debug!(
            "Participant {} aggregate {:.2} over {} answers ({:?})",
            participant_id,
            participant.score,
            answers.len(),
            trigger
        );
        Ok(participant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnswerId, AnswerStatus, QuestionId};

    fn answer(id: u64, status: AnswerStatus, auto: Option<u32>, fin: Option<u32>) -> Answer {
        Answer {
            id: AnswerId(id),
            participant_id: ParticipantId(1),
            question_id: QuestionId(id),
            text: String::new(),
            auto_score: auto,
            final_score: fin,
            is_correct: None,
            reviewer_comments: None,
            status,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn ungraded_answers_are_excluded() {
        let answers = vec![
            answer(1, AnswerStatus::AutoGraded, Some(8), None),
            answer(2, AnswerStatus::AutoGraded, Some(4), None),
            answer(3, AnswerStatus::Ungraded, None, None),
        ];
        assert_eq!(aggregate_score(&answers), 6.0);
    }

    #[test]
    fn reviewed_score_wins() {
        let answers = vec![
            answer(1, AnswerStatus::Reviewed, Some(3), Some(85)),
            answer(2, AnswerStatus::AutoGraded, Some(5), None),
        ];
        assert_eq!(aggregate_score(&answers), 45.0);
    }

    #[test]
    fn nothing_graded_is_zero() {
        assert_eq!(aggregate_score(&[]), 0.0);
        assert_eq!(
            aggregate_score(&[answer(1, AnswerStatus::Ungraded, None, None)]),
            0.0
        );
    }
}
