//! Shared state of the grading components

use crate::config::GradingConfig;
use crate::error::{GradingError, StoreError};
use crate::locks::{KeyedGuard, KeyedLocks};
use crate::store::{bounded, GradingStore};
use crate::types::{Answer, AnswerId, AnswerSlot, Participant, ParticipantId, Question, QuestionId};
use std::future::Future;
use std::sync::Arc;

/// Store handle, configuration and the keyed locks guarding answers and
/// participant aggregates
#[derive(Debug)]
pub(crate) struct GradingContext {
    pub(crate) store: Arc<dyn GradingStore>,
    pub(crate) config: GradingConfig,
    answer_locks: KeyedLocks<AnswerSlot>,
    participant_locks: KeyedLocks<ParticipantId>,
}

impl GradingContext {
    pub(crate) fn new(store: Arc<dyn GradingStore>, config: GradingConfig) -> Self {
        Self {
            store,
            config,
            answer_locks: KeyedLocks::new("answer"),
            participant_locks: KeyedLocks::new("participant"),
        }
    }

    /// Run a store call under the configured deadline
    pub(crate) async fn call<T, F>(&self, call: F) -> Result<T, GradingError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        bounded(self.config.store_timeout(), call).await.map_err(|e| {
            tracing::warn!("Store call failed: {}", e);
            GradingError::from(e)
        })
    }

    pub(crate) async fn lock_answer(
        &self,
        slot: AnswerSlot,
    ) -> Result<KeyedGuard<AnswerSlot>, GradingError> {
        Ok(self
            .answer_locks
            .acquire(slot, self.config.lock_timeout())
            .await?)
    }

    pub(crate) async fn lock_participant(
        &self,
        id: ParticipantId,
    ) -> Result<KeyedGuard<ParticipantId>, GradingError> {
        Ok(self
            .participant_locks
            .acquire(id, self.config.lock_timeout())
            .await?)
    }

    pub(crate) async fn question(&self, id: QuestionId) -> Result<Question, GradingError> {
        self.call(self.store.question(id))
            .await?
            .ok_or(GradingError::QuestionNotFound(id))
    }

    pub(crate) async fn answer(&self, id: AnswerId) -> Result<Answer, GradingError> {
        self.call(self.store.answer(id))
            .await?
            .ok_or(GradingError::AnswerNotFound(id))
    }

    pub(crate) async fn participant(&self, id: ParticipantId) -> Result<Participant, GradingError> {
        self.call(self.store.participant(id))
            .await?
            .ok_or(GradingError::ParticipantNotFound(id))
    }
}
