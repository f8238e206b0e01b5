//! Answer template catalog
//!
//! Reads go through a `moka` TTL cache; concurrent misses for the same
//! question share one store fetch. Every entry carries the write generation of
//! its key as seen before the fetch started. A write bumps the generation and
//! drops the entry, so a fetch that raced the write is discarded instead of
//! served.

use crate::context::GradingContext;
use crate::error::{GradingError, StoreError, ValidationError};
use crate::store::bounded;
use crate::types::{normalize_keywords, AnswerTemplate, ExamId, QuestionId, TemplateDraft};
use dashmap::DashMap;
use moka::future::Cache;
use std::sync::Arc;

type TemplateKey = (ExamId, QuestionId);

#[derive(Debug, Clone)]
struct CachedTemplate {
    generation: u64,
    template: AnswerTemplate,
}

/// Why a fetch produced no entry; never cached
#[derive(Debug)]
enum FetchMiss {
    Absent,
    Store(StoreError),
}

/// Cached access to answer templates
#[derive(Debug)]
pub struct TemplateCatalog {
    ctx: Arc<GradingContext>,
    cache: Cache<TemplateKey, CachedTemplate>,
    generations: DashMap<TemplateKey, u64>,
}

impl TemplateCatalog {
    pub(crate) fn new(ctx: Arc<GradingContext>) -> Self {
        let cache = Cache::builder()
            .max_capacity(ctx.config.template_cache_capacity)
            .time_to_live(ctx.config.template_cache_ttl())
            .build();
        Self {
            ctx,
            cache,
            generations: DashMap::new(),
        }
    }

    /// Template of a question
    ///
    /// Never returns a template older than the last completed
    /// [`upsert`](Self::upsert) of the question.
    ///
    /// # Errors
    /// - `GradingError::TemplateNotFound` if none has been authored
    /// - `GradingError::TransientStore` on store failure
    pub async fn get(
        &self,
        exam_id: ExamId,
        question_id: QuestionId,
    ) -> Result<AnswerTemplate, GradingError> {
        let key = (exam_id, question_id);
        loop {
            let generation = self.generation(&key);
            let store = Arc::clone(&self.ctx.store);
            let limit = self.ctx.config.store_timeout();

            let fetched = self
                .cache
                .try_get_with(key, async move {
                    tracing::debug!(
                        "Template cache miss for question {} of exam {}",
                        question_id,
                        exam_id
                    );
                    match bounded(limit, store.template(exam_id, question_id)).await {
                        Ok(Some(template)) => Ok(CachedTemplate {
                            generation,
                            template,
                        }),
                        Ok(None) => Err(FetchMiss::Absent),
                        Err(e) => Err(FetchMiss::Store(e)),
                    }
                })
                .await;

            match fetched {
                Ok(entry) if entry.generation == self.generation(&key) => {
                    return Ok(entry.template);
                }
                Ok(_) => {
                    tracing::debug!(
                        "Discarding template of question {} fetched before an update",
                        question_id
                    );
                    self.cache.invalidate(&key).await;
                }
                Err(miss) => {
                    return Err(match &*miss {
                        FetchMiss::Absent => GradingError::TemplateNotFound {
                            exam_id,
                            question_id,
                        },
                        FetchMiss::Store(e) => {
                            tracing::warn!("Template fetch failed: {}", e);
                            GradingError::from(e.clone())
                        }
                    });
                }
            }
        }
    }

    /// Create or update a template
    ///
    /// Keywords are normalized; a missing threshold takes the configured
    /// default.
    ///
    /// # Errors
    /// - `ValidationError::ThresholdOutOfRange` outside `[0, 100]`
    /// - `ValidationError::KeywordsRequired` for a nonzero threshold without keywords
    /// - `GradingError::QuestionNotFound` if the question does not exist
    /// - `ValidationError::ExamMismatch` / `WrongQuestionKind` if it is not an
    ///   essay question of `exam_id`
    /// - `GradingError::TransientStore` on store failure
    pub async fn upsert(&self, draft: TemplateDraft) -> Result<AnswerTemplate, GradingError> {
        let minimum = draft
            .minimum_match_percentage
            .unwrap_or(self.ctx.config.scoring.default_minimum_match_percentage);
        if !(0.0..=100.0).contains(&minimum) {
            return Err(ValidationError::ThresholdOutOfRange(minimum).into());
        }

        let keywords = normalize_keywords(&draft.keywords);
        if keywords.is_empty() && minimum > 0.0 {
            return Err(ValidationError::KeywordsRequired { threshold: minimum }.into());
        }

        let question = self.ctx.question(draft.question_id).await?;
        question.expect_exam(draft.exam_id)?;
        question.expect_kind("essay")?;

        let saved = self
            .ctx
            .call(self.ctx.store.upsert_template(
                draft.exam_id,
                draft.question_id,
                draft.content,
                keywords,
                minimum,
            ))
            .await;
        // A failed write may still have landed.
        self.expire((draft.exam_id, draft.question_id)).await;
        let template = saved?;

        tracing::info!(
            "Template {} saved for question {} ({} keywords, threshold {}%)",
            template.id,
            template.question_id,
            template.keywords.len(),
            template.minimum_match_percentage
        );
        Ok(template)
    }

    /// Drop a cached template; fetches already running are discarded too
    pub async fn invalidate(&self, exam_id: ExamId, question_id: QuestionId) {
        self.expire((exam_id, question_id)).await;
    }

    fn generation(&self, key: &TemplateKey) -> u64 {
        self.generations.get(key).map_or(0, |g| *g.value())
    }

    async fn expire(&self, key: TemplateKey) {
        *self.generations.entry(key).or_insert(0) += 1;
        self.cache.invalidate(&key).await;
    }
}
