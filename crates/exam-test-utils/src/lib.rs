//! Testing utilities for the exam grading workspace
//!
//! Shared fixtures and a fault-injecting store wrapper.

#![allow(missing_docs)]

use async_trait::async_trait;
use exam_grading::{
    AnalysisDraft, AnalysisRecord, Answer, AnswerId, AnswerSlot, AnswerTemplate, CodingOptions,
    EssayOptions, ExamId, GradingConfig, GradingService, GradingStore, MemoryStore,
    MultipleChoiceOptions, NewAnswer, Participant, ParticipantId, Question, QuestionId,
    StoreError, TemplateDraft, UserId,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const EXAM: ExamId = ExamId(1);
pub const OTHER_EXAM: ExamId = ExamId(2);
pub const ESSAY_QUESTION: QuestionId = QuestionId(10);
pub const CHOICE_QUESTION: QuestionId = QuestionId(11);
pub const CODING_QUESTION: QuestionId = QuestionId(12);
pub const STUDENT: UserId = UserId(500);
pub const REVIEWER: UserId = UserId(900);

pub const REFERENCE_ANSWER: &str =
    "REST endpoints should be idempotent so clients can retry requests safely";

pub fn essay_question() -> Question {
    Question::essay(ESSAY_QUESTION, EXAM, 10, EssayOptions::default()).unwrap()
}

pub fn choice_question() -> Question {
    Question::multiple_choice(
        CHOICE_QUESTION,
        EXAM,
        4,
        MultipleChoiceOptions {
            choices: vec!["GET".into(), "POST".into(), "PATCH".into()],
            correct_choice: 0,
        },
    )
    .unwrap()
}

pub fn coding_question() -> Question {
    Question::coding(
        CODING_QUESTION,
        EXAM,
        20,
        CodingOptions {
            coding_exercise_id: Some(3),
            language: "rust".into(),
        },
    )
    .unwrap()
}

pub fn rest_template() -> TemplateDraft {
    TemplateDraft::new(EXAM, ESSAY_QUESTION, REFERENCE_ANSWER)
        .with_keywords(["REST", "idempotent"])
        .with_minimum_match_percentage(60.0)
}

/// Service over a memory store holding one exam with an essay, a
/// multiple-choice and a coding question, the essay template and one
/// registered participant
pub struct Seeded {
    pub service: GradingService,
    pub store: Arc<MemoryStore>,
    pub participant: Participant,
}

pub async fn seeded() -> Seeded {
    seeded_with(GradingConfig::default()).await
}

pub async fn seeded_with(config: GradingConfig) -> Seeded {
    let store = Arc::new(MemoryStore::new());
    let service = GradingService::new(store.clone(), config).unwrap();

    for question in [essay_question(), choice_question(), coding_question()] {
        service.add_question(question).await.unwrap();
    }
    service.upsert_template(rest_template()).await.unwrap();
    let participant = service.register_participant(EXAM, STUDENT).await.unwrap();

    Seeded {
        service,
        store,
        participant,
    }
}

/// Store wrapper that fails or stalls calls on demand
#[derive(Debug)]
pub struct FaultyStore {
    inner: Arc<dyn GradingStore>,
    failures_left: AtomicUsize,
    method_failures: Mutex<HashMap<&'static str, usize>>,
    delay: Option<Duration>,
    template_lag: Option<Duration>,
    calls: AtomicUsize,
}

impl FaultyStore {
    pub fn new(inner: Arc<dyn GradingStore>) -> Self {
        Self {
            inner,
            failures_left: AtomicUsize::new(0),
            method_failures: Mutex::new(HashMap::new()),
            delay: None,
            template_lag: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Stall every call for `delay` before it runs
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Hold template reads for `lag` after reading, so the value returned
    /// can be older than the stored one
    pub fn with_template_lag(mut self, lag: Duration) -> Self {
        self.template_lag = Some(lag);
        self
    }

    /// Fail the next `n` calls with `StoreError::Unavailable`
    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` calls of one trait method, e.g. `"save_participant"`
    pub fn fail_method(&self, method: &'static str, n: usize) {
        self.method_failures.lock().insert(method, n);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn fault(&self, method: &'static str) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let targeted = match self.method_failures.lock().get_mut(method) {
            Some(left) if *left > 0 => {
                *left -= 1;
                true
            }
            _ => false,
        };
        let failed = targeted
            || self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
        if failed {
            Err(StoreError::Unavailable(format!("injected failure in {method}")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl GradingStore for FaultyStore {
    async fn question(&self, id: QuestionId) -> Result<Option<Question>, StoreError> {
        self.fault("question").await?;
        self.inner.question(id).await
    }

    async fn put_question(&self, question: Question) -> Result<(), StoreError> {
        self.fault("put_question").await?;
        self.inner.put_question(question).await
    }

    async fn template(
        &self,
        exam_id: ExamId,
        question_id: QuestionId,
    ) -> Result<Option<AnswerTemplate>, StoreError> {
        self.fault("template").await?;
        let template = self.inner.template(exam_id, question_id).await;
        if let Some(lag) = self.template_lag {
            tokio::time::sleep(lag).await;
        }
        template
    }

    async fn upsert_template(
        &self,
        exam_id: ExamId,
        question_id: QuestionId,
        content: String,
        keywords: Vec<String>,
        minimum_match_percentage: f64,
    ) -> Result<AnswerTemplate, StoreError> {
        self.fault("upsert_template").await?;
        self.inner
            .upsert_template(exam_id, question_id, content, keywords, minimum_match_percentage)
            .await
    }

    async fn answer(&self, id: AnswerId) -> Result<Option<Answer>, StoreError> {
        self.fault("answer").await?;
        self.inner.answer(id).await
    }

    async fn answer_in_slot(&self, slot: AnswerSlot) -> Result<Option<Answer>, StoreError> {
        self.fault("answer_in_slot").await?;
        self.inner.answer_in_slot(slot).await
    }

    async fn insert_answer(&self, answer: NewAnswer) -> Result<Answer, StoreError> {
        self.fault("insert_answer").await?;
        self.inner.insert_answer(answer).await
    }

    async fn save_answer(&self, answer: &Answer) -> Result<(), StoreError> {
        self.fault("save_answer").await?;
        self.inner.save_answer(answer).await
    }

    async fn answers_for_participant(
        &self,
        participant_id: ParticipantId,
    ) -> Result<Vec<Answer>, StoreError> {
        self.fault("answers_for_participant").await?;
        self.inner.answers_for_participant(participant_id).await
    }

    async fn analysis_for_answer(
        &self,
        answer_id: AnswerId,
    ) -> Result<Option<AnalysisRecord>, StoreError> {
        self.fault("analysis_for_answer").await?;
        self.inner.analysis_for_answer(answer_id).await
    }

    async fn save_graded(
        &self,
        answer: &Answer,
        draft: AnalysisDraft,
    ) -> Result<AnalysisRecord, StoreError> {
        self.fault("save_graded").await?;
        self.inner.save_graded(answer, draft).await
    }

    async fn save_reviewed(&self, answer: &Answer) -> Result<Option<AnalysisRecord>, StoreError> {
        self.fault("save_reviewed").await?;
        self.inner.save_reviewed(answer).await
    }

    async fn participant(&self, id: ParticipantId) -> Result<Option<Participant>, StoreError> {
        self.fault("participant").await?;
        self.inner.participant(id).await
    }

    async fn insert_participant(
        &self,
        exam_id: ExamId,
        user_id: UserId,
    ) -> Result<Participant, StoreError> {
        self.fault("insert_participant").await?;
        self.inner.insert_participant(exam_id, user_id).await
    }

    async fn save_participant(&self, participant: &Participant) -> Result<(), StoreError> {
        self.fault("save_participant").await?;
        self.inner.save_participant(participant).await
    }
}
