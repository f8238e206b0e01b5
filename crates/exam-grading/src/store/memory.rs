//! In-memory store
//!
//! Single-process [`GradingStore`] backed by hash maps behind one lock. Used by
//! tests and the CLI; IDs are assigned from per-table sequences starting at 1.

use super::GradingStore;
use crate::error::StoreError;
use crate::types::{
    AnalysisDraft, AnalysisId, AnalysisRecord, Answer, AnswerId, AnswerSlot, AnswerStatus,
    AnswerTemplate, ExamId, NewAnswer, Participant, ParticipantId, ParticipantStatus, Question,
    QuestionId, TemplateId, UserId,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default)]
struct Tables {
    questions: HashMap<QuestionId, Question>,
    templates: HashMap<(ExamId, QuestionId), AnswerTemplate>,
    answers: BTreeMap<AnswerId, Answer>,
    slots: HashMap<AnswerSlot, AnswerId>,
    analyses: HashMap<AnswerId, AnalysisRecord>,
    participants: HashMap<ParticipantId, Participant>,
    sequences: Sequences,
}

#[derive(Debug, Default)]
struct Sequences {
    template: u64,
    answer: u64,
    analysis: u64,
    participant: u64,
}

fn next(seq: &mut u64) -> u64 {
    *seq += 1;
    *seq
}

/// In-memory grading store
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of analysis records held
    #[must_use]
    pub fn analysis_count(&self) -> usize {
        self.tables.read().analyses.len()
    }

    /// Number of answers held
    #[must_use]
    pub fn answer_count(&self) -> usize {
        self.tables.read().answers.len()
    }
}

#[async_trait]
impl GradingStore for MemoryStore {
    async fn question(&self, id: QuestionId) -> Result<Option<Question>, StoreError> {
        Ok(self.tables.read().questions.get(&id).cloned())
    }

    async fn put_question(&self, question: Question) -> Result<(), StoreError> {
        self.tables.write().questions.insert(question.id, question);
        Ok(())
    }

    async fn template(
        &self,
        exam_id: ExamId,
        question_id: QuestionId,
    ) -> Result<Option<AnswerTemplate>, StoreError> {
        Ok(self
            .tables
            .read()
            .templates
            .get(&(exam_id, question_id))
            .cloned())
    }

    async fn upsert_template(
        &self,
        exam_id: ExamId,
        question_id: QuestionId,
        content: String,
        keywords: Vec<String>,
        minimum_match_percentage: f64,
    ) -> Result<AnswerTemplate, StoreError> {
        let mut tables = self.tables.write();
        let tables = &mut *tables;

        let id = match tables.templates.get(&(exam_id, question_id)) {
            Some(existing) => existing.id,
            None => TemplateId(next(&mut tables.sequences.template)),
        };

        let template = AnswerTemplate {
            id,
            exam_id,
            question_id,
            content,
            keywords,
            minimum_match_percentage,
            updated_at: Utc::now(),
        };
        tables
            .templates
            .insert((exam_id, question_id), template.clone());
        Ok(template)
    }

    async fn answer(&self, id: AnswerId) -> Result<Option<Answer>, StoreError> {
        Ok(self.tables.read().answers.get(&id).cloned())
    }

    async fn answer_in_slot(&self, slot: AnswerSlot) -> Result<Option<Answer>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .slots
            .get(&slot)
            .and_then(|id| tables.answers.get(id))
            .cloned())
    }

    async fn insert_answer(&self, answer: NewAnswer) -> Result<Answer, StoreError> {
        let mut tables = self.tables.write();
        let tables = &mut *tables;

        if let Some(existing) = tables.slots.get(&answer.slot) {
            return Err(StoreError::Conflict(format!(
                "participant {} already answered question {} (answer {existing})",
                answer.slot.participant_id, answer.slot.question_id
            )));
        }

        let id = AnswerId(next(&mut tables.sequences.answer));
        let created = Answer {
            id,
            participant_id: answer.slot.participant_id,
            question_id: answer.slot.question_id,
            text: answer.text,
            auto_score: None,
            final_score: None,
            is_correct: None,
            reviewer_comments: None,
            status: AnswerStatus::Ungraded,
            submitted_at: Utc::now(),
        };
        tables.slots.insert(answer.slot, id);
        tables.answers.insert(id, created.clone());
        Ok(created)
    }

    async fn save_answer(&self, answer: &Answer) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        match tables.answers.get_mut(&answer.id) {
            Some(slot) => {
                *slot = answer.clone();
                Ok(())
            }
            None => Err(StoreError::Conflict(format!("answer {} does not exist", answer.id))),
        }
    }

    async fn answers_for_participant(
        &self,
        participant_id: ParticipantId,
    ) -> Result<Vec<Answer>, StoreError> {
        Ok(self
            .tables
            .read()
            .answers
            .values()
            .filter(|a| a.participant_id == participant_id)
            .cloned()
            .collect())
    }

    async fn analysis_for_answer(
        &self,
        answer_id: AnswerId,
    ) -> Result<Option<AnalysisRecord>, StoreError> {
        Ok(self.tables.read().analyses.get(&answer_id).cloned())
    }

    async fn save_graded(
        &self,
        answer: &Answer,
        draft: AnalysisDraft,
    ) -> Result<AnalysisRecord, StoreError> {
        let mut tables = self.tables.write();
        let tables = &mut *tables;

        if draft.answer_id != answer.id {
            return Err(StoreError::Conflict(format!(
                "analysis for answer {} saved with answer {}",
                draft.answer_id, answer.id
            )));
        }
        let Some(stored) = tables.answers.get_mut(&answer.id) else {
            return Err(StoreError::Conflict(format!("answer {} does not exist", answer.id)));
        };

        let (id, final_score, reviewer_comments) = match tables.analyses.get(&answer.id) {
            Some(existing) => (
                existing.id,
                existing.final_score,
                existing.reviewer_comments.clone(),
            ),
            None => (AnalysisId(next(&mut tables.sequences.analysis)), None, None),
        };

        let record = AnalysisRecord {
            id,
            answer_id: answer.id,
            match_percentage: draft.match_percentage,
            keywords_matched: draft.keywords_matched,
            total_keywords: draft.total_keywords,
            content_similarity: draft.content_similarity,
            auto_graded_score: draft.auto_graded_score,
            final_score,
            reviewer_comments,
            analyzed_at: Utc::now(),
        };
        *stored = answer.clone();
        tables.analyses.insert(answer.id, record.clone());
        Ok(record)
    }

    async fn save_reviewed(&self, answer: &Answer) -> Result<Option<AnalysisRecord>, StoreError> {
        let mut tables = self.tables.write();
        let tables = &mut *tables;

        let Some(stored) = tables.answers.get_mut(&answer.id) else {
            return Err(StoreError::Conflict(format!("answer {} does not exist", answer.id)));
        };
        *stored = answer.clone();

        Ok(tables.analyses.get_mut(&answer.id).map(|record| {
            record.final_score = answer.final_score;
            record.reviewer_comments.clone_from(&answer.reviewer_comments);
            record.clone()
        }))
    }

    async fn participant(&self, id: ParticipantId) -> Result<Option<Participant>, StoreError> {
        Ok(self.tables.read().participants.get(&id).cloned())
    }

    async fn insert_participant(
        &self,
        exam_id: ExamId,
        user_id: UserId,
    ) -> Result<Participant, StoreError> {
        let mut tables = self.tables.write();
        let tables = &mut *tables;

        let participant = Participant {
            id: ParticipantId(next(&mut tables.sequences.participant)),
            exam_id,
            user_id,
            score: 0.0,
            status: ParticipantStatus::Registered,
            reviewed_by: None,
            reviewed_at: None,
        };
        tables
            .participants
            .insert(participant.id, participant.clone());
        Ok(participant)
    }

    async fn save_participant(&self, participant: &Participant) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        match tables.participants.get_mut(&participant.id) {
            Some(existing) => {
                *existing = participant.clone();
                Ok(())
            }
            None => Err(StoreError::Conflict(format!(
                "participant {} does not exist",
                participant.id
            ))),
        }
    }
}
