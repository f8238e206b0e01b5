//! Core types for essay grading
//!
//! Defines the persisted entities and the operation payloads:
//! - identifiers
//! - questions, tagged by kind
//! - answer templates
//! - answers and their grading status
//! - analysis records
//! - participants and their aggregate score

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use exam_scoring::{Analysis, Reference};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

id_type!(
    /// Exam identifier
    ExamId
);
id_type!(
    /// Question identifier
    QuestionId
);
id_type!(
    /// Exam participant identifier (one per user per exam)
    ParticipantId
);
id_type!(
    /// Answer identifier
    AnswerId
);
id_type!(
    /// Analysis record identifier
    AnalysisId
);
id_type!(
    /// Answer template identifier
    TemplateId
);
id_type!(
    /// Platform user identifier
    UserId
);

/// Options carried by essay questions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssayOptions {
    /// Uploaded reference essay, if any
    pub essay_file_path: Option<String>,
}

/// Options carried by multiple-choice questions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipleChoiceOptions {
    /// Choices shown to the participant
    pub choices: Vec<String>,
    /// Index of the correct choice
    pub correct_choice: usize,
}

impl MultipleChoiceOptions {
    /// Check a submitted choice (trimmed, case-insensitive)
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        self.choices
            .get(self.correct_choice)
            .is_some_and(|c| c.trim().to_lowercase() == answer.trim().to_lowercase())
    }
}

/// Options carried by coding questions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodingOptions {
    /// Linked coding exercise
    pub coding_exercise_id: Option<u64>,
    /// Programming language
    pub language: String,
}

/// Question kind with its kind-specific options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    /// Free-text answer graded against a template
    Essay(EssayOptions),
    /// Single correct choice
    MultipleChoice(MultipleChoiceOptions),
    /// Program submission, reviewed by hand here
    Coding(CodingOptions),
}

impl QuestionKind {
    /// Kind name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Essay(_) => "essay",
            Self::MultipleChoice(_) => "multiple_choice",
            Self::Coding(_) => "coding",
        }
    }
}

/// Exam question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question ID
    pub id: QuestionId,
    /// Owning exam
    pub exam_id: ExamId,
    /// Points available
    pub max_points: u32,
    /// Kind and options
    pub kind: QuestionKind,
}

impl Question {
    /// Create essay question
    ///
    /// # Errors
    /// - `ValidationError::InvalidQuestion` if `max_points` is 0
    pub fn essay(
        id: QuestionId,
        exam_id: ExamId,
        max_points: u32,
        options: EssayOptions,
    ) -> Result<Self, ValidationError> {
        Self::new(id, exam_id, max_points, QuestionKind::Essay(options))
    }

    /// Create multiple-choice question
    ///
    /// # Errors
    /// - `ValidationError::InvalidQuestion` if `max_points` is 0, there are no
    ///   choices, or the correct choice is out of range
    pub fn multiple_choice(
        id: QuestionId,
        exam_id: ExamId,
        max_points: u32,
        options: MultipleChoiceOptions,
    ) -> Result<Self, ValidationError> {
        Self::new(id, exam_id, max_points, QuestionKind::MultipleChoice(options))
    }

    /// Create coding question
    ///
    /// # Errors
    /// - `ValidationError::InvalidQuestion` if `max_points` is 0 or the
    ///   language is blank
    pub fn coding(
        id: QuestionId,
        exam_id: ExamId,
        max_points: u32,
        options: CodingOptions,
    ) -> Result<Self, ValidationError> {
        Self::new(id, exam_id, max_points, QuestionKind::Coding(options))
    }

    /// Create question of any kind, validating kind-specific options
    ///
    /// # Errors
    /// - `ValidationError::InvalidQuestion` describing the first problem found
    pub fn new(
        id: QuestionId,
        exam_id: ExamId,
        max_points: u32,
        kind: QuestionKind,
    ) -> Result<Self, ValidationError> {
        if max_points == 0 {
            return Err(ValidationError::InvalidQuestion(format!(
                "question {id} must be worth at least one point"
            )));
        }

        match &kind {
            QuestionKind::Essay(_) => {}
            QuestionKind::MultipleChoice(opts) => {
                if opts.choices.is_empty() {
                    return Err(ValidationError::InvalidQuestion(format!(
                        "question {id} has no choices"
                    )));
                }
                if opts.correct_choice >= opts.choices.len() {
                    return Err(ValidationError::InvalidQuestion(format!(
                        "question {id}: correct choice {} out of {} choices",
                        opts.correct_choice,
                        opts.choices.len()
                    )));
                }
            }
            QuestionKind::Coding(opts) => {
                if opts.language.trim().is_empty() {
                    return Err(ValidationError::InvalidQuestion(format!(
                        "question {id} has no programming language"
                    )));
                }
            }
        }

        Ok(Self {
            id,
            exam_id,
            max_points,
            kind,
        })
    }

    /// Check if this is an essay question
    #[inline]
    #[must_use]
    pub fn is_essay(&self) -> bool {
        matches!(self.kind, QuestionKind::Essay(_))
    }

    /// Fail unless the question is of the `expected` kind
    pub(crate) fn expect_kind(&self, expected: &'static str) -> Result<(), ValidationError> {
        if self.kind.name() == expected {
            Ok(())
        } else {
            Err(ValidationError::WrongQuestionKind {
                question_id: self.id,
                expected,
                actual: self.kind.name(),
            })
        }
    }

    /// Multiple-choice options, or `WrongQuestionKind`
    pub(crate) fn choices(&self) -> Result<&MultipleChoiceOptions, ValidationError> {
        if let QuestionKind::MultipleChoice(options) = &self.kind {
            return Ok(options);
        }
        Err(ValidationError::WrongQuestionKind {
            question_id: self.id,
            expected: "multiple_choice",
            actual: self.kind.name(),
        })
    }

    /// Fail unless the question belongs to `exam_id`
    pub(crate) fn expect_exam(&self, exam_id: ExamId) -> Result<(), ValidationError> {
        if self.exam_id == exam_id {
            Ok(())
        } else {
            Err(ValidationError::ExamMismatch {
                expected: exam_id,
                actual: self.exam_id,
            })
        }
    }
}

/// Reference answer and grading parameters for one essay question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerTemplate {
    /// Template ID
    pub id: TemplateId,
    /// Exam
    pub exam_id: ExamId,
    /// Question
    pub question_id: QuestionId,
    /// Reference answer text
    pub content: String,
    /// Required keywords, in author order
    pub keywords: Vec<String>,
    /// Pass threshold in `[0, 100]`
    pub minimum_match_percentage: f64,
    /// Last authored
    pub updated_at: DateTime<Utc>,
}

impl AnswerTemplate {
    /// Scoring reference view
    #[inline]
    #[must_use]
    pub fn reference(&self) -> Reference<'_> {
        Reference::new(&self.content, &self.keywords)
    }
}

/// Template authoring request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDraft {
    /// Exam
    pub exam_id: ExamId,
    /// Question
    pub question_id: QuestionId,
    /// Reference answer text
    pub content: String,
    /// Required keywords
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Pass threshold; configured default when absent
    #[serde(default)]
    pub minimum_match_percentage: Option<f64>,
}

impl TemplateDraft {
    /// Create draft without keywords
    #[must_use]
    pub fn new(exam_id: ExamId, question_id: QuestionId, content: impl Into<String>) -> Self {
        Self {
            exam_id,
            question_id,
            content: content.into(),
            keywords: Vec::new(),
            minimum_match_percentage: None,
        }
    }

    /// With keywords
    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// With pass threshold
    #[inline]
    #[must_use]
    pub fn with_minimum_match_percentage(mut self, minimum: f64) -> Self {
        self.minimum_match_percentage = Some(minimum);
        self
    }
}

/// Trim keywords, drop blanks and case-insensitive duplicates (first wins)
#[must_use]
pub fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Grading status of an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    /// Submitted, no score yet
    Ungraded,
    /// Scored automatically
    AutoGraded,
    /// Scored by a reviewer; the final score is authoritative
    Reviewed,
}

/// (participant, question) pair identifying the single answer slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnswerSlot {
    /// Participant
    pub participant_id: ParticipantId,
    /// Question
    pub question_id: QuestionId,
}

impl AnswerSlot {
    /// Create slot
    #[inline]
    #[must_use]
    pub fn new(participant_id: ParticipantId, question_id: QuestionId) -> Self {
        Self {
            participant_id,
            question_id,
        }
    }
}

impl std::fmt::Display for AnswerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.participant_id, self.question_id)
    }
}

/// Submitted answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Answer ID
    pub id: AnswerId,
    /// Owning participant
    pub participant_id: ParticipantId,
    /// Question answered
    pub question_id: QuestionId,
    /// Submitted text
    pub text: String,
    /// Latest automatic score
    pub auto_score: Option<u32>,
    /// Reviewer score
    pub final_score: Option<u32>,
    /// Reviewer (or objective) verdict
    pub is_correct: Option<bool>,
    /// Reviewer comments
    pub reviewer_comments: Option<String>,
    /// Grading status
    pub status: AnswerStatus,
    /// Submission time
    pub submitted_at: DateTime<Utc>,
}

impl Answer {
    /// Slot this answer occupies
    #[inline]
    #[must_use]
    pub fn slot(&self) -> AnswerSlot {
        AnswerSlot::new(self.participant_id, self.question_id)
    }

    /// Score counted in the aggregate: final if reviewed, auto otherwise,
    /// `None` while ungraded
    #[must_use]
    pub fn effective_score(&self) -> Option<u32> {
        match self.status {
            AnswerStatus::Ungraded => None,
            AnswerStatus::AutoGraded => self.auto_score,
            AnswerStatus::Reviewed => self.final_score.or(self.auto_score),
        }
    }
}

/// Answer creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnswer {
    /// Slot to fill
    pub slot: AnswerSlot,
    /// Submitted text
    pub text: String,
}

/// Persisted scoring rationale of one answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Record ID
    pub id: AnalysisId,
    /// Analysed answer
    pub answer_id: AnswerId,
    /// Weighted match percentage
    pub match_percentage: f64,
    /// Keywords found
    pub keywords_matched: usize,
    /// Keywords required
    pub total_keywords: usize,
    /// Content similarity percentage
    pub content_similarity: f64,
    /// Score from the automatic pass
    pub auto_graded_score: u32,
    /// Reviewer score mirrored from the answer
    pub final_score: Option<u32>,
    /// Reviewer comments mirrored from the answer
    pub reviewer_comments: Option<String>,
    /// Time of the latest analysis
    pub analyzed_at: DateTime<Utc>,
}

/// Measured fields of an analysis, before persistence
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisDraft {
    /// Analysed answer
    pub answer_id: AnswerId,
    /// Weighted match percentage
    pub match_percentage: f64,
    /// Keywords found
    pub keywords_matched: usize,
    /// Keywords required
    pub total_keywords: usize,
    /// Content similarity percentage
    pub content_similarity: f64,
    /// Score from the automatic pass
    pub auto_graded_score: u32,
}

impl AnalysisDraft {
    /// Draft from a scoring analysis
    #[must_use]
    pub fn from_analysis(answer_id: AnswerId, analysis: &Analysis) -> Self {
        Self {
            answer_id,
            match_percentage: analysis.match_percentage,
            keywords_matched: analysis.keywords_matched,
            total_keywords: analysis.total_keywords,
            content_similarity: analysis.content_similarity,
            auto_graded_score: analysis.score,
        }
    }
}

/// Participant lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    /// Registered, not started
    Registered,
    /// Taking the exam
    InProgress,
    /// Submitted
    Completed,
    /// At least one answer reviewed
    Reviewed,
}

/// Exam participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant ID
    pub id: ParticipantId,
    /// Exam taken
    pub exam_id: ExamId,
    /// User behind the participation
    pub user_id: UserId,
    /// Mean effective score of graded answers, as of the last recompute
    pub score: f64,
    /// Lifecycle status
    pub status: ParticipantStatus,
    /// Last reviewer
    pub reviewed_by: Option<UserId>,
    /// Last review time
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Result of grading one essay answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeReport {
    /// Graded answer
    pub answer_id: AnswerId,
    /// Weighted match percentage
    pub match_percentage: f64,
    /// Keywords found
    pub keywords_matched: usize,
    /// Keywords required
    pub total_keywords: usize,
    /// Content similarity percentage
    pub content_similarity: f64,
    /// Automatic score
    pub score: u32,
    /// Points available
    pub max_points: u32,
    /// Authoritative analysis record
    pub analysis_id: AnalysisId,
    /// Answer status after grading
    pub status: AnswerStatus,
}

/// Human override of an answer's score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// Awarded points; must be within `[0, max_points]`
    pub score: i64,
    /// Reviewer comments
    pub reviewer_comments: Option<String>,
    /// Reviewer verdict
    pub is_correct: bool,
}

impl ReviewRequest {
    /// Create review
    #[must_use]
    pub fn new(score: i64, is_correct: bool) -> Self {
        Self {
            score,
            reviewer_comments: None,
            is_correct,
        }
    }

    /// With comments
    #[must_use]
    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.reviewer_comments = Some(comments.into());
        self
    }
}

/// Reviewer's view of a participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSheet {
    /// Participant
    pub participant: Participant,
    /// Answers, by answer ID
    pub answers: Vec<Answer>,
    /// Analysis records of those answers
    pub analyses: Vec<AnalysisRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn answer(status: AnswerStatus, auto: Option<u32>, fin: Option<u32>) -> Answer {
        Answer {
            id: AnswerId(1),
            participant_id: ParticipantId(1),
            question_id: QuestionId(1),
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
    fn effective_score_follows_status() {
        assert_eq!(answer(AnswerStatus::Ungraded, Some(3), None).effective_score(), None);
        assert_eq!(answer(AnswerStatus::AutoGraded, Some(3), None).effective_score(), Some(3));
        assert_eq!(answer(AnswerStatus::Reviewed, Some(3), Some(9)).effective_score(), Some(9));
    }

    #[test]
    fn keywords_are_normalized() {
        let raw: Vec<String> = ["  REST ", "rest", "", "Idempotent", "   ", "idempotent", "cache"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        assert_eq!(normalize_keywords(&raw), vec!["REST", "Idempotent", "cache"]);
    }

    #[test]
    fn question_validation() {
        assert!(Question::essay(QuestionId(1), ExamId(1), 0, EssayOptions::default()).is_err());

        let bad_choice = MultipleChoiceOptions {
            choices: vec!["a".into(), "b".into()],
            correct_choice: 2,
        };
        assert!(Question::multiple_choice(QuestionId(2), ExamId(1), 5, bad_choice).is_err());

        let no_choices = MultipleChoiceOptions {
            choices: vec![],
            correct_choice: 0,
        };
        assert!(Question::multiple_choice(QuestionId(2), ExamId(1), 5, no_choices).is_err());

        let coding = CodingOptions {
            coding_exercise_id: Some(7),
            language: " ".into(),
        };
        assert!(Question::coding(QuestionId(3), ExamId(1), 5, coding).is_err());
    }

    #[test]
    fn expect_kind_reports_both_kinds() {
        let q = Question::coding(
            QuestionId(3),
            ExamId(1),
            5,
            CodingOptions {
                coding_exercise_id: None,
                language: "rust".into(),
            },
        )
        .unwrap();

        assert_eq!(
            q.expect_kind("essay"),
            Err(ValidationError::WrongQuestionKind {
                question_id: QuestionId(3),
                expected: "essay",
                actual: "coding",
            })
        );
        assert!(!q.is_essay());
    }

    #[test]
    fn multiple_choice_comparison_is_lenient() {
        let opts = MultipleChoiceOptions {
            choices: vec!["Borrow checker".into(), "Garbage collector".into()],
            correct_choice: 0,
        };
        assert!(opts.is_correct("  borrow CHECKER "));
        assert!(!opts.is_correct("garbage collector"));
    }

    #[test]
    fn question_kind_serializes_tagged() {
        let q = Question::essay(QuestionId(4), ExamId(2), 10, EssayOptions::default()).unwrap();
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["kind"]["type"], "essay");

        let back: Question = serde_json::from_value(json).unwrap();
        assert_eq!(back, q);
    }
}
