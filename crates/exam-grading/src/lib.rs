//! Exam essay grading and review
//!
//! Orchestrates the scoring algorithms of `exam_scoring` against persisted
//! state:
//! - [`TemplateCatalog`]: cached answer templates, authored per essay question
//! - [`AutoGrader`]: provisional scores and their persisted analysis
//! - [`ReviewCoordinator`]: human overrides of those scores
//! - [`AggregateUpdater`]: participant scores kept in step with their answers
//!
//! [`GradingService`] wires them around a [`GradingStore`]. Writes to one
//! answer, and recomputes of one participant, are serialized behind bounded
//! keyed locks; unrelated answers and participants proceed in parallel.
//!
//! # Example
//!
//! ```rust
//! use exam_grading::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), GradingError> {
//! let service = GradingService::new(Arc::new(MemoryStore::new()), GradingConfig::default())?;
//!
//! let question = Question::essay(QuestionId(1), ExamId(1), 10, EssayOptions::default())?;
//! service.add_question(question).await?;
//! service
//!     .upsert_template(
//!         TemplateDraft::new(ExamId(1), QuestionId(1), "Idempotent REST endpoints are safe to retry")
//!             .with_keywords(["REST", "idempotent"]),
//!     )
//!     .await?;
//!
//! let participant = service.register_participant(ExamId(1), UserId(7)).await?;
//! let report = service
//!     .grade_essay(ExamId(1), participant.id, QuestionId(1), "REST APIs should be idempotent for safety.")
//!     .await?;
//! assert_eq!(report.keywords_matched, 2);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod error;
pub mod grader;
pub mod review;
pub mod service;
pub mod state;
pub mod store;
pub mod types;

mod context;
mod locks;

pub use aggregate::{aggregate_score, AggregateUpdater, RecomputeTrigger};
pub use catalog::TemplateCatalog;
pub use config::{GradingConfig, ScoringConfig};
pub use error::{ConfigError, ErrorKind, GradingError, StoreError, ValidationError};
pub use grader::AutoGrader;
pub use review::ReviewCoordinator;
pub use service::GradingService;
pub use state::{after_auto_grade, allowed_transitions, validate_transition, IllegalTransition};
pub use store::{GradingStore, MemoryStore};
pub use types::{
    normalize_keywords, AnalysisDraft, AnalysisId, AnalysisRecord, Answer, AnswerId, AnswerSlot,
    AnswerStatus, AnswerTemplate, CodingOptions, EssayOptions, ExamId, GradeReport,
    MultipleChoiceOptions, NewAnswer, Participant, ParticipantId, ParticipantSheet,
    ParticipantStatus, Question, QuestionId, QuestionKind, ReviewRequest, TemplateDraft,
    TemplateId, UserId,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the grading service
    pub use crate::{
        Answer, AnswerId, AnswerStatus, EssayOptions, ExamId, GradeReport, GradingConfig,
        GradingError, GradingService, GradingStore, MemoryStore, Participant, ParticipantId,
        Question, QuestionId, ReviewRequest, TemplateDraft, UserId,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
