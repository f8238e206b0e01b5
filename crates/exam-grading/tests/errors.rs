//! Error taxonomy at the service surface.

use exam_grading::{
    AnswerId, AnswerStatus, EssayOptions, ErrorKind, GradingConfig, GradingError, GradingService,
    GradingStore, MemoryStore, Participant, ParticipantId, ParticipantStatus, Question, QuestionId,
    ReviewRequest, ScoringConfig, ValidationError,
};
use exam_scoring::{PolicyRegistry, ScoreCombiner, ScoringPolicy, STANDARD_POLICY};
use exam_test_utils::{
    choice_question, coding_question, essay_question, rest_template, seeded, FaultyStore,
    CHOICE_QUESTION, ESSAY_QUESTION, EXAM, REVIEWER, STUDENT,
};
use std::sync::Arc;

#[tokio::test]
async fn unknown_entities_are_not_found() {
    let s = seeded().await;

    let err = s
        .service
        .review_answer(AnswerId(404), ReviewRequest::new(1, true), REVIEWER)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AnswerNotFound);

    let err = s
        .service
        .grade_essay(EXAM, ParticipantId(404), ESSAY_QUESTION, "REST")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParticipantNotFound);

    let err = s
        .service
        .grade_essay(EXAM, s.participant.id, QuestionId(404), "REST")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QuestionNotFound);

    for err in [
        GradingError::AnswerNotFound(AnswerId(1)),
        GradingError::ParticipantNotFound(ParticipantId(1)),
    ] {
        assert!(!err.is_retryable());
    }
}

/// Grading an essay question nobody authored a template for.
#[tokio::test]
async fn grading_without_template_fails() {
    let s = seeded().await;
    let bare = Question::essay(QuestionId(30), EXAM, 5, EssayOptions::default()).unwrap();
    s.service.add_question(bare).await.unwrap();

    let err = s
        .service
        .grade_essay(EXAM, s.participant.id, QuestionId(30), "REST")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GradingError::TemplateNotFound { question_id: QuestionId(30), .. }
    ));
    assert_eq!(s.store.answer_count(), 0);
}

#[tokio::test]
async fn review_score_must_fit_question() {
    let s = seeded().await;
    let report = s
        .service
        .grade_essay(EXAM, s.participant.id, ESSAY_QUESTION, "REST")
        .await
        .unwrap();

    for bad in [-1, 11, i64::MAX] {
        let err = s
            .service
            .review_answer(report.answer_id, ReviewRequest::new(bad, false), REVIEWER)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GradingError::Validation(ValidationError::ScoreOutOfRange { max_points: 10, .. })
        ));
    }

    assert!(s
        .service
        .review_answer(report.answer_id, ReviewRequest::new(10, true), REVIEWER)
        .await
        .is_ok());
}

#[tokio::test]
async fn operations_check_question_kind() {
    let s = seeded().await;

    let err = s
        .service
        .grade_essay(EXAM, s.participant.id, CHOICE_QUESTION, "GET")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GradingError::Validation(ValidationError::WrongQuestionKind { .. })
    ));

    let essay = s
        .service
        .submit_answer(s.participant.id, ESSAY_QUESTION, "REST")
        .await
        .unwrap();
    let err = s.service.grade_objective(essay.id).await.unwrap_err();
    assert!(matches!(
        err,
        GradingError::Validation(ValidationError::WrongQuestionKind {
            expected: "multiple_choice",
            actual: "essay",
            ..
        })
    ));
}

struct Flaky {
    service: GradingService,
    memory: Arc<MemoryStore>,
    faulty: Arc<FaultyStore>,
    participant: Participant,
}

async fn flaky() -> Flaky {
    let memory = Arc::new(MemoryStore::new());
    for question in [essay_question(), choice_question(), coding_question()] {
        memory.put_question(question).await.unwrap();
    }
    let participant = memory.insert_participant(EXAM, STUDENT).await.unwrap();

    let faulty = Arc::new(FaultyStore::new(memory.clone()));
    let service = GradingService::new(faulty.clone(), GradingConfig::default()).unwrap();
    service.upsert_template(rest_template()).await.unwrap();
    Flaky {
        service,
        memory,
        faulty,
        participant,
    }
}

/// Injected store failures are retryable and a retry converges.
#[tokio::test]
async fn transient_failures_can_be_retried() {
    let Flaky {
        service,
        memory,
        faulty,
        participant,
    } = flaky().await;

    faulty.fail_next(3);
    let mut attempts = 0;
    let report = loop {
        attempts += 1;
        match service
            .grade_essay(EXAM, participant.id, ESSAY_QUESTION, "rest endpoints should be idempotent")
            .await
        {
            Ok(report) => break report,
            Err(e) if e.is_retryable() && attempts < 5 => continue,
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    };

    assert_eq!(attempts, 4);
    assert_eq!(report.score, 8);
    assert_eq!(memory.answer_count(), 1);
    assert_eq!(service.participant(participant.id).await.unwrap().score, 8.0);
}

/// The review lands with its analysis mirror; a failed aggregate update is
/// caught up by repeating the review.
#[tokio::test]
async fn review_retry_brings_aggregate_up_to_date() {
    let f = flaky().await;
    let report = f
        .service
        .grade_essay(EXAM, f.participant.id, ESSAY_QUESTION, "rest endpoints should be idempotent")
        .await
        .unwrap();

    f.faulty.fail_method("save_participant", 1);
    let request = ReviewRequest::new(2, false).with_comments("misses the retry argument");
    let err = f
        .service
        .review_answer(report.answer_id, request.clone(), REVIEWER)
        .await
        .unwrap_err();
    assert!(err.is_retryable());

    let answer = f.memory.answer(report.answer_id).await.unwrap().unwrap();
    let analysis = f.memory.analysis_for_answer(report.answer_id).await.unwrap().unwrap();
    assert_eq!(answer.status, AnswerStatus::Reviewed);
    assert_eq!(answer.final_score, Some(2));
    assert_eq!(analysis.final_score, Some(2));
    assert_eq!(analysis.reviewer_comments, answer.reviewer_comments);

    f.service
        .review_answer(report.answer_id, request, REVIEWER)
        .await
        .unwrap();
    let participant = f.service.participant(f.participant.id).await.unwrap();
    assert_eq!(participant.score, 2.0);
    assert_eq!(participant.status, ParticipantStatus::Reviewed);
}

/// A review whose write fails leaves neither the answer nor its analysis
/// changed.
#[tokio::test]
async fn failed_review_write_changes_nothing() {
    let f = flaky().await;
    let report = f
        .service
        .grade_essay(EXAM, f.participant.id, ESSAY_QUESTION, "rest endpoints should be idempotent")
        .await
        .unwrap();

    f.faulty.fail_method("save_reviewed", 1);
    let err = f
        .service
        .review_answer(report.answer_id, ReviewRequest::new(2, false), REVIEWER)
        .await
        .unwrap_err();
    assert!(err.is_retryable());

    let answer = f.memory.answer(report.answer_id).await.unwrap().unwrap();
    let analysis = f.memory.analysis_for_answer(report.answer_id).await.unwrap().unwrap();
    assert_eq!(answer.status, AnswerStatus::AutoGraded);
    assert_eq!(answer.final_score, None);
    assert_eq!(analysis.final_score, None);
    assert_eq!(f.service.participant(f.participant.id).await.unwrap().score, 8.0);
}

/// A grade whose write fails saves no analysis; the retry completes it.
#[tokio::test]
async fn failed_grade_write_is_retried_whole() {
    let f = flaky().await;

    f.faulty.fail_method("save_graded", 1);
    let err = f
        .service
        .grade_essay(EXAM, f.participant.id, ESSAY_QUESTION, "rest endpoints should be idempotent")
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(f.memory.analysis_count(), 0);
    let sheet = f.service.participant_sheet(f.participant.id).await.unwrap();
    assert_eq!(sheet.answers[0].status, AnswerStatus::Ungraded);
    assert_eq!(sheet.participant.score, 0.0);

    let report = f
        .service
        .grade_essay(EXAM, f.participant.id, ESSAY_QUESTION, "rest endpoints should be idempotent")
        .await
        .unwrap();
    assert_eq!(report.score, 8);
    assert_eq!(f.memory.answer_count(), 1);
    assert_eq!(f.memory.analysis_count(), 1);
    assert_eq!(f.service.participant(f.participant.id).await.unwrap().score, 8.0);
}

#[test]
fn invalid_configuration_is_rejected() {
    let scoring = ScoringConfig {
        keyword_weight: 0.7,
        content_weight: 0.7,
        ..ScoringConfig::default()
    };
    let err = GradingService::new(
        Arc::new(MemoryStore::new()),
        GradingConfig::default().with_scoring(scoring),
    )
    .unwrap_err();
    assert!(matches!(err, ValidationError::InvalidScoring(_)));
}

#[tokio::test]
async fn policies_are_selected_by_name() {
    let store = Arc::new(MemoryStore::new());

    let err = GradingService::from_registry(
        store.clone(),
        GradingConfig::default(),
        &PolicyRegistry::with_defaults(),
        "lenient",
    )
    .unwrap_err();
    assert_eq!(err, ValidationError::UnknownPolicy("lenient".into()));

    let mut registry = PolicyRegistry::with_defaults();
    registry.register(
        "lenient",
        ScoringPolicy::standard().with_combiner(ScoreCombiner::new(0.5, 0.5, 1.0).unwrap()),
    );
    assert!(registry.contains(STANDARD_POLICY));

    let service =
        GradingService::from_registry(store, GradingConfig::default(), &registry, "lenient")
            .unwrap();
    service.add_question(essay_question()).await.unwrap();
    service.upsert_template(rest_template()).await.unwrap();
    let participant = service.register_participant(EXAM, STUDENT).await.unwrap();

    // keywords 50%, content 50%: match 50 below 60, no below-threshold cut
    let report = service
        .grade_essay(EXAM, participant.id, ESSAY_QUESTION, "idempotent clients retry requests")
        .await
        .unwrap();
    assert_eq!(report.match_percentage, 50.0);
    assert_eq!(report.score, 8);
}
