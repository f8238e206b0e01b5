//! Answer grading state machine
//!
//! `Ungraded → AutoGraded → Reviewed`. Re-grading keeps an answer where it
//! is, and a reviewed answer never falls back to `AutoGraded`. Coding answers
//! skip the automatic pass and go straight to `Reviewed`.

use crate::types::AnswerStatus;

/// Illegal status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal answer transition {from:?} -> {to:?}")]
pub struct IllegalTransition {
    /// Current status
    pub from: AnswerStatus,
    /// Requested status
    pub to: AnswerStatus,
}

/// Statuses reachable from `from`
#[must_use]
pub fn allowed_transitions(from: AnswerStatus) -> Vec<AnswerStatus> {
    match from {
        AnswerStatus::Ungraded | AnswerStatus::AutoGraded => {
            vec![AnswerStatus::AutoGraded, AnswerStatus::Reviewed]
        }
        AnswerStatus::Reviewed => vec![AnswerStatus::Reviewed],
    }
}

/// Validate a status change
///
/// # Errors
/// - `IllegalTransition` if `to` is not reachable from `from`
pub fn validate_transition(from: AnswerStatus, to: AnswerStatus) -> Result<(), IllegalTransition> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(IllegalTransition { from, to })
    }
}

/// Status after an automatic grading pass
///
/// Reviewed answers stay reviewed; everything else becomes `AutoGraded`.
#[must_use]
pub fn after_auto_grade(current: AnswerStatus) -> AnswerStatus {
    match validate_transition(current, AnswerStatus::AutoGraded) {
        Ok(()) => AnswerStatus::AutoGraded,
        Err(_) => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn forward_transitions() {
        assert!(validate_transition(AnswerStatus::Ungraded, AnswerStatus::AutoGraded).is_ok());
        assert!(validate_transition(AnswerStatus::AutoGraded, AnswerStatus::Reviewed).is_ok());
        assert!(validate_transition(AnswerStatus::Ungraded, AnswerStatus::Reviewed).is_ok());
    }

    #[test]
    fn no_regression() {
        assert!(validate_transition(AnswerStatus::Reviewed, AnswerStatus::AutoGraded).is_err());
        assert!(validate_transition(AnswerStatus::Reviewed, AnswerStatus::Ungraded).is_err());
        assert!(validate_transition(AnswerStatus::AutoGraded, AnswerStatus::Ungraded).is_err());
    }

    #[test]
    fn auto_grade_keeps_reviewed() {
        assert_eq!(after_auto_grade(AnswerStatus::Ungraded), AnswerStatus::AutoGraded);
        assert_eq!(after_auto_grade(AnswerStatus::AutoGraded), AnswerStatus::AutoGraded);
        assert_eq!(after_auto_grade(AnswerStatus::Reviewed), AnswerStatus::Reviewed);
    }

    fn any_status() -> impl Strategy<Value = AnswerStatus> {
        prop_oneof![
            Just(AnswerStatus::Ungraded),
            Just(AnswerStatus::AutoGraded),
            Just(AnswerStatus::Reviewed),
        ]
    }

    proptest! {
        #[test]
        fn prop_validation_agrees_with_allowed(from in any_status(), to in any_status()) {
            let res = validate_transition(from, to);
            prop_assert_eq!(res.is_ok(), allowed_transitions(from).contains(&to));
        }

        #[test]
        fn prop_reviewed_is_terminal(to in any_status()) {
            if to != AnswerStatus::Reviewed {
                prop_assert!(validate_transition(AnswerStatus::Reviewed, to).is_err());
            }
        }
    }
}
