//! Legal phase transitions
//!
//! The table every [`ResourceStateMachine`](crate::ResourceStateMachine)
//! phase change is checked against. `Loaded` is terminal.

use lazyload_core::{Phase, TransitionError};

/// Validates a phase transition.
///
/// `Error -> Loading` is only legal as the single fallback retry; the
/// machine, not this table, enforces that it happens at most once.
pub fn validate_transition(from: Phase, to: Phase) -> Result<(), TransitionError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(TransitionError::new(from, to))
    }
}

/// Phases reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: Phase) -> Vec<Phase> {
    use Phase::*;
    match from {
        Idle => vec![Loading],
        Loading => vec![Loaded, Error],
        Error => vec![Loading],
        Loaded => vec![],
    }
}

fn allowed(from: Phase, to: Phase) -> bool {
    allowed_transitions(from).into_iter().any(|p| p == to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn loaded_is_terminal() {
        for to in Phase::ALL {
            assert!(validate_transition(Phase::Loaded, to).is_err());
        }
    }

    #[test]
    fn idle_only_enters_loading() {
        assert!(validate_transition(Phase::Idle, Phase::Loading).is_ok());
        assert!(validate_transition(Phase::Idle, Phase::Loaded).is_err());
        assert!(validate_transition(Phase::Idle, Phase::Error).is_err());
    }

    #[test]
    fn error_retries_into_loading() {
        assert!(validate_transition(Phase::Error, Phase::Loading).is_ok());
        assert!(validate_transition(Phase::Error, Phase::Loaded).is_err());
    }

    proptest! {
        #[test]
        fn prop_validation_matches_table(
            from in prop_oneof![
                Just(Phase::Idle),
                Just(Phase::Loading),
                Just(Phase::Loaded),
                Just(Phase::Error),
            ],
            to in prop_oneof![
                Just(Phase::Idle),
                Just(Phase::Loading),
                Just(Phase::Loaded),
                Just(Phase::Error),
            ]
        ) {
            let res = validate_transition(from, to);
            let allowed = allowed_transitions(from);

            if res.is_ok() {
                prop_assert!(allowed.contains(&to));
            } else {
                prop_assert!(!allowed.contains(&to));
                prop_assert_eq!(res.unwrap_err(), TransitionError::new(from, to));
            }
        }

        #[test]
        fn prop_nothing_returns_to_idle(
            from in prop_oneof![
                Just(Phase::Idle),
                Just(Phase::Loading),
                Just(Phase::Loaded),
                Just(Phase::Error),
            ]
        ) {
            prop_assert!(validate_transition(from, Phase::Idle).is_err());
        }
    }
}
