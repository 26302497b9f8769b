use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::interview::schema::DomainSchema;
use crate::interview::session::{Mode, SessionState};

/// Progress figures reported to the client after every turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub percent_complete: u8,
    pub is_done: bool,
    pub completion_map: BTreeMap<String, bool>,
}

/// `percent = 100 * completed / total`, rounded down; done only once every field
/// is closed and the item was actually committed.
pub fn compute_progress(schema: &DomainSchema, state: &SessionState) -> Progress {
    let completion_map: BTreeMap<String, bool> = schema
        .fields_in_order()
        .iter()
        .map(|f| (f.name.to_string(), state.is_complete(f.name)))
        .collect();

    let total = schema.len();
    let completed = completion_map.values().filter(|done| **done).count();
    let percent_complete = if total == 0 {
        0
    } else {
        (completed * 100 / total) as u8
    };

    Progress {
        percent_complete,
        is_done: state.all_complete(schema) && state.mode == Mode::Submitted,
        completion_map,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::domains::Domain;
    use crate::interview::schema::RetryPolicy;

    #[test]
    fn test_fresh_state_is_zero_percent() {
        let schema = Domain::Experience.schema(RetryPolicy::default());
        let progress = compute_progress(&schema, &SessionState::new(&schema));
        assert_eq!(progress.percent_complete, 0);
        assert!(!progress.is_done);
        assert_eq!(progress.completion_map.len(), 11);
    }

    #[test]
    fn test_percent_rounds_down() {
        let schema = Domain::Experience.schema(RetryPolicy::default());
        let mut state = SessionState::new(&schema);
        state.mark_complete("title");
        // 1 / 11 = 9.09%
        assert_eq!(compute_progress(&schema, &state).percent_complete, 9);
    }

    #[test]
    fn test_all_complete_but_uncommitted_is_not_done() {
        let schema = Domain::Skills.schema(RetryPolicy::default());
        let mut state = SessionState::new(&schema);
        for f in schema.fields_in_order() {
            state.mark_complete(f.name);
        }
        state.mode = Mode::AwaitingConfirmation;
        let progress = compute_progress(&schema, &state);
        assert_eq!(progress.percent_complete, 100);
        assert!(!progress.is_done);

        state.mode = Mode::Submitted;
        assert!(compute_progress(&schema, &state).is_done);
    }

    #[test]
    fn test_fields_outside_schema_are_ignored() {
        let schema = Domain::Skills.schema(RetryPolicy::default());
        let mut state = SessionState::new(&schema);
        state.mark_complete("legacy_field");
        let progress = compute_progress(&schema, &state);
        assert_eq!(progress.percent_complete, 0);
        assert!(!progress.completion_map.contains_key("legacy_field"));
    }
}
