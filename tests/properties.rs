//! Property tests for monitor invariants over arbitrary turn sequences.

use loopwatch::{ContextLabel, ConversationMonitor, Role, Topic};
use proptest::prelude::*;

/// Phrases chosen to exercise every stage family, frustration family and
/// question pattern, plus filler.
const PHRASES: &[&str] = &[
    "What specific error are you seeing?",
    "What specific error message do you see?",
    "Please provide the container number.",
    "Could you share your tracking number?",
    "I suggest you try refreshing the page.",
    "Is there anything else I can help you with?",
    "It's still not working",
    "I'm frustrated and tired of this",
    "I already told you that",
    "We are going in circles",
    "MSCU1234567",
    "ok",
    "",
    "Which carrier? Which carrier?",
    "Thanks, that resolved it!",
];

fn turn() -> impl Strategy<Value = (Role, String)> {
    (
        prop_oneof![Just(Role::User), Just(Role::Agent)],
        prop::sample::select(PHRASES).prop_map(str::to_string),
    )
}

/// Topic each label should contribute to an agent turn.
fn expected_topic(label: ContextLabel) -> Option<Topic> {
    let name = label.as_str();
    if ["tracking_issue_general", "invalid_tracking", "tracking_initial"].contains(&name) {
        Some(Topic::Tracking)
    } else if ["account_issue", "account_blocked"].contains(&name) {
        Some(Topic::Account)
    } else if name.contains("frustrated") {
        Some(Topic::CustomerFrustration)
    } else {
        None
    }
}

fn label() -> impl Strategy<Value = ContextLabel> {
    prop::sample::select(ContextLabel::all().collect::<Vec<_>>())
}

proptest! {
    #[test]
    fn loop_counter_is_monotonic_and_matches_records(
        turns in prop::collection::vec(turn(), 0..30)
    ) {
        let monitor = ConversationMonitor::default();
        let mut previous = 0;

        for (role, text) in &turns {
            let status = monitor.add_message("p", *role, text, None);
            prop_assert!(status.loops_detected >= previous);
            previous = status.loops_detected;

            let view = monitor.state("p").unwrap();
            prop_assert_eq!(
                view.conversation.state.loops_detected as usize,
                view.conversation.progress.loops.len()
            );
        }
    }

    #[test]
    fn score_stays_within_bounds(turns in prop::collection::vec(turn(), 0..30)) {
        let monitor = ConversationMonitor::default();
        for (role, text) in &turns {
            let status = monitor.add_message("p", *role, text, None);
            prop_assert!((0.0..=10.0).contains(&status.progress_score));
            prop_assert!((0.0..=100.0).contains(&status.progress_percentage));
        }
    }

    #[test]
    fn resolution_path_has_no_duplicates(turns in prop::collection::vec(turn(), 0..30)) {
        let monitor = ConversationMonitor::default();
        for (role, text) in &turns {
            let status = monitor.add_message("p", *role, text, None);
            let mut seen = Vec::new();
            for stage in &status.resolution_path {
                prop_assert!(!seen.contains(stage));
                seen.push(*stage);
            }
        }
    }

    #[test]
    fn stage_never_decreases(turns in prop::collection::vec(turn(), 0..30)) {
        let monitor = ConversationMonitor::default();
        let mut previous = None;
        for (role, text) in &turns {
            let status = monitor.add_message("p", *role, text, None);
            if let Some(stage) = previous {
                prop_assert!(status.current_stage >= stage);
            }
            previous = Some(status.current_stage);
        }
    }

    #[test]
    fn status_is_idempotent(turns in prop::collection::vec(turn(), 1..20)) {
        let monitor = ConversationMonitor::default();
        for (role, text) in &turns {
            monitor.add_message("p", *role, text, None);
        }
        let first = monitor.status("p");
        let second = monitor.status("p");
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(monitor.intervention_prompt("p"), monitor.intervention_prompt("p"));
    }

    #[test]
    fn intervention_prompt_tracks_needs_intervention(
        turns in prop::collection::vec(turn(), 1..20)
    ) {
        let monitor = ConversationMonitor::default();
        for (role, text) in &turns {
            monitor.add_message("p", *role, text, None);
        }
        let status = monitor.status("p");
        let prompt = monitor.intervention_prompt("p");
        prop_assert_eq!(status.needs_intervention, !prompt.is_empty());
    }

    #[test]
    fn context_labels_map_to_topics(labels in prop::collection::vec(label(), 1..10)) {
        let monitor = ConversationMonitor::default();
        for label in &labels {
            monitor.add_message("p", Role::Agent, "Let me check that.", Some(*label));
        }

        let view = monitor.state("p").unwrap();
        let expected: std::collections::BTreeSet<Topic> =
            labels.iter().filter_map(|l| expected_topic(*l)).collect();
        prop_assert_eq!(&view.conversation.state.topics, &expected);
    }

    #[test]
    fn every_label_parses_from_its_name(label in label()) {
        prop_assert_eq!(label.as_str().parse::<ContextLabel>().unwrap(), label);
        prop_assert_eq!(label.topic(), expected_topic(label));
    }

    #[test]
    fn user_turns_never_add_topics(label in label(), text in prop::sample::select(PHRASES)) {
        let monitor = ConversationMonitor::default();
        monitor.add_message("p", Role::User, text, Some(label));
        prop_assert!(monitor.state("p").unwrap().conversation.state.topics.is_empty());
    }
}
