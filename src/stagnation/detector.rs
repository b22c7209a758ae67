//! Agent-side loop detection over the recent turn window.

use super::types::{LoopKind, LoopRecord};
use crate::config::MonitorConfig;
use crate::conversation::{Conversation, Role};
use crate::similarity::similar;
use tracing::warn;

/// Scans recent turns for repeated agent phrasing and repeated questions.
///
/// The two checks are independent and both may fire on the same call.
/// Repetition fires once per qualifying pair of agent messages, while
/// repeated requests fire at most once per scan.
#[derive(Debug, Clone)]
pub struct LoopDetector {
    repetition_threshold: f64,
    repetition_window: usize,
    repeated_ask_window: usize,
}

impl LoopDetector {
    /// Creates a detector from the monitor configuration.
    #[must_use]
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            repetition_threshold: config.similarity.repetition_threshold,
            repetition_window: config.windows.repetition_window,
            repeated_ask_window: config.windows.repeated_ask_window,
        }
    }

    /// Runs both checks and records every detection on the conversation.
    ///
    /// Returns the number of loops recorded by this call.
    pub fn scan(&self, conversation: &mut Conversation) -> usize {
        let index = conversation.state.last_index();
        let mut records = self.agent_repetitions(conversation, index);
        records.extend(self.repeated_requests(conversation, index));

        let found = records.len();
        for record in records {
            warn!(
                kind = %record.kind,
                message_index = record.message_index,
                "Conversation loop detected"
            );
            conversation.record_loop(record);
        }
        found
    }

    fn agent_repetitions(&self, conversation: &Conversation, index: usize) -> Vec<LoopRecord> {
        let messages = &conversation.state.messages;
        let start = messages.len().saturating_sub(self.repetition_window);
        let agent_texts: Vec<&str> = messages[start..]
            .iter()
            .filter(|m| m.role == Role::Agent)
            .map(|m| m.text.as_str())
            .collect();

        let mut records = Vec::new();
        for (i, first) in agent_texts.iter().enumerate() {
            for second in &agent_texts[i + 1..] {
                if similar(first, second, self.repetition_threshold) {
                    records.push(LoopRecord::new(
                        LoopKind::AgentRepetition,
                        index,
                        vec![first.to_string(), second.to_string()],
                    ));
                }
            }
        }
        records
    }

    fn repeated_requests(&self, conversation: &Conversation, index: usize) -> Option<LoopRecord> {
        let asks = &conversation.state.agent_asks;
        let recent = &asks[asks.len().saturating_sub(self.repeated_ask_window)..];
        if recent.len() < 2 {
            return None;
        }

        // Repeated questions in order of first appearance.
        let mut repeated: Vec<String> = Vec::new();
        for (i, ask) in recent.iter().enumerate() {
            if recent[..i].contains(ask) && !repeated.contains(ask) {
                repeated.push(ask.clone());
            }
        }

        if repeated.is_empty() {
            None
        } else {
            Some(LoopRecord::new(LoopKind::RepeatedRequests, index, repeated))
        }
    }
}

impl Default for LoopDetector {
    fn default() -> Self {
        Self::new(&MonitorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation_with(turns: &[(Role, &str)]) -> Conversation {
        let mut conversation = Conversation::new();
        for (role, text) in turns {
            conversation.push_message(*role, *text);
        }
        conversation
    }

    #[test]
    fn test_detects_agent_repetition_once_per_pair() {
        let mut conversation = conversation_with(&[
            (Role::User, "My shipment is missing"),
            (Role::Agent, "What specific error are you seeing?"),
            (Role::User, "None, it just doesn't show"),
            (Role::Agent, "What specific error message do you see?"),
        ]);

        let found = LoopDetector::default().scan(&mut conversation);
        assert_eq!(found, 1);
        assert_eq!(conversation.state.loops_detected, 1);

        let record = &conversation.progress.loops[0];
        assert_eq!(record.kind, LoopKind::AgentRepetition);
        assert_eq!(record.message_index, 3);
        assert_eq!(record.evidence.len(), 2);
    }

    #[test]
    fn test_repetition_counts_every_pair() {
        let mut conversation = conversation_with(&[
            (Role::Agent, "Please share your tracking number."),
            (Role::User, "ok"),
            (Role::Agent, "Please share your tracking number."),
            (Role::User, "fine"),
            (Role::Agent, "Please share your tracking number."),
        ]);

        // Three agent messages, three similar pairs.
        assert_eq!(LoopDetector::default().scan(&mut conversation), 3);
        assert_eq!(conversation.state.loops_detected, 3);
    }

    #[test]
    fn test_repetition_window_excludes_old_messages() {
        let mut conversation = conversation_with(&[
            (Role::Agent, "Please share your tracking number."),
            (Role::User, "a"),
            (Role::Agent, "Thanks, one moment."),
            (Role::User, "b"),
            (Role::Agent, "The vessel departed on Monday."),
            (Role::User, "c"),
            (Role::Agent, "Please share your tracking number."),
        ]);

        assert_eq!(LoopDetector::default().scan(&mut conversation), 0);
    }

    #[test]
    fn test_repeated_requests_fires_once() {
        let mut conversation = conversation_with(&[(Role::Agent, "x")]);
        conversation.state.agent_asks = vec![
            "What is your email?".to_string(),
            "What is the carrier?".to_string(),
            "What is your email?".to_string(),
            "What is the carrier?".to_string(),
        ];

        assert_eq!(LoopDetector::default().scan(&mut conversation), 1);
        let record = &conversation.progress.loops[0];
        assert_eq!(record.kind, LoopKind::RepeatedRequests);
        assert_eq!(
            record.evidence,
            vec!["What is your email?".to_string(), "What is the carrier?".to_string()]
        );
    }

    #[test]
    fn test_repeated_requests_only_looks_at_recent_asks() {
        let mut conversation = conversation_with(&[(Role::Agent, "x")]);
        conversation.state.agent_asks = vec![
            "What is your email?".to_string(),
            "Which port?".to_string(),
            "What is the carrier?".to_string(),
            "When did it ship?".to_string(),
            "What is your email?".to_string(),
        ];

        assert_eq!(LoopDetector::default().scan(&mut conversation), 0);
    }

    #[test]
    fn test_no_loops_in_distinct_conversation() {
        let mut conversation = conversation_with(&[
            (Role::User, "Hi"),
            (Role::Agent, "Hello! How can I help today?"),
            (Role::User, "Where is my container?"),
            (Role::Agent, "Please provide the container number."),
        ]);
        conversation.state.agent_asks = vec!["How can I help today?".to_string()];

        assert_eq!(LoopDetector::default().scan(&mut conversation), 0);
        assert!(conversation.progress.loops.is_empty());
    }
}
