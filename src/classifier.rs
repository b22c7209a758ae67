//! Turn classification.
//!
//! Agent turns contribute questions, topics and stage signals. User turns are
//! matched against recent agent questions and checked for frustration.

use crate::config::MonitorConfig;
use crate::conversation::{
    ContextLabel, Conversation, ProvidedAnswer, Role, Stage, StageTransitions,
};
use crate::similarity::similar;
use crate::stagnation::{FrustrationDetector, FrustrationIndicator, LoopKind, LoopRecord};
use regex::Regex;
use tracing::{debug, info, warn};

/// What a single turn contributed, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnAnalysis {
    /// Questions extracted from an agent turn.
    pub questions: Vec<String>,
    /// Stage signalled by an agent turn.
    pub stage_signal: Option<Stage>,
    /// Number of answer pairs recorded for a user turn.
    pub answers_recorded: usize,
    /// Frustration indicator found in a user turn.
    pub frustration: Option<FrustrationIndicator>,
}

/// Classifies turns and applies their effects to a conversation.
#[derive(Debug)]
pub struct TurnClassifier {
    question_patterns: Vec<Regex>,
    transitions: StageTransitions,
    frustration: FrustrationDetector,
    answer_threshold: f64,
    answer_lookback: usize,
    max_score: f64,
}

impl TurnClassifier {
    /// Creates a classifier from the monitor configuration.
    #[must_use]
    pub fn new(config: &MonitorConfig) -> Self {
        let question_patterns = [
            r"(?i)(what|which|where|when|how|why|can you|could you|please tell)[^.!?]+\?",
            r"[^.!?]+\?",
        ]
        .into_iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect();

        Self {
            question_patterns,
            transitions: StageTransitions::new(),
            frustration: FrustrationDetector::new(),
            answer_threshold: config.similarity.answer_threshold,
            answer_lookback: config.windows.answer_lookback,
            max_score: config.scoring.max_score,
        }
    }

    /// Applies the effects of the most recent turn, which must already have
    /// been pushed onto the conversation.
    pub fn classify(
        &self,
        conversation: &mut Conversation,
        role: Role,
        text: &str,
        context: Option<ContextLabel>,
    ) -> TurnAnalysis {
        match role {
            Role::Agent => self.classify_agent(conversation, text, context),
            Role::User => self.classify_user(conversation, text),
        }
    }

    /// Extracts questions with both pattern families and appends every
    /// match, duplicates included.
    ///
    /// The interrogative family contributes its leading word (`What`,
    /// `could you`, ...) and the catch-all family contributes each whole
    /// clause ending in `?`. A single interrogative question therefore
    /// yields two entries, and two questions opening with the same word
    /// share one of them.
    #[must_use]
    pub fn extract_questions(&self, text: &str) -> Vec<String> {
        let mut questions = Vec::new();

        for re in &self.question_patterns {
            for caps in re.captures_iter(text) {
                let Some(m) = caps.get(1).or_else(|| caps.get(0)) else {
                    continue;
                };
                let question = m.as_str().trim();
                if !question.is_empty() {
                    questions.push(question.to_string());
                }
            }
        }

        questions
    }

    fn classify_agent(
        &self,
        conversation: &mut Conversation,
        text: &str,
        context: Option<ContextLabel>,
    ) -> TurnAnalysis {
        let questions = self.extract_questions(text);
        conversation
            .state
            .agent_asks
            .extend(questions.iter().cloned());

        if let Some(topic) = context.and_then(|label| label.topic()) {
            conversation.state.topics.insert(topic);
        }

        let stage_signal = self.transitions.detect(text);
        if let Some(signalled) = stage_signal {
            let change = conversation.signal_stage(signalled);
            if change.newly_entered {
                let increment = signalled.milestone().map_or(0.0, |m| m.weight());
                let score = conversation.state.progress_score + increment;
                conversation.state.progress_score = score.clamp(0.0, self.max_score);
            }
            if change.to != change.from {
                info!(from = %change.from, to = %change.to, "Stage advanced");
            }
        }

        debug!(
            questions = questions.len(),
            stage_signal = ?stage_signal,
            "Classified agent turn"
        );

        TurnAnalysis {
            questions,
            stage_signal,
            ..TurnAnalysis::default()
        }
    }

    fn classify_user(&self, conversation: &mut Conversation, text: &str) -> TurnAnalysis {
        let asks = &conversation.state.agent_asks;
        let recent: Vec<String> = asks[asks.len().saturating_sub(self.answer_lookback)..].to_vec();

        // When the reply resembles any recent question, every recent question
        // is recorded as answered by it.
        let mut answers_recorded = 0;
        if recent
            .iter()
            .any(|ask| similar(ask, text, self.answer_threshold))
        {
            for asked in recent {
                conversation.state.user_provides.push(ProvidedAnswer {
                    asked,
                    provided: text.to_string(),
                });
                answers_recorded += 1;
            }
        }

        let frustration = self.frustration.detect(text);
        if let Some(indicator) = frustration {
            let index = conversation.state.last_index();
            warn!(%indicator, message_index = index, "User frustration detected");
            conversation.record_loop(LoopRecord::new(
                LoopKind::Frustration { indicator },
                index,
                vec![text.to_string()],
            ));
        }

        debug!(answers_recorded, frustration = ?frustration, "Classified user turn");

        TurnAnalysis {
            answers_recorded,
            frustration,
            ..TurnAnalysis::default()
        }
    }
}

impl Default for TurnClassifier {
    fn default() -> Self {
        Self::new(&MonitorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Topic;

    fn apply(
        classifier: &TurnClassifier,
        conversation: &mut Conversation,
        role: Role,
        text: &str,
        context: Option<ContextLabel>,
    ) -> TurnAnalysis {
        conversation.push_message(role, text);
        classifier.classify(conversation, role, text, context)
    }

    #[test]
    fn test_extract_questions_both_families() {
        let classifier = TurnClassifier::default();
        let questions =
            classifier.extract_questions("Thanks. What is your tracking number? Is it urgent?");
        assert_eq!(
            questions,
            vec![
                "What".to_string(),
                "What is your tracking number?".to_string(),
                "Is it urgent?".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_questions_interrogative_yields_lead_and_clause() {
        let classifier = TurnClassifier::default();
        assert_eq!(
            classifier.extract_questions("Okay, what is your email?"),
            vec!["what".to_string(), "Okay, what is your email?".to_string()]
        );
        assert_eq!(
            classifier.extract_questions("What is your tracking number?"),
            vec!["What".to_string(), "What is your tracking number?".to_string()]
        );
    }

    #[test]
    fn test_extract_questions_keeps_repeats_within_message() {
        let classifier = TurnClassifier::default();
        let questions = classifier.extract_questions("Which port? Sorry, which port?");
        assert_eq!(
            questions,
            vec![
                "Which".to_string(),
                "which".to_string(),
                "Which port?".to_string(),
                "Sorry, which port?".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_questions_none() {
        let classifier = TurnClassifier::default();
        assert!(classifier.extract_questions("I will check that now.").is_empty());
        assert!(classifier.extract_questions("").is_empty());
    }

    #[test]
    fn test_agent_turn_records_questions_and_stage() {
        let classifier = TurnClassifier::default();
        let mut conversation = Conversation::new();
        let analysis = apply(
            &classifier,
            &mut conversation,
            Role::Agent,
            "What specific error are you seeing?",
            None,
        );

        assert_eq!(analysis.stage_signal, Some(Stage::IssueIdentification));
        assert_eq!(
            conversation.state.agent_asks,
            vec![
                "What".to_string(),
                "What specific error are you seeing?".to_string(),
            ]
        );
        assert_eq!(conversation.state.stage, Stage::IssueIdentification);
        assert!(conversation.progress.identified_issue);
        assert_eq!(conversation.state.progress_score, 1.0);
    }

    #[test]
    fn test_stage_increment_applies_once_per_stage() {
        let classifier = TurnClassifier::default();
        let mut conversation = Conversation::new();
        apply(&classifier, &mut conversation, Role::Agent, "Try clearing the cache.", None);
        apply(&classifier, &mut conversation, Role::Agent, "You can also try again later.", None);

        assert_eq!(conversation.state.stage, Stage::SolutionProposal);
        assert_eq!(conversation.state.resolution_path, vec![Stage::SolutionProposal]);
        assert_eq!(conversation.state.progress_score, 2.0);
    }

    #[test]
    fn test_context_maps_to_topic() {
        let classifier = TurnClassifier::default();
        let mut conversation = Conversation::new();
        apply(
            &classifier,
            &mut conversation,
            Role::Agent,
            "Let me look into that.",
            Some(ContextLabel::InvalidTracking),
        );
        apply(
            &classifier,
            &mut conversation,
            Role::Agent,
            "I understand.",
            Some(ContextLabel::TrackingIssueFrustrated),
        );
        apply(
            &classifier,
            &mut conversation,
            Role::Agent,
            "Noted.",
            Some(ContextLabel::PortCongestion),
        );

        let topics: Vec<Topic> = conversation.state.topics.iter().copied().collect();
        assert_eq!(topics, vec![Topic::Tracking, Topic::CustomerFrustration]);
    }

    #[test]
    fn test_user_context_is_ignored() {
        let classifier = TurnClassifier::default();
        let mut conversation = Conversation::new();
        apply(
            &classifier,
            &mut conversation,
            Role::User,
            "hello",
            Some(ContextLabel::AccountIssue),
        );
        assert!(conversation.state.topics.is_empty());
    }

    #[test]
    fn test_user_reply_records_every_recent_question() {
        let classifier = TurnClassifier::default();
        let mut conversation = Conversation::new();
        apply(
            &classifier,
            &mut conversation,
            Role::Agent,
            "What is your container number?",
            None,
        );
        let analysis = apply(
            &classifier,
            &mut conversation,
            Role::User,
            "My container number is MSCU1234567",
            None,
        );

        // Both extracted entries are recent, so both are recorded.
        assert_eq!(analysis.answers_recorded, 2);
        assert_eq!(conversation.state.user_provides.len(), 2);
        assert_eq!(conversation.state.user_provides[0].asked, "What");
        assert_eq!(
            conversation.state.user_provides[1].asked,
            "What is your container number?"
        );
    }

    #[test]
    fn test_unrelated_user_reply_records_nothing() {
        let classifier = TurnClassifier::default();
        let mut conversation = Conversation::new();
        apply(
            &classifier,
            &mut conversation,
            Role::Agent,
            "What is your container number?",
            None,
        );
        let analysis = apply(&classifier, &mut conversation, Role::User, "ok", None);
        assert_eq!(analysis.answers_recorded, 0);
        assert!(conversation.state.user_provides.is_empty());
    }

    #[test]
    fn test_frustration_records_single_loop() {
        let classifier = TurnClassifier::default();
        let mut conversation = Conversation::new();
        apply(&classifier, &mut conversation, Role::User, "Hi", None);
        let analysis = apply(
            &classifier,
            &mut conversation,
            Role::User,
            "I'm frustrated, this is going in circles",
            None,
        );

        assert_eq!(analysis.frustration, Some(FrustrationIndicator::EmotionalDistress));
        assert_eq!(conversation.state.loops_detected, 1);
        let record = &conversation.progress.loops[0];
        assert_eq!(record.message_index, 1);
        assert_eq!(record.evidence, vec!["I'm frustrated, this is going in circles"]);
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        let classifier = TurnClassifier::default();
        let mut conversation = Conversation::new();
        let agent = apply(&classifier, &mut conversation, Role::Agent, "", None);
        let user = apply(&classifier, &mut conversation, Role::User, "", None);
        assert_eq!(agent, TurnAnalysis::default());
        assert_eq!(user, TurnAnalysis::default());
        assert_eq!(conversation.state.loops_detected, 0);
    }
}
