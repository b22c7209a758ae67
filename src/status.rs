//! Status snapshots and intervention prompts.

use crate::config::MonitorConfig;
use crate::conversation::{Conversation, Stage};
use crate::guidance::{Guidance, GuidanceGenerator};
use serde::{Deserialize, Serialize};

/// Point-in-time view of a conversation, returned after every turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub conversation_id: String,
    pub message_count: usize,
    pub current_stage: Stage,
    pub progress_score: f64,
    /// `progress_score * 10`.
    pub progress_percentage: f64,
    pub loops_detected: u32,
    pub needs_intervention: bool,
    pub resolution_path: Vec<Stage>,
    pub guidance: Guidance,
}

impl StatusSnapshot {
    /// One-line summary for logs and terminal output.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "stage={} score={}/10 loops={} messages={}{}",
            self.current_stage,
            self.progress_score,
            self.loops_detected,
            self.message_count,
            if self.needs_intervention {
                " [intervention]"
            } else {
                ""
            }
        )
    }
}

/// Builds snapshots and intervention prompts from conversation state.
#[derive(Debug, Clone)]
pub struct StatusReporter {
    guidance: GuidanceGenerator,
    loop_threshold: u32,
    low_score_threshold: f64,
    low_score_min_messages: usize,
}

impl StatusReporter {
    /// Creates a reporter from the monitor configuration.
    #[must_use]
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            guidance: GuidanceGenerator::new(config),
            loop_threshold: config.intervention.loop_threshold,
            low_score_threshold: config.intervention.low_score_threshold,
            low_score_min_messages: config.intervention.low_score_min_messages,
        }
    }

    /// True when the conversation is looping, or has a low score after
    /// enough messages. Independent of which guidance is selected.
    #[must_use]
    pub fn needs_intervention(&self, conversation: &Conversation) -> bool {
        let state = &conversation.state;
        state.loops_detected >= self.loop_threshold
            || (state.progress_score < self.low_score_threshold
                && state.message_count() > self.low_score_min_messages)
    }

    /// Assembles the snapshot. Pure: calling it twice without an intervening
    /// turn returns equal snapshots.
    #[must_use]
    pub fn snapshot(&self, conversation_id: &str, conversation: &Conversation) -> StatusSnapshot {
        let state = &conversation.state;
        StatusSnapshot {
            conversation_id: conversation_id.to_string(),
            message_count: state.message_count(),
            current_stage: state.stage,
            progress_score: state.progress_score,
            progress_percentage: state.progress_score * 10.0,
            loops_detected: state.loops_detected,
            needs_intervention: self.needs_intervention(conversation),
            resolution_path: state.resolution_path.clone(),
            guidance: self.guidance.generate(conversation),
        }
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new(&MonitorConfig::default())
    }
}

/// Formats the intervention directive for a snapshot.
///
/// Returns an empty string when no intervention is needed. When the selected
/// guidance has no prompt addition, its suggestion is embedded instead.
#[must_use]
pub fn intervention_prompt(snapshot: &StatusSnapshot) -> String {
    if !snapshot.needs_intervention {
        return String::new();
    }

    let guidance = &snapshot.guidance;
    let directive = guidance
        .prompt_addition
        .as_deref()
        .unwrap_or(&guidance.suggestion);

    format!(
        "\nIMPORTANT: This conversation needs intervention. {issue}\n\n\
         The conversation is currently in stage '{stage}' with a progress score of {score}/10.\n\
         There have been {loops} conversation loops detected.\n\n\
         INTERVENTION GUIDANCE:\n\
         {directive}\n\n\
         Your next response should break this pattern and move the conversation forward.\n",
        issue = guidance.issue,
        stage = snapshot.current_stage,
        score = snapshot.progress_score,
        loops = snapshot.loops_detected,
        directive = directive,
    )
}
