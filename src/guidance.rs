//! Guidance for the next response.
//!
//! Rules are evaluated in priority order and the first match wins:
//!
//! 1. loops at or above the loop threshold
//! 2. stuck in `initial`
//! 3. stuck in `issue_identification`
//! 4. too long in `information_gathering`
//! 5. no solution proposed after many messages
//! 6. otherwise, continue as before

use crate::config::MonitorConfig;
use crate::conversation::{Conversation, Stage};
use serde::{Deserialize, Serialize};

/// Problem the guidance addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceIssue {
    ConversationLoopDetected,
    StuckInInitialStage,
    StuckInIssueIdentification,
    ExcessiveInformationGathering,
    NoSolutionProposed,
    None,
}

impl GuidanceIssue {
    /// Stable snake_case label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConversationLoopDetected => "conversation_loop_detected",
            Self::StuckInInitialStage => "stuck_in_initial_stage",
            Self::StuckInIssueIdentification => "stuck_in_issue_identification",
            Self::ExcessiveInformationGathering => "excessive_information_gathering",
            Self::NoSolutionProposed => "no_solution_proposed",
            Self::None => "none",
        }
    }

    /// Human-readable suggestion for this issue.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::ConversationLoopDetected => {
                "Change approach and acknowledge to the user that we might be going in circles. \
                 Summarize what we know so far and propose a concrete next step or solution."
            }
            Self::StuckInInitialStage => {
                "Ask a direct question to identify the specific issue the user is having."
            }
            Self::StuckInIssueIdentification => {
                "Propose the most likely issue based on information so far and ask for confirmation."
            }
            Self::ExcessiveInformationGathering => {
                "Move forward with the information you have. Propose a solution."
            }
            Self::NoSolutionProposed => {
                "Propose a concrete solution now, even with limited information."
            }
            Self::None => "Continue with the current approach.",
        }
    }

    /// Text to merge into the response prompt. `None` for the default issue.
    #[must_use]
    pub fn prompt_addition(&self) -> Option<&'static str> {
        match self {
            Self::ConversationLoopDetected => Some(
                "You notice this conversation seems to be going in circles. \
                 Acknowledge this to the user, summarize what you've understood so far, \
                 and take a different approach to move toward resolution.",
            ),
            Self::StuckInInitialStage => Some(
                "The conversation hasn't moved beyond the initial stage. \
                 Ask a specific, direct question to identify the core issue.",
            ),
            Self::StuckInIssueIdentification => Some(
                "The conversation is stuck at identifying the issue. \
                 Make your best guess about what the problem is based on information provided, \
                 and ask the user to confirm or correct your understanding.",
            ),
            Self::ExcessiveInformationGathering => Some(
                "You've spent sufficient time gathering information. \
                 Now propose a solution based on what you know, even if some details are missing.",
            ),
            Self::NoSolutionProposed => Some(
                "The conversation has gone on for several exchanges without proposing a solution. \
                 Offer a specific solution now based on available information.",
            ),
            Self::None => None,
        }
    }
}

impl std::fmt::Display for GuidanceIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single prioritized directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guidance {
    pub issue: GuidanceIssue,
    pub suggestion: String,
    pub prompt_addition: Option<String>,
}

impl Guidance {
    /// Builds the guidance payload for an issue.
    #[must_use]
    pub fn for_issue(issue: GuidanceIssue) -> Self {
        Self {
            issue,
            suggestion: issue.suggestion().to_string(),
            prompt_addition: issue.prompt_addition().map(str::to_string),
        }
    }

    /// Returns true if this guidance asks for a change of approach.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        self.issue != GuidanceIssue::None
    }
}

impl Default for Guidance {
    fn default() -> Self {
        Self::for_issue(GuidanceIssue::None)
    }
}

/// Maps conversation state to guidance.
#[derive(Debug, Clone)]
pub struct GuidanceGenerator {
    loop_threshold: u32,
    initial_stage_max: usize,
    issue_identification_max: usize,
    information_gathering_max: usize,
    solution_max: usize,
}

impl GuidanceGenerator {
    /// Creates a generator from the monitor configuration.
    #[must_use]
    pub fn new(config: &MonitorConfig) -> Self {
        let intervention = &config.intervention;
        Self {
            loop_threshold: intervention.loop_threshold,
            initial_stage_max: intervention.initial_stage_max_messages,
            issue_identification_max: intervention.issue_identification_max_messages,
            information_gathering_max: intervention.information_gathering_max_messages,
            solution_max: intervention.solution_max_messages,
        }
    }

    /// Selects the highest-priority issue for the conversation.
    #[must_use]
    pub fn issue(&self, conversation: &Conversation) -> GuidanceIssue {
        let state = &conversation.state;
        let count = state.message_count();

        if state.loops_detected >= self.loop_threshold {
            return GuidanceIssue::ConversationLoopDetected;
        }

        match state.stage {
            Stage::Initial if count > self.initial_stage_max => {
                return GuidanceIssue::StuckInInitialStage;
            }
            Stage::IssueIdentification if count > self.issue_identification_max => {
                return GuidanceIssue::StuckInIssueIdentification;
            }
            Stage::InformationGathering if count > self.information_gathering_max => {
                return GuidanceIssue::ExcessiveInformationGathering;
            }
            _ => {}
        }

        if !conversation.progress.proposed_solution && count > self.solution_max {
            return GuidanceIssue::NoSolutionProposed;
        }

        GuidanceIssue::None
    }

    /// Produces the guidance payload for the conversation.
    #[must_use]
    pub fn generate(&self, conversation: &Conversation) -> Guidance {
        Guidance::for_issue(self.issue(conversation))
    }
}

impl Default for GuidanceGenerator {
    fn default() -> Self {
        Self::new(&MonitorConfig::default())
    }
}
