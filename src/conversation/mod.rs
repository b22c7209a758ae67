//! Conversation data model.
//!
//! # Architecture
//!
//! ```text
//! Conversation
//!   ├── state: ConversationState       (messages, asks, topics, stage, score)
//!   └── progress: ResolutionProgress   (milestone flags, loop records)
//! ```
//!
//! All mutation goes through [`Conversation`] so that the loop counter and
//! the loop records stay in lockstep and the resolution path never repeats a
//! stage.

pub mod context;
pub mod stage;

pub use context::{ContextLabel, Topic};
pub use stage::{Milestone, Stage, StageTransitions};

use crate::error::{MonitorError, Result};
use crate::stagnation::LoopRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Conversation participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Agent,
}

impl FromStr for Role {
    type Err = MonitorError;

    /// Parses `user` or `agent`. Anything else is a caller error.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "agent" => Ok(Self::Agent),
            _ => Err(MonitorError::invalid_role(s)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Agent => write!(f, "agent"),
        }
    }
}

/// A single recorded turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

/// A user reply judged to address an earlier agent question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvidedAnswer {
    pub asked: String,
    pub provided: String,
}

/// Per-session conversation state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Every turn, in order.
    pub messages: Vec<Message>,
    /// Questions extracted from agent turns, duplicates included.
    pub agent_asks: Vec<String>,
    /// User replies matched to agent questions.
    pub user_provides: Vec<ProvidedAnswer>,
    pub topics: BTreeSet<Topic>,
    /// Never decreases.
    pub loops_detected: u32,
    /// Always within `[0, max_score]`.
    pub progress_score: f64,
    pub stage: Stage,
    /// Stages entered, each at most once.
    pub resolution_path: Vec<Stage>,
}

impl ConversationState {
    /// Number of recorded turns.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Index of the most recent message, or 0 when empty.
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.messages.len().saturating_sub(1)
    }
}

/// Milestone flags and loop history for a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionProgress {
    pub identified_issue: bool,
    pub collected_details: bool,
    pub proposed_solution: bool,
    pub confirmed_resolution: bool,
    pub loops: Vec<LoopRecord>,
}

impl ResolutionProgress {
    /// Returns whether a milestone has been reached.
    #[must_use]
    pub fn is_reached(&self, milestone: Milestone) -> bool {
        match milestone {
            Milestone::IdentifiedIssue => self.identified_issue,
            Milestone::CollectedDetails => self.collected_details,
            Milestone::ProposedSolution => self.proposed_solution,
            Milestone::ConfirmedResolution => self.confirmed_resolution,
        }
    }

    /// Marks a milestone as reached. Flags are never cleared.
    pub fn reach(&mut self, milestone: Milestone) {
        match milestone {
            Milestone::IdentifiedIssue => self.identified_issue = true,
            Milestone::CollectedDetails => self.collected_details = true,
            Milestone::ProposedSolution => self.proposed_solution = true,
            Milestone::ConfirmedResolution => self.confirmed_resolution = true,
        }
    }

    /// Sum of the weights of every reached milestone.
    #[must_use]
    pub fn bonus(&self) -> f64 {
        [
            Milestone::IdentifiedIssue,
            Milestone::CollectedDetails,
            Milestone::ProposedSolution,
            Milestone::ConfirmedResolution,
        ]
        .into_iter()
        .filter(|m| self.is_reached(*m))
        .map(|m| m.weight())
        .sum()
    }
}

/// Outcome of applying a stage signal to a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageChange {
    /// Stage before the signal.
    pub from: Stage,
    /// Stage after the signal. Never lower than `from`.
    pub to: Stage,
    /// True if the signalled stage was appended to the resolution path.
    pub newly_entered: bool,
}

/// A conversation's state and progress, mutated together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub state: ConversationState,
    pub progress: ResolutionProgress,
}

impl Conversation {
    /// Creates an empty conversation in the initial stage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn and returns its index.
    pub fn push_message(&mut self, role: Role, text: impl Into<String>) -> usize {
        self.state.messages.push(Message {
            role,
            text: text.into(),
        });
        self.state.last_index()
    }

    /// Applies a stage signal.
    ///
    /// The milestone for `signalled` is always reached. The current stage only
    /// moves forward. The signalled stage is appended to the resolution path
    /// the first time it is seen.
    pub fn signal_stage(&mut self, signalled: Stage) -> StageChange {
        let from = self.state.stage;

        if let Some(milestone) = signalled.milestone() {
            self.progress.reach(milestone);
        }

        if signalled > from {
            self.state.stage = signalled;
        }

        let newly_entered = !self.state.resolution_path.contains(&signalled);
        if newly_entered {
            self.state.resolution_path.push(signalled);
        }

        StageChange {
            from,
            to: self.state.stage,
            newly_entered,
        }
    }

    /// Records a detected loop, keeping the counter and the records in step.
    pub fn record_loop(&mut self, record: LoopRecord) {
        self.state.loops_detected += 1;
        self.progress.loops.push(record);
    }
}
