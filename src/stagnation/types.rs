//! Core types for loop records.

use serde::{Deserialize, Serialize};

/// Frustration indicator families, checked in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrustrationIndicator {
    /// "still not", "doesn't work", "same issue", "again", ...
    Unresolved,
    /// "frustrated", "annoyed", "upset", ...
    EmotionalDistress,
    /// "already told", "already said", ...
    AlreadyProvided,
    /// "going in circles", "same question", "asked before"
    GoingInCircles,
}

impl FrustrationIndicator {
    /// Returns all indicators in evaluation order.
    #[must_use]
    pub fn all() -> [FrustrationIndicator; 4] {
        [
            Self::Unresolved,
            Self::EmotionalDistress,
            Self::AlreadyProvided,
            Self::GoingInCircles,
        ]
    }

    /// Pattern for this family. Matching is case-insensitive.
    #[must_use]
    pub fn pattern(&self) -> &'static str {
        match self {
            Self::Unresolved => {
                r"(?i)(still not|doesn't work|not working|same issue|again|repeated|loop)"
            }
            Self::EmotionalDistress => r"(?i)(frustrated|annoyed|tired|upset|angry)",
            Self::AlreadyProvided => r"(?i)(already told|already said|already mentioned)",
            Self::GoingInCircles => r"(?i)(going in circles|same question|asked before)",
        }
    }
}

impl std::fmt::Display for FrustrationIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unresolved => write!(f, "unresolved"),
            Self::EmotionalDistress => write!(f, "emotional_distress"),
            Self::AlreadyProvided => write!(f, "already_provided"),
            Self::GoingInCircles => write!(f, "going_in_circles"),
        }
    }
}

/// What kind of loop was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoopKind {
    /// Two recent agent messages are near-duplicates.
    AgentRepetition,
    /// The agent asked the exact same question more than once recently.
    RepeatedRequests,
    /// The user signalled frustration.
    Frustration { indicator: FrustrationIndicator },
}

impl std::fmt::Display for LoopKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AgentRepetition => write!(f, "agent_repetition"),
            Self::RepeatedRequests => write!(f, "repeated_requests"),
            Self::Frustration { indicator } => write!(f, "frustration:{}", indicator),
        }
    }
}

/// A single detected loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopRecord {
    #[serde(flatten)]
    pub kind: LoopKind,
    /// Index of the message whose arrival triggered the detection.
    pub message_index: usize,
    /// The text(s) that matched: the two similar agent messages, the repeated
    /// questions, or the frustrated user message.
    pub evidence: Vec<String>,
}

impl LoopRecord {
    /// Creates a new loop record.
    #[must_use]
    pub fn new(kind: LoopKind, message_index: usize, evidence: Vec<String>) -> Self {
        Self {
            kind,
            message_index,
            evidence,
        }
    }

    /// Returns true if this loop came from the user rather than the agent.
    #[must_use]
    pub fn is_user_signal(&self) -> bool {
        matches!(self.kind, LoopKind::Frustration { .. })
    }
}
