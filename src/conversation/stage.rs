//! Resolution stages and the one-way stage state machine.
//!
//! A conversation starts in [`Stage::Initial`] and moves forward when an agent
//! message matches one of four phrase families. Transitions never move the
//! stage backwards: a later match of an earlier family still records its
//! milestone, but the current stage stays where it is.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Ordered resolution stages.
///
/// # Example
///
/// ```
/// use loopwatch::conversation::Stage;
///
/// assert!(Stage::SolutionProposal > Stage::IssueIdentification);
/// assert_eq!(Stage::InformationGathering.value(), 2.0);
/// assert_eq!(Stage::ResolutionConfirmation.to_string(), "resolution_confirmation");
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Initial,
    IssueIdentification,
    InformationGathering,
    SolutionProposal,
    ResolutionConfirmation,
}

impl Stage {
    /// Score contribution of being in this stage.
    #[must_use]
    pub fn value(&self) -> f64 {
        match self {
            Self::Initial => 0.0,
            Self::IssueIdentification => 1.0,
            Self::InformationGathering => 2.0,
            Self::SolutionProposal => 3.0,
            Self::ResolutionConfirmation => 4.0,
        }
    }

    /// The milestone completed by entering this stage, if any.
    #[must_use]
    pub fn milestone(&self) -> Option<Milestone> {
        match self {
            Self::Initial => None,
            Self::IssueIdentification => Some(Milestone::IdentifiedIssue),
            Self::InformationGathering => Some(Milestone::CollectedDetails),
            Self::SolutionProposal => Some(Milestone::ProposedSolution),
            Self::ResolutionConfirmation => Some(Milestone::ConfirmedResolution),
        }
    }

    /// Returns all stages in order.
    #[must_use]
    pub fn all() -> [Stage; 5] {
        [
            Self::Initial,
            Self::IssueIdentification,
            Self::InformationGathering,
            Self::SolutionProposal,
            Self::ResolutionConfirmation,
        ]
    }

    /// Stable snake_case label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::IssueIdentification => "issue_identification",
            Self::InformationGathering => "information_gathering",
            Self::SolutionProposal => "solution_proposal",
            Self::ResolutionConfirmation => "resolution_confirmation",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution milestones. Each is set once and never cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    IdentifiedIssue,
    CollectedDetails,
    ProposedSolution,
    ConfirmedResolution,
}

impl Milestone {
    /// Bonus weight this milestone adds to the progress score. Also the
    /// increment applied to the running score when its stage is first entered.
    #[must_use]
    pub fn weight(&self) -> f64 {
        match self {
            Self::IdentifiedIssue => 1.0,
            Self::CollectedDetails => 1.0,
            Self::ProposedSolution => 2.0,
            Self::ConfirmedResolution => 3.0,
        }
    }
}

/// Transition table: phrase families in priority order, each leading to one
/// stage. Only the first matching family is applied per message.
#[derive(Debug)]
pub struct StageTransitions {
    families: Vec<(Regex, Stage)>,
}

impl StageTransitions {
    /// Builds the stock transition table.
    #[must_use]
    pub fn new() -> Self {
        let patterns = [
            (
                r"(?i)(what|which|specific|tell me).*(issue|problem|error|happening)",
                Stage::IssueIdentification,
            ),
            (
                r"(?i)(provide|tell me|share|what is).*(container|tracking number|carrier|shipping line)",
                Stage::InformationGathering,
            ),
            (
                r"(?i)(you can|suggest|recommend|try|here's what|solution|resolve)",
                Stage::SolutionProposal,
            ),
            (
                r"(?i)(anything else|help you with|all set|resolved|completed|finished)",
                Stage::ResolutionConfirmation,
            ),
        ];

        let families = patterns
            .into_iter()
            .filter_map(|(pattern, stage)| Regex::new(pattern).ok().map(|re| (re, stage)))
            .collect();

        Self { families }
    }

    /// Returns the stage signalled by `text`, earliest family first.
    #[must_use]
    pub fn detect(&self, text: &str) -> Option<Stage> {
        self.families
            .iter()
            .find(|(re, _)| re.is_match(text))
            .map(|(_, stage)| *stage)
    }
}

impl Default for StageTransitions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        let all = Stage::all();
        for pair in all.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].value() < pair[1].value());
        }
    }

    #[test]
    fn test_stage_serialization() {
        let json = serde_json::to_string(&Stage::IssueIdentification).unwrap();
        assert_eq!(json, "\"issue_identification\"");
        let restored: Stage = serde_json::from_str("\"solution_proposal\"").unwrap();
        assert_eq!(restored, Stage::SolutionProposal);
    }

    #[test]
    fn test_milestone_weights() {
        assert_eq!(Stage::Initial.milestone(), None);
        assert_eq!(
            Stage::ResolutionConfirmation.milestone().map(|m| m.weight()),
            Some(3.0)
        );
        assert_eq!(Milestone::ProposedSolution.weight(), 2.0);
    }

    #[test]
    fn test_detect_issue_identification() {
        let transitions = StageTransitions::new();
        assert_eq!(
            transitions.detect("What specific error are you seeing?"),
            Some(Stage::IssueIdentification)
        );
    }

    #[test]
    fn test_detect_information_gathering() {
        let transitions = StageTransitions::new();
        assert_eq!(
            transitions.detect("Could you provide the container number?"),
            Some(Stage::InformationGathering)
        );
    }

    #[test]
    fn test_detect_solution_proposal() {
        let transitions = StageTransitions::new();
        assert_eq!(
            transitions.detect("I recommend refreshing the shipment page."),
            Some(Stage::SolutionProposal)
        );
    }

    #[test]
    fn test_detect_resolution_confirmation() {
        let transitions = StageTransitions::new();
        assert_eq!(
            transitions.detect("Is there anything else I can help you with?"),
            Some(Stage::ResolutionConfirmation)
        );
    }

    #[test]
    fn test_earliest_family_wins() {
        let transitions = StageTransitions::new();
        // Matches both the issue family and the solution family.
        assert_eq!(
            transitions.detect("Tell me what error you get and I suggest a fix."),
            Some(Stage::IssueIdentification)
        );
    }

    #[test]
    fn test_detect_none() {
        let transitions = StageTransitions::new();
        assert_eq!(transitions.detect("Hello there!"), None);
        assert_eq!(transitions.detect(""), None);
    }
}
