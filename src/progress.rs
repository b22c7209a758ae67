//! Progress scoring.
//!
//! ```text
//! score = clamp(0, max, stage value + milestone bonus - penalty)
//! penalty = loop_penalty * min(max_penalized_loops, loops_detected)
//! ```
//!
//! The score is recomputed from scratch each time, so it only changes when
//! the stage, the milestones or the loop count change.

use crate::config::MonitorConfig;
use crate::conversation::Conversation;
use serde::{Deserialize, Serialize};

/// Individual terms of a score computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub stage_value: f64,
    pub bonus: f64,
    pub penalty: f64,
    /// Clamped final score.
    pub score: f64,
}

/// Computes the bounded progress score for a conversation.
#[derive(Debug, Clone)]
pub struct ProgressScorer {
    loop_penalty: f64,
    max_penalized_loops: u32,
    max_score: f64,
}

impl ProgressScorer {
    /// Creates a scorer from the monitor configuration.
    #[must_use]
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            loop_penalty: config.scoring.loop_penalty,
            max_penalized_loops: config.scoring.max_penalized_loops,
            max_score: config.scoring.max_score,
        }
    }

    /// Computes the score without modifying the conversation.
    #[must_use]
    pub fn breakdown(&self, conversation: &Conversation) -> ScoreBreakdown {
        let stage_value = conversation.state.stage.value();
        let bonus = conversation.progress.bonus();
        let penalized = conversation
            .state
            .loops_detected
            .min(self.max_penalized_loops);
        let penalty = self.loop_penalty * f64::from(penalized);
        let score = (stage_value + bonus - penalty).clamp(0.0, self.max_score);

        ScoreBreakdown {
            stage_value,
            bonus,
            penalty,
            score,
        }
    }

    /// Recomputes and stores the conversation's score.
    pub fn update(&self, conversation: &mut Conversation) -> ScoreBreakdown {
        let breakdown = self.breakdown(conversation);
        conversation.state.progress_score = breakdown.score;
        breakdown
    }
}

impl Default for ProgressScorer {
    fn default() -> Self {
        Self::new(&MonitorConfig::default())
    }
}
