//! Configuration for the conversation monitor.
//!
//! Every threshold the monitor uses lives here. The defaults reproduce the
//! stock heuristics; a deployment can override any subset from a JSON or
//! TOML file.
//!
//! # Example
//!
//! ```json
//! {
//!   "similarity": { "repetitionThreshold": 0.7 },
//!   "retention": { "idleTtlSecs": 900, "maxSessions": 5000 }
//! }
//! ```

use crate::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level monitor configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorConfig {
    #[serde(default)]
    pub similarity: SimilarityConfig,

    #[serde(default)]
    pub windows: WindowConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub intervention: InterventionConfig,

    /// Bounded-memory policy for the session store.
    #[serde(default)]
    pub retention: RetentionConfig,
}

/// Similarity thresholds. A pair is similar when its ratio strictly exceeds
/// the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityConfig {
    /// Threshold for "the user reply addresses an agent question" (default: 0.3).
    #[serde(default = "default_answer_threshold")]
    pub answer_threshold: f64,

    /// Threshold for "the agent is repeating itself" (default: 0.6).
    #[serde(default = "default_repetition_threshold")]
    pub repetition_threshold: f64,
}

fn default_answer_threshold() -> f64 {
    0.3
}

fn default_repetition_threshold() -> f64 {
    0.6
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            answer_threshold: default_answer_threshold(),
            repetition_threshold: default_repetition_threshold(),
        }
    }
}

/// Sliding window sizes, all counted in entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowConfig {
    /// Messages recorded before loop detection and scoring run (default: 4).
    #[serde(default = "default_min_messages")]
    pub min_messages_for_analysis: usize,

    /// Trailing messages scanned for agent repetition (default: 6).
    #[serde(default = "default_repetition_window")]
    pub repetition_window: usize,

    /// Trailing agent questions scanned for repeated requests (default: 4).
    #[serde(default = "default_repeated_ask_window")]
    pub repeated_ask_window: usize,

    /// Trailing agent questions a user reply is compared against (default: 3).
    #[serde(default = "default_answer_lookback")]
    pub answer_lookback: usize,
}

fn default_min_messages() -> usize {
    4
}

fn default_repetition_window() -> usize {
    6
}

fn default_repeated_ask_window() -> usize {
    4
}

fn default_answer_lookback() -> usize {
    3
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            min_messages_for_analysis: default_min_messages(),
            repetition_window: default_repetition_window(),
            repeated_ask_window: default_repeated_ask_window(),
            answer_lookback: default_answer_lookback(),
        }
    }
}

/// Progress score parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringConfig {
    /// Score deducted per detected loop (default: 0.5).
    #[serde(default = "default_loop_penalty")]
    pub loop_penalty: f64,

    /// Loops beyond this count add no further penalty (default: 5).
    #[serde(default = "default_max_penalized_loops")]
    pub max_penalized_loops: u32,

    /// Upper bound of the score (default: 10).
    #[serde(default = "default_max_score")]
    pub max_score: f64,
}

fn default_loop_penalty() -> f64 {
    0.5
}

fn default_max_penalized_loops() -> u32 {
    5
}

fn default_max_score() -> f64 {
    10.0
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            loop_penalty: default_loop_penalty(),
            max_penalized_loops: default_max_penalized_loops(),
            max_score: default_max_score(),
        }
    }
}

/// Thresholds deciding when a conversation needs intervention and which
/// guidance applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterventionConfig {
    /// Loop count at which the conversation is considered looping (default: 2).
    #[serde(default = "default_loop_threshold")]
    pub loop_threshold: u32,

    /// Scores strictly below this are considered low (default: 2.0).
    #[serde(default = "default_low_score_threshold")]
    pub low_score_threshold: f64,

    /// A low score only matters above this message count (default: 6).
    #[serde(default = "default_low_score_min_messages")]
    pub low_score_min_messages: usize,

    /// Message count above which `initial` is considered stuck (default: 4).
    #[serde(default = "default_initial_stage_max")]
    pub initial_stage_max_messages: usize,

    /// Message count above which `issue_identification` is stuck (default: 6).
    #[serde(default = "default_issue_identification_max")]
    pub issue_identification_max_messages: usize,

    /// Message count above which `information_gathering` is excessive (default: 8).
    #[serde(default = "default_information_gathering_max")]
    pub information_gathering_max_messages: usize,

    /// Message count above which a missing solution is flagged (default: 10).
    #[serde(default = "default_solution_max")]
    pub solution_max_messages: usize,
}

fn default_loop_threshold() -> u32 {
    2
}

fn default_low_score_threshold() -> f64 {
    2.0
}

fn default_low_score_min_messages() -> usize {
    6
}

fn default_initial_stage_max() -> usize {
    4
}

fn default_issue_identification_max() -> usize {
    6
}

fn default_information_gathering_max() -> usize {
    8
}

fn default_solution_max() -> usize {
    10
}

impl Default for InterventionConfig {
    fn default() -> Self {
        Self {
            loop_threshold: default_loop_threshold(),
            low_score_threshold: default_low_score_threshold(),
            low_score_min_messages: default_low_score_min_messages(),
            initial_stage_max_messages: default_initial_stage_max(),
            issue_identification_max_messages: default_issue_identification_max(),
            information_gathering_max_messages: default_information_gathering_max(),
            solution_max_messages: default_solution_max(),
        }
    }
}

/// Session retention policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionConfig {
    /// Sessions idle for longer than this are evicted (default: 3600).
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,

    /// Maximum live sessions; the least recently active is evicted to make
    /// room for a new one (default: 10000).
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_idle_ttl_secs() -> u64 {
    3600
}

fn default_max_sessions() -> usize {
    10_000
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: default_idle_ttl_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from a `.json` or `.toml` file.
    ///
    /// The format is chosen by extension; anything other than `.toml` is
    /// parsed as JSON. The loaded configuration is validated before it is
    /// returned.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MonitorError::config_with_path(format!("cannot read file: {}", e), path.to_path_buf())
        })?;

        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));

        let config: MonitorConfig = if is_toml {
            toml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates that every threshold is usable.
    pub fn validate(&self) -> Result<()> {
        let ratios = [
            ("similarity.answerThreshold", self.similarity.answer_threshold),
            (
                "similarity.repetitionThreshold",
                self.similarity.repetition_threshold,
            ),
        ];
        for (field, value) in ratios {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(MonitorError::invalid_config(
                    field,
                    format!("must be within [0, 1], got {}", value),
                ));
            }
        }

        let scores = [
            ("scoring.loopPenalty", self.scoring.loop_penalty),
            ("scoring.maxScore", self.scoring.max_score),
            (
                "intervention.lowScoreThreshold",
                self.intervention.low_score_threshold,
            ),
        ];
        for (field, value) in scores {
            if !value.is_finite() || value < 0.0 {
                return Err(MonitorError::invalid_config(
                    field,
                    format!("must be a non-negative number, got {}", value),
                ));
            }
        }

        let windows = [
            ("windows.repetitionWindow", self.windows.repetition_window),
            ("windows.repeatedAskWindow", self.windows.repeated_ask_window),
            ("windows.answerLookback", self.windows.answer_lookback),
            ("retention.maxSessions", self.retention.max_sessions),
        ];
        for (field, value) in windows {
            if value == 0 {
                return Err(MonitorError::invalid_config(field, "must be at least 1"));
            }
        }

        Ok(())
    }
}
