//! loopwatch - Conversation progress and loop-detection monitor
//!
//! Watches a support conversation turn by turn, tracks how far it has moved
//! toward resolution, detects when it is stuck or repeating itself, and
//! produces guidance the response generator can merge into its prompt.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`monitor`] - Session registry and the `add_message` / `status` entry points
//! - [`classifier`] - Per-turn question, stage and frustration extraction
//! - [`stagnation`] - Loop records and the repetition detector
//! - [`progress`] - Bounded progress scoring
//! - [`guidance`] - Prioritized directives for the next response
//! - [`status`] - Status snapshots and intervention prompts
//! - [`similarity`] - Normalized text similarity
//! - [`conversation`] - Data model, stages and context labels
//! - [`config`] - Tunable thresholds and retention policy
//! - [`error`] - Custom error types
//!
//! # Example
//!
//! ```rust
//! use loopwatch::{ConversationMonitor, ContextLabel, Role};
//!
//! let monitor = ConversationMonitor::default();
//!
//! monitor.add_message("session-1", Role::User, "My tracking number doesn't work", None);
//! let status = monitor.add_message(
//!     "session-1",
//!     Role::Agent,
//!     "What specific error are you seeing?",
//!     Some(ContextLabel::TrackingIssueGeneral),
//! );
//!
//! assert_eq!(status.current_stage.to_string(), "issue_identification");
//!
//! // Empty unless the conversation needs a change of approach.
//! let prompt = monitor.intervention_prompt("session-1");
//! assert!(prompt.is_empty());
//! ```

pub mod classifier;
pub mod config;
pub mod conversation;
pub mod error;
pub mod guidance;
pub mod monitor;
pub mod progress;
pub mod similarity;
pub mod stagnation;
pub mod status;

// Re-export commonly used types
pub use error::{MonitorError, Result};

pub use config::MonitorConfig;
pub use conversation::{
    ContextLabel, Conversation, ConversationState, Message, Milestone, ResolutionProgress, Role,
    Stage, Topic,
};
pub use guidance::{Guidance, GuidanceIssue};
pub use monitor::{ConversationMonitor, SessionView};
pub use stagnation::{FrustrationIndicator, LoopKind, LoopRecord};
pub use status::StatusSnapshot;
