//! Loop detection: repeated agent phrasing, repeated information requests,
//! and user frustration signals.
//!
//! Every detection becomes a [`LoopRecord`] and bumps the session's loop
//! counter through [`crate::conversation::Conversation::record_loop`].

pub mod detector;
pub mod frustration;
pub mod types;

pub use detector::LoopDetector;
pub use frustration::FrustrationDetector;
pub use types::{FrustrationIndicator, LoopKind, LoopRecord};
