//! Session registry and the monitor entry points.
//!
//! # Architecture
//!
//! ```text
//! ConversationMonitor
//!   ├── sessions: DashMap<id, Arc<Mutex<Session>>>
//!   ├── TurnClassifier   - per-turn extraction and stage signals
//!   ├── LoopDetector     - repetition scans (from the 4th message on)
//!   ├── ProgressScorer   - bounded score (from the 4th message on)
//!   └── StatusReporter   - snapshot, guidance, intervention prompt
//! ```
//!
//! The map only guards insert-if-absent and removal. Each session's state is
//! mutated under its own mutex, so different sessions never contend.
//!
//! # Retention
//!
//! Sessions live until they are ended, evicted for idleness, or pushed out by
//! the session cap (least recently active first). The cap is enforced right
//! after a new session is inserted, so concurrent creators can overshoot it
//! only until their own eviction pass runs.
//!
//! A session removed from the map is flagged under its own mutex. A turn
//! that acquired the handle just before removal sees the flag and is
//! replayed against a freshly created session instead of being lost.
//!
//! # Example
//!
//! ```
//! use loopwatch::{ConversationMonitor, Role};
//!
//! let monitor = ConversationMonitor::default();
//! monitor.add_message("s1", Role::User, "Where is my container?", None);
//! let status = monitor.add_message("s1", Role::Agent, "What is the container number?", None);
//! assert_eq!(status.message_count, 2);
//! assert_eq!(monitor.intervention_prompt("s1"), "");
//! ```

use crate::classifier::TurnClassifier;
use crate::config::MonitorConfig;
use crate::conversation::{ContextLabel, Conversation, Role};
use crate::progress::ProgressScorer;
use crate::stagnation::LoopDetector;
use crate::status::{intervention_prompt, StatusReporter, StatusSnapshot};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// A conversation plus its bookkeeping timestamps.
#[derive(Debug, Clone)]
struct Session {
    conversation: Conversation,
    created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
    /// Set once the session has been removed from the map.
    detached: bool,
}

impl Session {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            conversation: Conversation::new(),
            created_at: now,
            last_active: now,
            detached: false,
        }
    }
}

type SessionHandle = Arc<Mutex<Session>>;

/// Locks a session. A panic in another holder leaves plain data behind, so
/// the guard is recovered rather than propagated.
fn lock(handle: &SessionHandle) -> MutexGuard<'_, Session> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Read-only copy of a session for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub conversation: Conversation,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

/// Tracks conversations per session and reports their progress.
#[derive(Debug)]
pub struct ConversationMonitor {
    config: MonitorConfig,
    sessions: DashMap<String, SessionHandle>,
    classifier: TurnClassifier,
    detector: LoopDetector,
    scorer: ProgressScorer,
    reporter: StatusReporter,
}

impl ConversationMonitor {
    /// Creates a monitor with the given configuration.
    #[must_use]
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            classifier: TurnClassifier::new(&config),
            detector: LoopDetector::new(&config),
            scorer: ProgressScorer::new(&config),
            reporter: StatusReporter::new(&config),
            sessions: DashMap::new(),
            config,
        }
    }

    /// The configuration this monitor was built with.
    #[must_use]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Records one turn and returns the updated status.
    ///
    /// Unknown session ids start a new conversation. Loop detection and
    /// scoring run once the session holds enough messages.
    pub fn add_message(
        &self,
        session_id: &str,
        role: Role,
        text: &str,
        context: Option<ContextLabel>,
    ) -> StatusSnapshot {
        self.add_message_at(session_id, role, text, context, Utc::now())
    }

    /// Same as [`add_message`](Self::add_message) with an explicit clock.
    pub fn add_message_at(
        &self,
        session_id: &str,
        role: Role,
        text: &str,
        context: Option<ContextLabel>,
        now: DateTime<Utc>,
    ) -> StatusSnapshot {
        let handle = self.session_handle(session_id, now);
        let mut session = lock(&handle);
        // The map is never touched while a session is locked, since eviction
        // locks sessions while holding map shards.
        if session.detached {
            drop(session);
            debug!(session_id, "Session evicted mid-turn, retrying on a new one");
            return self.add_message_at(session_id, role, text, context, now);
        }
        session.last_active = now;

        let conversation = &mut session.conversation;
        conversation.push_message(role, text);
        self.classifier.classify(conversation, role, text, context);

        if conversation.state.message_count() >= self.config.windows.min_messages_for_analysis {
            self.detector.scan(conversation);
            self.scorer.update(conversation);
        }

        let snapshot = self.reporter.snapshot(session_id, conversation);
        debug!(session_id, %role, status = %snapshot.summary(), "Turn recorded");
        if snapshot.needs_intervention {
            warn!(
                session_id,
                issue = %snapshot.guidance.issue,
                "Conversation needs intervention"
            );
        }
        snapshot
    }

    /// Current status of a session.
    ///
    /// An unknown id reports a pristine conversation without creating one.
    #[must_use]
    pub fn status(&self, session_id: &str) -> StatusSnapshot {
        match self.existing_handle(session_id) {
            Some(handle) => {
                let session = lock(&handle);
                self.reporter.snapshot(session_id, &session.conversation)
            }
            None => self.reporter.snapshot(session_id, &Conversation::new()),
        }
    }

    /// Intervention directive for a session, or an empty string when the
    /// conversation is on track.
    #[must_use]
    pub fn intervention_prompt(&self, session_id: &str) -> String {
        intervention_prompt(&self.status(session_id))
    }

    /// Copy of a session's full state, if it exists.
    #[must_use]
    pub fn state(&self, session_id: &str) -> Option<SessionView> {
        self.existing_handle(session_id).map(|handle| {
            let session = lock(&handle);
            SessionView {
                conversation: session.conversation.clone(),
                created_at: session.created_at,
                last_active: session.last_active,
            }
        })
    }

    /// Returns true if the session exists.
    #[must_use]
    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Number of live sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drops a session. Returns true if it existed.
    pub fn end_session(&self, session_id: &str) -> bool {
        let removed = self.detach(session_id);
        if removed {
            info!(session_id, "Session ended");
        }
        removed
    }

    /// Evicts sessions idle for longer than the configured TTL.
    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Utc::now())
    }

    /// Evicts sessions whose last activity is older than `now - ttl`.
    ///
    /// Returns the number of sessions removed.
    pub fn evict_idle_at(&self, now: DateTime<Utc>) -> usize {
        let ttl = i64::try_from(self.config.retention.idle_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        let cutoff = now
            .checked_sub_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let before = self.sessions.len();
        self.sessions.retain(|_, handle| {
            let mut session = lock(handle);
            let keep = session.last_active >= cutoff;
            session.detached = !keep;
            keep
        });
        let evicted = before.saturating_sub(self.sessions.len());

        if evicted > 0 {
            info!(evicted, remaining = self.sessions.len(), "Evicted idle sessions");
        }
        evicted
    }

    fn existing_handle(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions
            .get(session_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Returns the handle for a session, creating the session if needed.
    fn session_handle(&self, session_id: &str, now: DateTime<Utc>) -> SessionHandle {
        if let Some(handle) = self.existing_handle(session_id) {
            return handle;
        }

        let mut created = false;
        let handle = {
            let entry = self
                .sessions
                .entry(session_id.to_string())
                .or_insert_with(|| {
                    created = true;
                    Arc::new(Mutex::new(Session::new(now)))
                });
            Arc::clone(entry.value())
        };

        if created {
            info!(session_id, "Session created");
            self.enforce_capacity(session_id);
        }
        handle
    }

    /// Evicts least recently active sessions, never `keep`, until the map
    /// is back within the session cap.
    fn enforce_capacity(&self, keep: &str) {
        while self.sessions.len() > self.config.retention.max_sessions {
            let oldest = self
                .sessions
                .iter()
                .filter(|entry| entry.key().as_str() != keep)
                .map(|entry| (entry.key().clone(), lock(entry.value()).last_active))
                .min_by_key(|(_, last_active)| *last_active)
                .map(|(id, _)| id);

            let Some(id) = oldest else { break };
            if self.detach(&id) {
                info!(session_id = %id, "Evicted least recently active session");
            }
        }
    }

    /// Removes a session from the map and flags it for any turn still
    /// holding its handle.
    fn detach(&self, session_id: &str) -> bool {
        match self.sessions.remove(session_id) {
            Some((_, handle)) => {
                lock(&handle).detached = true;
                true
            }
            None => false,
        }
    }
}

impl Default for ConversationMonitor {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}
