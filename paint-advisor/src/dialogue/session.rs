// Conversation sessions and the store that owns them

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::arbiter::GroundedSelection;
use super::types::{SessionId, Turn};
use crate::config::MIN_HISTORY_CAPACITY;
use crate::slots::SlotSet;

/// One logical conversation: accumulated slots, bounded history, last pick
#[derive(Debug, Clone)]
pub struct ConversationSession {
    pub id: SessionId,
    pub slots: SlotSet,
    history: VecDeque<Turn>,
    capacity: usize,
    pub last_selection: Option<GroundedSelection>,
    pub created_at: DateTime<Utc>,
    /// Time of the last recorded turn
    pub last_active: DateTime<Utc>,
    pub turn_count: usize,
}

impl ConversationSession {
    pub fn new(id: impl Into<SessionId>, capacity: usize) -> Self {
        let capacity = capacity.max(MIN_HISTORY_CAPACITY);
        let now = Utc::now();
        Self {
            id: id.into(),
            slots: SlotSet::new(),
            history: VecDeque::with_capacity(capacity),
            capacity,
            last_selection: None,
            created_at: now,
            last_active: now,
            turn_count: 0,
        }
    }

    /// Append a turn, evicting the oldest once capacity is reached
    pub fn push(&mut self, turn: Turn) {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(turn);
        self.last_active = Utc::now();
    }

    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_active
    }

    /// The last `n` turns, oldest first
    pub fn recent_turns(&self, n: usize) -> Vec<Turn> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip).cloned().collect()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forget everything learned in this conversation
    pub fn clear(&mut self) {
        self.slots = SlotSet::new();
        self.history.clear();
        self.last_selection = None;
        self.turn_count = 0;
    }

    /// One-line description, e.g. "3 turns; known: bedroom, for a child, blue"
    pub fn summary(&self) -> String {
        let known = self.slots.describe();
        let known = if known.is_empty() {
            "nothing yet".to_string()
        } else {
            known
        };
        let last = self
            .last_selection
            .as_ref()
            .and_then(|s| s.product.as_ref())
            .map(|p| format!("; last recommendation: {}", p.name))
            .unwrap_or_default();
        format!("{} turns; known: {}{}", self.turn_count, known, last)
    }
}

/// Keyed session storage injected into the engine.
///
/// Each session sits behind its own async mutex: holding it for a whole turn
/// serializes turns of one conversation while other sessions proceed freely.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the session, creating an empty one on first use
    async fn session(&self, id: &str) -> Arc<Mutex<ConversationSession>>;

    /// Clear a session's slots and history. Idempotent, and a no-op for
    /// sessions never seen.
    async fn reset(&self, id: &str);

    /// Drop a session entirely. Returns whether it existed.
    async fn remove(&self, id: &str) -> bool;

    /// Drop every session idle for longer than `max_idle`. Sessions in
    /// the middle of a turn are kept. Returns how many were dropped.
    async fn evict_idle(&self, max_idle: Duration) -> usize;

    fn session_count(&self) -> usize;
}

/// Process-local, non-durable session store
pub struct InMemorySessionStore {
    sessions: DashMap<SessionId, Arc<Mutex<ConversationSession>>>,
    history_capacity: usize,
}

impl InMemorySessionStore {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            history_capacity,
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(crate::config::DialogueConfig::default().history_capacity)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn session(&self, id: &str) -> Arc<Mutex<ConversationSession>> {
        self.sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                tracing::debug!(session_id = id, "creating session");
                Arc::new(Mutex::new(ConversationSession::new(id, self.history_capacity)))
            })
            .clone()
    }

    async fn reset(&self, id: &str) {
        let existing = self.sessions.get(id).map(|entry| entry.value().clone());
        if let Some(session) = existing {
            session.lock().await.clear();
            tracing::info!(session_id = id, "session reset");
        }
    }

    async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            tracing::debug!(session_id = id, "session removed");
        }
        removed
    }

    async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        // A session whose lock is held is mid-turn, hence not idle
        self.sessions.retain(|_, session| match session.try_lock() {
            Ok(guard) => guard.idle_for(now) <= max_idle,
            Err(_) => true,
        });
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            tracing::info!(evicted, remaining = self.sessions.len(), "idle sessions evicted");
        }
        evicted
    }

    fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
