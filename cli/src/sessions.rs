use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use fitflow_core::session::SessionContext;

/// Sessions untouched for this long are dropped.
pub(crate) const SESSION_IDLE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub(crate) const MAX_SESSIONS: usize = 1000;

struct Entry {
    session: SessionContext,
    last_touched: Instant,
}

/// In-memory sessions with idle expiry and a hard cap.
///
/// Expired sessions are swept whenever a new one is inserted and are never
/// returned by lookups. At the cap, the least recently used session makes
/// room for the new one.
pub(crate) struct SessionStore {
    entries: HashMap<String, Entry>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SESSION_IDLE_TTL, MAX_SESSIONS)
    }
}

impl SessionStore {
    pub(crate) fn new(idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            entries: HashMap::new(),
            idle_ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    pub(crate) fn insert(&mut self, session: SessionContext) {
        let now = Instant::now();
        self.evict_expired(now);
        while self.entries.len() >= self.max_sessions {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_touched)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            debug!(session_id = %oldest, "session store full, dropping least recently used");
            self.entries.remove(&oldest);
        }
        self.entries.insert(
            session.id.clone(),
            Entry {
                session,
                last_touched: now,
            },
        );
    }

    /// Look up a live session and mark it as used.
    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut SessionContext> {
        let now = Instant::now();
        if self
            .entries
            .get(id)
            .is_some_and(|e| self.is_expired(e, now))
        {
            self.entries.remove(id);
            return None;
        }
        let entry = self.entries.get_mut(id)?;
        entry.last_touched = now;
        Some(&mut entry.session)
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<SessionContext> {
        self.entries.remove(id).map(|e| e.session)
    }

    /// Every stored session, without refreshing their idle clocks.
    pub(crate) fn sessions_mut(&mut self) -> impl Iterator<Item = &mut SessionContext> {
        self.entries.values_mut().map(|e| &mut e.session)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        now.duration_since(entry.last_touched) >= self.idle_ttl
    }

    fn evict_expired(&mut self, now: Instant) {
        let before = self.entries.len();
        let ttl = self.idle_ttl;
        self.entries
            .retain(|_, e| now.duration_since(e.last_touched) < ttl);
        let removed = before - self.entries.len();
        if removed > 0 {
            info!("dropped {removed} idle sessions");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(ttl_secs: u64, max: usize) -> SessionStore {
        SessionStore::new(Duration::from_secs(ttl_secs), max)
    }

    fn add(store: &mut SessionStore) -> String {
        let session = SessionContext::new();
        let id = session.id.clone();
        store.insert(session);
        id
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_are_dropped_on_insert() {
        let mut store = store_with(60, 10);
        let stale = add(&mut store);
        let active = add(&mut store);

        tokio::time::advance(Duration::from_secs(40)).await;
        assert!(store.get_mut(&active).is_some());
        tokio::time::advance(Duration::from_secs(30)).await;

        let fresh = add(&mut store);
        assert_eq!(store.len(), 2);
        assert!(store.get_mut(&stale).is_none());
        assert!(store.get_mut(&active).is_some());
        assert!(store.get_mut(&fresh).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_session_is_not_returned() {
        let mut store = store_with(60, 10);
        let id = add(&mut store);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(store.get_mut(&id).is_none());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_store_drops_least_recently_used() {
        let mut store = store_with(3600, 3);
        let first = add(&mut store);
        tokio::time::advance(Duration::from_secs(1)).await;
        let second = add(&mut store);
        tokio::time::advance(Duration::from_secs(1)).await;
        let third = add(&mut store);
        tokio::time::advance(Duration::from_secs(1)).await;

        store.get_mut(&first).unwrap().select_user("User A");
        tokio::time::advance(Duration::from_secs(1)).await;
        let fourth = add(&mut store);

        assert_eq!(store.len(), 3);
        assert!(store.get_mut(&second).is_none());
        assert_eq!(
            store.get_mut(&first).unwrap().selected_user.as_deref(),
            Some("User A")
        );
        assert!(store.get_mut(&third).is_some());
        assert!(store.get_mut(&fourth).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_and_iterate() {
        let mut store = store_with(3600, 10);
        let a = add(&mut store);
        let b = add(&mut store);
        for session in store.sessions_mut() {
            session.select_user("User B");
        }
        assert!(store.remove(&a).is_some());
        assert!(store.remove(&a).is_none());
        assert_eq!(store.get_mut(&b).unwrap().selected_user.as_deref(), Some("User B"));
    }
}
