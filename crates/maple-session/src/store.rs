//! # Session Store
//!
//! Ordered in-memory session collection. Every mutation finishes with a
//! single re-sort and re-index, so callers never observe a half-applied
//! change.

use std::collections::HashMap;

use maple_core::{Language, Message, Region};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::types::{Session, SessionId};

/// Sessions sorted by start time (newest first) with an id index
#[derive(Debug, Default, Clone)]
pub struct SessionStore {
    sessions: Vec<Session>,
    index: HashMap<SessionId, usize>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with historical sessions
    ///
    /// Later duplicates of an id are dropped so the uniqueness invariant holds
    /// from the start.
    pub fn with_history(history: impl IntoIterator<Item = Session>) -> Self {
        let mut store = Self::new();
        for session in history {
            if store.index.contains_key(&session.id) {
                warn!("Dropping duplicate seeded session {}", session.id);
                continue;
            }
            store.index.insert(session.id.clone(), store.sessions.len());
            store.sessions.push(session);
        }
        store.resort();
        store
    }

    /// Insert a new conversation holding its first message
    pub fn create_session(
        &mut self,
        temp_id: impl Into<SessionId>,
        region: Region,
        language: Language,
        first_message: Message,
    ) -> StoreResult<&Session> {
        let id = temp_id.into();
        self.ensure_vacant(&id)?;

        let mut session = Session::started_now(id.clone(), region, language);
        session.push(first_message);
        self.insert(session);

        debug!("Created session {}", id);
        self.by_id(&id).ok_or_else(|| StoreError::not_found(&id))
    }

    /// Insert a conversation with no messages yet
    pub fn create_empty_session(
        &mut self,
        id: impl Into<SessionId>,
        region: Region,
        language: Language,
    ) -> StoreResult<&Session> {
        let id = id.into();
        self.ensure_vacant(&id)?;

        self.insert(Session::started_now(id.clone(), region, language));

        debug!("Created empty session {}", id);
        self.by_id(&id).ok_or_else(|| StoreError::not_found(&id))
    }

    /// Rename a session in place and refresh its region/language
    ///
    /// The old id disappears in the same step the new one appears.
    pub fn rewrite_session_id(
        &mut self,
        old_id: &str,
        new_id: impl Into<SessionId>,
        region: Region,
        language: Language,
    ) -> StoreResult<()> {
        let new_id = new_id.into();
        let pos = *self
            .index
            .get(old_id)
            .ok_or_else(|| StoreError::not_found(old_id))?;

        if old_id != new_id && self.index.contains_key(&new_id) {
            return Err(StoreError::already_exists(new_id));
        }

        let session = &mut self.sessions[pos];
        session.id = new_id.clone();
        session.region = region;
        session.language = language;

        self.index.remove(old_id);
        self.index.insert(new_id.clone(), pos);
        self.resort();

        debug!("Rewrote session id {} -> {}", old_id, new_id);
        Ok(())
    }

    /// Append a message to an existing session
    pub fn append_message(&mut self, session_id: &str, message: Message) -> StoreResult<()> {
        let pos = *self
            .index
            .get(session_id)
            .ok_or_else(|| StoreError::not_found(session_id))?;
        self.sessions[pos].push(message);
        self.resort();
        Ok(())
    }

    /// Delete a session only if it never received a message
    ///
    /// Returns whether a session was removed.
    pub fn remove_empty_session(&mut self, session_id: &str) -> bool {
        match self.index.get(session_id) {
            Some(&pos) if self.sessions[pos].is_empty() => {
                self.sessions.remove(pos);
                self.resort();
                debug!("Removed empty session {}", session_id);
                true
            }
            Some(_) => false,
            None => false,
        }
    }

    /// Most recently started session
    pub fn latest(&self) -> Option<&Session> {
        self.sessions.first()
    }

    pub fn by_id(&self, id: &str) -> Option<&Session> {
        self.index.get(id).map(|&pos| &self.sessions[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Sorted view, with the live session pinned first when given
    pub fn all(&self, live: Option<&str>) -> Vec<&Session> {
        let mut out: Vec<&Session> = Vec::with_capacity(self.sessions.len());
        if let Some(live) = live.and_then(|id| self.by_id(id)) {
            out.push(live);
        }
        out.extend(
            self.sessions
                .iter()
                .filter(|s| Some(s.id.as_str()) != live),
        );
        out
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn ensure_vacant(&self, id: &str) -> StoreResult<()> {
        if self.index.contains_key(id) {
            Err(StoreError::already_exists(id))
        } else {
            Ok(())
        }
    }

    fn insert(&mut self, session: Session) {
        self.sessions.push(session);
        self.resort();
    }

    fn resort(&mut self) {
        // Stable: sessions started at the same instant keep insertion order.
        self.sessions
            .sort_by(|a, b| b.start_time.cmp(&a.start_time));
        self.index = self
            .sessions
            .iter()
            .enumerate()
            .map(|(pos, s)| (s.id.clone(), pos))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn historical(id: &str, days_ago: i64) -> Session {
        let start = Utc::now() - Duration::days(days_ago);
        Session::historical(
            id,
            start,
            Region::Ontario,
            Language::En,
            format!("Session {}", id),
            vec![Message::user("hi").at(start)],
        )
    }

    #[test]
    fn test_history_sorted_newest_first() {
        let store = SessionStore::with_history(vec![historical("old", 3), historical("new", 1)]);
        let ids: Vec<&str> = store.all(None).iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(store.latest().unwrap().id(), "new");
    }

    #[test]
    fn test_duplicate_seed_dropped() {
        let store = SessionStore::with_history(vec![historical("a", 1), historical("a", 2)]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_create_session_derives_title() {
        let mut store = SessionStore::new();
        let session = store
            .create_session("tmp-1", Region::West, Language::En, Message::user("Hello"))
            .unwrap();
        assert_eq!(session.title(), "Hello");
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn test_create_session_rejects_existing_id() {
        let mut store = SessionStore::with_history(vec![historical("a", 1)]);
        let err = store
            .create_session("a", Region::West, Language::En, Message::user("x"))
            .unwrap_err();
        assert_eq!(err, StoreError::already_exists("a"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_new_session_sorts_before_history() {
        let mut store = SessionStore::with_history(vec![historical("a", 1)]);
        store
            .create_session("tmp-1", Region::West, Language::En, Message::user("Hello"))
            .unwrap();
        assert_eq!(store.latest().unwrap().id(), "tmp-1");
    }

    #[test]
    fn test_rewrite_replaces_id_in_place() {
        let mut store = SessionStore::with_history(vec![historical("a", 1)]);
        store
            .create_session("tmp-1", Region::None, Language::En, Message::user("Hello"))
            .unwrap();
        store.append_message("tmp-1", Message::user("again")).unwrap();

        store
            .rewrite_session_id("tmp-1", "c1", Region::Quebec, Language::Fr)
            .unwrap();

        assert!(!store.contains("tmp-1"));
        assert_eq!(store.len(), 2);
        let session = store.by_id("c1").unwrap();
        assert_eq!(session.region(), Region::Quebec);
        assert_eq!(session.language(), Language::Fr);
        let texts: Vec<&str> = session.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello", "again"]);
    }

    #[test]
    fn test_rewrite_missing_session_is_an_error() {
        let mut store = SessionStore::new();
        let err = store
            .rewrite_session_id("tmp-x", "c1", Region::None, Language::En)
            .unwrap_err();
        assert_eq!(err, StoreError::not_found("tmp-x"));
    }

    #[test]
    fn test_rewrite_onto_existing_id_is_refused() {
        let mut store = SessionStore::with_history(vec![historical("c1", 1)]);
        store
            .create_session("tmp-1", Region::None, Language::En, Message::user("Hello"))
            .unwrap();
        let err = store
            .rewrite_session_id("tmp-1", "c1", Region::None, Language::En)
            .unwrap_err();
        assert_eq!(err, StoreError::already_exists("c1"));
        assert!(store.contains("tmp-1"));
    }

    #[test]
    fn test_append_to_unknown_session() {
        let mut store = SessionStore::new();
        let err = store.append_message("ghost", Message::user("x")).unwrap_err();
        assert_eq!(err, StoreError::not_found("ghost"));
    }

    #[test]
    fn test_append_sets_title_on_empty_session() {
        let mut store = SessionStore::new();
        store
            .create_empty_session("c1", Region::None, Language::En)
            .unwrap();
        assert_eq!(store.by_id("c1").unwrap().display_title(), "Untitled Chat");

        store.append_message("c1", Message::bot(None, "welcome")).unwrap();
        assert_eq!(store.by_id("c1").unwrap().title(), "");

        store.append_message("c1", Message::user("Where is my card?")).unwrap();
        assert_eq!(store.by_id("c1").unwrap().title(), "Where is my card?");
    }

    #[test]
    fn test_remove_empty_session_only_when_empty() {
        let mut store = SessionStore::new();
        store
            .create_empty_session("empty", Region::None, Language::En)
            .unwrap();
        store
            .create_session("full", Region::None, Language::En, Message::user("x"))
            .unwrap();

        assert!(store.remove_empty_session("empty"));
        assert!(!store.remove_empty_session("full"));
        assert!(!store.remove_empty_session("missing"));
        assert!(!store.contains("empty"));
        assert!(store.contains("full"));
    }

    #[test]
    fn test_index_stays_consistent_after_removal() {
        let mut store = SessionStore::with_history(vec![historical("a", 2), historical("b", 1)]);
        store
            .create_empty_session("live", Region::None, Language::En)
            .unwrap();
        assert!(store.remove_empty_session("live"));

        assert_eq!(store.by_id("a").unwrap().id(), "a");
        assert_eq!(store.by_id("b").unwrap().id(), "b");
        store.append_message("a", Message::user("more")).unwrap();
        assert_eq!(store.by_id("a").unwrap().messages().len(), 2);
    }

    #[test]
    fn test_all_pins_live_session_first() {
        let mut store = SessionStore::with_history(vec![historical("a", 2), historical("b", 1)]);
        store
            .create_session("tmp-1", Region::None, Language::En, Message::user("x"))
            .unwrap();

        let ids: Vec<&str> = store.all(Some("a")).iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["a", "tmp-1", "b"]);

        let unknown: Vec<&str> = store.all(Some("nope")).iter().map(|s| s.id()).collect();
        assert_eq!(unknown, vec!["tmp-1", "b", "a"]);
    }
}
