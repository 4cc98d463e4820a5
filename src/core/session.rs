use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::message::Message;

/// Titles derived from the first user message are clipped to this many chars.
const TITLE_MAX_CHARS: usize = 35;

const DEFAULT_TITLE: &str = "New chat";

/// One conversation thread. The message sequence is append-only and is the
/// sole source of history for the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: i64,
    pub last_modified: i64,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            id: Uuid::new_v4().to_string(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            last_modified: now,
        }
    }

    fn push(&mut self, message: Message) {
        if self.title == DEFAULT_TITLE && message.is_user() {
            if let Some(title) = derive_title(&message.content) {
                self.title = title;
            }
        }
        self.messages.push(message);
        self.last_modified = Utc::now().timestamp_millis();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn derive_title(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(TITLE_MAX_CHARS).collect())
}

/// All sessions known to the client, newest first, plus which one the user is
/// looking at. `active_session_id` always names a live session or is `None`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStore {
    pub sessions: Vec<Session>,
    pub active_session_id: Option<String>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted sessions, dropping a stale active id.
    pub fn from_sessions(sessions: Vec<Session>, active_session_id: Option<String>) -> Self {
        let active_session_id =
            active_session_id.filter(|id| sessions.iter().any(|s| &s.id == id));
        Self {
            sessions,
            active_session_id,
        }
    }

    /// Create an empty session at the head of the list and make it active.
    pub fn create_session(&mut self) -> &Session {
        let session = Session::new();
        self.active_session_id = Some(session.id.clone());
        self.sessions.insert(0, session);
        &self.sessions[0]
    }

    /// Remove a session. Deleting an unknown id is a no-op. If the active
    /// session is deleted, the most recently modified survivor takes over.
    pub fn delete_session(&mut self, id: &str) {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        if self.sessions.len() == before {
            return;
        }
        if self.active_session_id.as_deref() == Some(id) {
            self.active_session_id = self
                .sessions
                .iter()
                .max_by_key(|s| s.last_modified)
                .map(|s| s.id.clone());
        }
    }

    pub fn append_message(&mut self, session_id: &str, message: Message) -> bool {
        match self.session_mut(session_id) {
            Some(session) => {
                session.push(message);
                true
            }
            None => false,
        }
    }

    pub fn session(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    fn session_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.active_session_id
            .as_deref()
            .and_then(|id| self.session(id))
    }

    pub fn set_active(&mut self, id: &str) -> bool {
        if self.sessions.iter().any(|s| s.id == id) {
            self.active_session_id = Some(id.to_string());
            true
        } else {
            false
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::{Attachment, Role};

    fn store_with_sessions(n: usize) -> SessionStore {
        let mut store = SessionStore::new();
        for _ in 0..n {
            store.create_session();
        }
        store
    }

    #[test]
    fn new_sessions_go_to_the_head_and_become_active() {
        let mut store = SessionStore::new();
        let first = store.create_session().id.clone();
        let second = store.create_session().id.clone();
        assert_eq!(store.sessions[0].id, second);
        assert_eq!(store.sessions[1].id, first);
        assert_eq!(store.active_session_id.as_deref(), Some(second.as_str()));
    }

    #[test]
    fn active_id_never_dangles() {
        let mut store = store_with_sessions(3);
        let ids: Vec<String> = store.sessions.iter().map(|s| s.id.clone()).collect();
        for id in &ids {
            store.delete_session(id);
            match &store.active_session_id {
                Some(active) => assert!(store.session(active).is_some()),
                None => assert!(store.is_empty()),
            }
        }
        assert!(store.is_empty());
        assert_eq!(store.active_session_id, None);
    }

    #[test]
    fn deleting_active_selects_most_recently_modified_survivor() {
        let mut store = store_with_sessions(3);
        let survivor = store.sessions[2].id.clone();
        // Touch the oldest session so it is the freshest survivor.
        store.sessions[2].last_modified = Utc::now().timestamp_millis() + 1_000;
        let active = store.active_session_id.clone().unwrap();
        store.delete_session(&active);
        assert_eq!(store.active_session_id.as_deref(), Some(survivor.as_str()));
    }

    #[test]
    fn deleting_unknown_id_is_a_no_op() {
        let mut store = store_with_sessions(2);
        let active = store.active_session_id.clone();
        store.delete_session("not-a-session");
        assert_eq!(store.sessions.len(), 2);
        assert_eq!(store.active_session_id, active);
    }

    #[test]
    fn title_comes_from_first_user_message_clipped_to_35_chars() {
        let mut store = SessionStore::new();
        let id = store.create_session().id.clone();
        let long = "Prove that the sum of two even numbers is always even";
        store.append_message(&id, Message::user(long, Vec::new()));
        let title = store.session(&id).unwrap().title.clone();
        assert_eq!(title.chars().count(), 35);
        assert!(long.starts_with(title.as_str()));

        // A second user message must not retitle the session.
        store.append_message(&id, Message::user("Different question", Vec::new()));
        assert_eq!(store.session(&id).unwrap().title, title);
    }

    #[test]
    fn blank_first_message_keeps_default_title() {
        let mut store = SessionStore::new();
        let id = store.create_session().id.clone();
        let attachment = Attachment::new("scan.png", "image/png", b"img");
        store.append_message(&id, Message::user("   ", vec![attachment]));
        assert_eq!(store.session(&id).unwrap().title, DEFAULT_TITLE);
    }

    #[test]
    fn append_updates_last_modified_and_preserves_order() {
        let mut store = SessionStore::new();
        let id = store.create_session().id.clone();
        let created = store.session(&id).unwrap().last_modified;
        store.append_message(&id, Message::new(Role::User, "one"));
        store.append_message(&id, Message::new(Role::Assistant, "two"));
        let session = store.session(&id).unwrap();
        assert!(session.last_modified >= created);
        let contents: Vec<&str> = session.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["one", "two"]);
    }

    #[test]
    fn stale_active_id_is_dropped_on_load() {
        let sessions = vec![Session::new()];
        let store = SessionStore::from_sessions(sessions, Some("gone".into()));
        assert_eq!(store.active_session_id, None);
    }
}
