//! Session controller: sequences the store, the model orchestrator, and
//! persistence in response to user actions.
//!
//! One submission may be in flight at a time, globally. The `Flight` state
//! field gates every `submit`; a second attempt while busy is rejected
//! outright rather than queued, so two assistant replies can never race onto
//! stale history. Speech synthesis is a separate resource and is not gated
//! here.

use std::sync::Mutex;

use thiserror::Error;
use tracing::warn;

use crate::api::client::GenerateModel;
use crate::core::message::{Attachment, Message, MAX_ATTACHMENT_BYTES};
use crate::core::persistence::StorePersistence;
use crate::core::session::{Session, SessionStore};

/// Assistant reply substituted when the model call fails. The failure itself
/// is logged and swallowed; it must never take the process down.
pub const MODEL_FAILURE_REPLY: &str =
    "Sorry, something went wrong while contacting the tutor. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flight {
    Idle,
    Busy,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("a submission is already in flight")]
    Busy,
    /// Nothing was left to send. Carries the per-attachment drop notices so
    /// they still reach the user when every attachment was oversized.
    #[error("nothing to send; type a message or attach a file")]
    EmptySubmission { warnings: Vec<String> },
    #[error("unknown session: {0}")]
    UnknownSession(String),
}

#[derive(Debug)]
pub struct SubmitOutcome {
    /// User-visible notices, currently one per dropped oversized attachment.
    pub warnings: Vec<String>,
    pub user_message_id: String,
    pub assistant_message_id: String,
}

struct State {
    store: SessionStore,
    theme: Option<String>,
    flight: Flight,
}

pub struct ChatController {
    state: Mutex<State>,
    model: Box<dyn GenerateModel>,
    persistence: StorePersistence,
}

impl ChatController {
    /// Load the store from durable storage and wire up the model seam.
    pub fn new(model: Box<dyn GenerateModel>, persistence: StorePersistence) -> Self {
        let (store, theme) = persistence.load();
        Self {
            state: Mutex::new(State {
                store,
                theme,
                flight: Flight::Idle,
            }),
            model,
            persistence,
        }
    }

    pub fn create_session(&self) -> Session {
        let mut state = self.lock_state();
        let session = state.store.create_session().clone();
        self.persist(&state);
        session
    }

    /// Idempotent; deleting the active session re-selects the most recently
    /// modified survivor.
    pub fn delete_session(&self, id: &str) {
        let mut state = self.lock_state();
        state.store.delete_session(id);
        self.persist(&state);
    }

    pub fn set_active(&self, id: &str) -> bool {
        let mut state = self.lock_state();
        let changed = state.store.set_active(id);
        if changed {
            self.persist(&state);
        }
        changed
    }

    pub fn set_theme(&self, theme: Option<String>) {
        let mut state = self.lock_state();
        state.theme = theme;
        self.persist(&state);
    }

    pub fn theme(&self) -> Option<String> {
        self.lock_state().theme.clone()
    }

    pub fn active_session(&self) -> Option<Session> {
        self.lock_state().store.active_session().cloned()
    }

    pub fn session(&self, id: &str) -> Option<Session> {
        self.lock_state().store.session(id).cloned()
    }

    /// (id, title) pairs in iteration order, newest first.
    pub fn session_summaries(&self) -> Vec<(String, String)> {
        self.lock_state()
            .store
            .sessions
            .iter()
            .map(|s| (s.id.clone(), s.title.clone()))
            .collect()
    }

    pub fn is_busy(&self) -> bool {
        self.lock_state().flight == Flight::Busy
    }

    /// Validate, append the user message, and ask the model for a reply.
    ///
    /// The user message is appended (and persisted) before the model call
    /// starts, so it always precedes its assistant reply. Oversized
    /// attachments are dropped individually and reported as warnings without
    /// blocking the rest of the submission. A failed model call becomes a
    /// fixed fallback assistant message, never an error to the caller.
    pub async fn submit(
        &self,
        session_id: &str,
        text: &str,
        attachments: Vec<Attachment>,
    ) -> Result<SubmitOutcome, SubmitError> {
        let (history, kept, warnings, user_message_id) = {
            let mut state = self.lock_state();
            if state.flight == Flight::Busy {
                return Err(SubmitError::Busy);
            }
            let Some(session) = state.store.session(session_id) else {
                return Err(SubmitError::UnknownSession(session_id.to_string()));
            };
            let history = session.messages.clone();

            let mut kept = Vec::new();
            let mut warnings = Vec::new();
            for attachment in attachments {
                if attachment.byte_len() > MAX_ATTACHMENT_BYTES {
                    warnings.push(format!(
                        "Attachment '{}' exceeds the 10 MiB limit and was not sent.",
                        attachment.name
                    ));
                } else {
                    kept.push(attachment);
                }
            }
            if text.trim().is_empty() && kept.is_empty() {
                return Err(SubmitError::EmptySubmission { warnings });
            }

            state.flight = Flight::Busy;
            let user_message = Message::user(text, kept.clone());
            let user_message_id = user_message.id.clone();
            state.store.append_message(session_id, user_message);
            self.persist(&state);
            (history, kept, warnings, user_message_id)
        };

        let reply = self.model.generate(&history, text, &kept).await;
        let assistant_message = match reply {
            Ok(reply) => Message::assistant(reply.answer, reply.reasoning_trace),
            Err(e) => {
                warn!("model call failed, substituting fallback reply: {e}");
                Message::assistant(MODEL_FAILURE_REPLY, None)
            }
        };
        let assistant_message_id = assistant_message.id.clone();

        {
            let mut state = self.lock_state();
            state.store.append_message(session_id, assistant_message);
            state.flight = Flight::Idle;
            self.persist(&state);
        }

        Ok(SubmitOutcome {
            warnings,
            user_message_id,
            assistant_message_id,
        })
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Write failures are logged and dropped; the next mutation rewrites the
    /// whole store anyway.
    fn persist(&self, state: &State) {
        if let Err(e) = self.persistence.save(&state.store, state.theme.as_deref()) {
            warn!("failed to persist session store: {e}");
        }
    }
}
