//! Concurrent per-user chat session store

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tagwise_core::{ChatMessage, Role};
use tagwise_telemetry::Correlation;
use tagwise_upstream::{CancellationToken, UpstreamClient, UpstreamError};

/// Mutable part of a session
#[derive(Debug, Clone)]
pub struct SessionState {
    pub messages: Vec<ChatMessage>,
    pub last_activity: DateTime<Utc>,
    /// Rolling summary of what the user has told us
    pub context_summary: String,
    /// Set on every append, cleared by a successful summarization
    pub needs_summary_update: bool,
}

/// One user's conversation. Shared as `Arc<ChatSession>`; the state has its own
/// lock so appends never take the store-wide lock.
#[derive(Debug)]
pub struct ChatSession {
    user_id: String,
    created_at: DateTime<Utc>,
    state: Mutex<SessionState>,
}

impl ChatSession {
    fn new(user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.to_string(),
            created_at: now,
            state: Mutex::new(SessionState {
                messages: Vec::new(),
                last_activity: now,
                context_summary: String::new(),
                needs_summary_update: false,
            }),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SessionState {
        self.state.lock().clone()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state.lock().messages.clone()
    }

    pub fn message_count(&self) -> usize {
        self.state.lock().messages.len()
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.state.lock().last_activity
    }

    pub fn context_summary(&self) -> String {
        self.state.lock().context_summary.clone()
    }

    pub fn needs_summary_update(&self) -> bool {
        self.state.lock().needs_summary_update
    }

    pub fn append(&self, role: Role, content: impl Into<String>) {
        let mut state = self.state.lock();
        state.messages.push(ChatMessage::new(role, content));
        state.last_activity = Utc::now();
        state.needs_summary_update = true;
    }

    /// Record a user message and its reply as one adjacent pair
    pub fn append_turn(&self, user: impl Into<String>, reply: impl Into<String>) {
        let mut state = self.state.lock();
        state.messages.push(ChatMessage::user(user));
        state.messages.push(ChatMessage::assistant(reply));
        state.last_activity = Utc::now();
        state.needs_summary_update = true;
    }

    fn touch(&self) {
        self.state.lock().last_activity = Utc::now();
    }
}

/// Map from user id to that user's active session
#[derive(Debug, Default)]
pub struct ChatSessionStore {
    sessions: RwLock<HashMap<String, Arc<ChatSession>>>,
    created: AtomicUsize,
}

impl ChatSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the user's session, creating it on first access.
    ///
    /// Lookups only take the read lock. Creation takes the write lock and checks
    /// again, so racing first accesses still produce a single session.
    pub fn get_or_create(&self, user_id: &str) -> Arc<ChatSession> {
        {
            let sessions = self.sessions.read();
            if let Some(session) = sessions.get(user_id) {
                session.touch();
                return Arc::clone(session);
            }
        }

        let mut sessions = self.sessions.write();
        if let Some(session) = sessions.get(user_id) {
            session.touch();
            return Arc::clone(session);
        }

        let session = Arc::new(ChatSession::new(user_id));
        sessions.insert(user_id.to_string(), Arc::clone(&session));
        self.created.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(user_id, active = sessions.len(), "created chat session");
        session
    }

    /// Existing session, without creating one
    pub fn get(&self, user_id: &str) -> Option<Arc<ChatSession>> {
        self.sessions.read().get(user_id).cloned()
    }

    pub fn append_message(&self, session: &ChatSession, role: Role, content: impl Into<String>) {
        session.append(role, content);
    }

    /// Refresh the session's context summary from its messages.
    ///
    /// Returns an empty summary without calling upstream when there is nothing
    /// to summarize. On failure the session is left as it was. The update flag
    /// stays set if messages arrived while the call was in flight.
    pub async fn summarize(
        &self,
        session: &ChatSession,
        client: &UpstreamClient,
        cancel: &CancellationToken,
    ) -> Result<String, UpstreamError> {
        let (messages, previous) = {
            let state = session.state.lock();
            if state.messages.is_empty() {
                return Ok(String::new());
            }
            (state.messages.clone(), state.context_summary.clone())
        };

        let correlation = Correlation::for_user(session.user_id());
        let previous = Some(previous.as_str()).filter(|p| !p.is_empty());
        let summary = client
            .summarize(&messages, previous, &correlation, cancel)
            .await?;

        let mut state = session.state.lock();
        state.context_summary = summary.clone();
        if state.messages.len() == messages.len() {
            state.needs_summary_update = false;
        }
        Ok(summary)
    }

    /// Drop the user's session; returns whether one existed
    pub fn close(&self, user_id: &str) -> bool {
        let removed = self.sessions.write().remove(user_id).is_some();
        if removed {
            tracing::debug!(user_id, "closed chat session");
        }
        removed
    }

    /// Number of active sessions
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Sessions created since the store was built, including closed ones
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}
