// src/services/session_manager.rs
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::{Mutex, MutexGuard, RwLock};
use tokio::task::JoinHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: Role::Model, text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

/// Model settings a session is bound to when it is first created.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelBinding {
    pub model: String,
    pub system_instruction: String,
    pub generation: GenerationConfig,
}

/// Mutable part of a session. Only reachable through [`Session::lock`].
#[derive(Debug)]
pub struct Conversation {
    history: Vec<Turn>,
    last_active: Instant,
}

impl Conversation {
    fn new() -> Self {
        Self { history: Vec::new(), last_active: Instant::now() }
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    // Append a user turn followed by the model's reply and touch last_active.
    pub fn record_exchange(&mut self, user: impl Into<String>, model: impl Into<String>) -> usize {
        self.history.push(Turn::user(user));
        self.history.push(Turn::model(model));
        self.last_active = Instant::now();
        self.history.len()
    }
}

#[derive(Debug)]
pub struct Session {
    id: String,
    binding: ModelBinding,
    conversation: Mutex<Conversation>,
}

impl Session {
    pub fn new(id: impl Into<String>, binding: ModelBinding) -> Self {
        Self {
            id: id.into(),
            binding,
            conversation: Mutex::new(Conversation::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn binding(&self) -> &ModelBinding {
        &self.binding
    }

    /// Lock the conversation for the length of one turn.
    ///
    /// Turns on the same session queue up here, so a reply is always
    /// generated against the history left by the previous turn.
    pub async fn lock(&self) -> MutexGuard<'_, Conversation> {
        self.conversation.lock().await
    }

    /// Snapshot of the history. Waits for any turn in flight.
    pub async fn history(&self) -> Vec<Turn> {
        self.conversation.lock().await.history.clone()
    }
}

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<RwLock<HashMap<String, Arc<Session>>>>,
    ttl: Option<Duration>,
}

impl Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SessionManager {
    // Create a new manager. `None` keeps sessions for the life of the process.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Return the session for `id`, creating it with `binding` if unseen.
    ///
    /// The binding is only used on creation; an existing session keeps the
    /// one it was created with.
    pub async fn get_or_create(&self, id: &str, binding: &ModelBinding) -> Arc<Session> {
        {
            let guard = self.inner.read().await;
            if let Some(session) = guard.get(id) {
                return Arc::clone(session);
            }
        }
        let mut guard = self.inner.write().await;
        let session = guard
            .entry(id.to_string())
            .or_insert_with(|| {
                tracing::info!(session_id = %id, model = %binding.model, "session created");
                Arc::new(Session::new(id, binding.clone()))
            });
        Arc::clone(session)
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Session>> {
        let guard = self.inner.read().await;
        guard.get(id).cloned()
    }

    /// Get a copy of the session history
    pub async fn history(&self, id: &str) -> Option<Vec<Turn>> {
        let session = self.get(id).await?;
        Some(session.history().await)
    }

    /// Remove sessions idle longer than ttl. Returns number removed.
    ///
    /// A session is kept while any handle to it is out, since a turn may
    /// have resolved it and not yet taken the conversation lock.
    pub async fn purge_expired(&self) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let mut guard = self.inner.write().await;
        let now = Instant::now();
        let before = guard.len();
        guard.retain(|_, s| {
            if Arc::strong_count(s) > 1 {
                return true;
            }
            match s.conversation.try_lock() {
                Ok(conv) => now.duration_since(conv.last_active) < ttl,
                Err(_) => true,
            }
        });
        before - guard.len()
    }

    /// Run `purge_expired` every `period` until the handle is aborted.
    pub fn spawn_reaper(&self, period: Duration) -> JoinHandle<()> {
        let sessions = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let removed = sessions.purge_expired().await;
                if removed > 0 {
                    let remaining = sessions.len().await;
                    tracing::info!(removed, remaining, "expired sessions purged");
                }
            }
        })
    }

    /// Number of sessions
    pub async fn len(&self) -> usize {
        let guard = self.inner.read().await;
        guard.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
