//! Bounded per-session conversation history.
//!
//! The registry lives as long as its owner (the [`RagSystem`]) and keeps
//! nothing on disk.
//!
//! [`RagSystem`]: crate::rag::RagSystem

use std::collections::{HashMap, VecDeque};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tutor_core::{AppError, AppResult};
use tutor_llm::Role;

/// One recorded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMessage {
    pub role: Role,
    pub content: String,
}

impl SessionMessage {
    fn render(&self) -> String {
        let speaker = match self.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
        };
        format!("{}: {}", speaker, self.content)
    }
}

/// Process-lifetime session registry.
pub struct SessionManager {
    max_messages: usize,
    sessions: RwLock<HashMap<String, VecDeque<SessionMessage>>>,
}

impl SessionManager {
    /// Keep at most `max_history` exchanges (two messages each) per session.
    pub fn new(max_history: usize) -> Self {
        Self {
            max_messages: max_history.saturating_mul(2),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, HashMap<String, VecDeque<SessionMessage>>>> {
        self.sessions
            .read()
            .map_err(|_| AppError::Other("session registry lock poisoned".to_string()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, HashMap<String, VecDeque<SessionMessage>>>> {
        self.sessions
            .write()
            .map_err(|_| AppError::Other("session registry lock poisoned".to_string()))
    }

    /// A fresh session id that is not yet registered.
    pub fn new_session_id() -> String {
        format!("session-{}", uuid::Uuid::new_v4())
    }

    /// Register a new empty session and return its id.
    pub fn create_session(&self) -> AppResult<String> {
        let id = Self::new_session_id();
        self.write()?.insert(id.clone(), VecDeque::new());
        tracing::debug!("Created session {}", id);
        Ok(id)
    }

    /// Append one user/assistant exchange, evicting the oldest messages
    /// beyond the window.
    ///
    /// An id the registry has not seen starts a new session.
    pub fn add_exchange(&self, session_id: &str, user: &str, assistant: &str) -> AppResult<()> {
        let mut sessions = self.write()?;
        let history = sessions.entry(session_id.to_string()).or_default();

        history.push_back(SessionMessage {
            role: Role::User,
            content: user.to_string(),
        });
        history.push_back(SessionMessage {
            role: Role::Assistant,
            content: assistant.to_string(),
        });
        while history.len() > self.max_messages {
            history.pop_front();
        }
        Ok(())
    }

    /// Recent history rendered as `User: …` / `Assistant: …` lines.
    ///
    /// `None` for an unknown or empty session.
    pub fn get_history(&self, session_id: &str) -> AppResult<Option<String>> {
        let sessions = self.read()?;
        Ok(sessions
            .get(session_id)
            .filter(|history| !history.is_empty())
            .map(|history| {
                history
                    .iter()
                    .map(SessionMessage::render)
                    .collect::<Vec<_>>()
                    .join("\n")
            }))
    }

    /// Raw messages of a session, oldest first.
    pub fn messages(&self, session_id: &str) -> AppResult<Vec<SessionMessage>> {
        Ok(self
            .read()?
            .get(session_id)
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default())
    }

    /// Forget a session. Returns whether it existed.
    pub fn clear_session(&self, session_id: &str) -> AppResult<bool> {
        Ok(self.write()?.remove(session_id).is_some())
    }

    pub fn session_count(&self) -> AppResult<usize> {
        Ok(self.read()?.len())
    }
}
