//! Runtime for executing conversation sessions
//!
//! Each session runs as its own task that exclusively owns the message log.
//! Everyone else talks to it through channels: commands in, client events
//! out over broadcast, and immutable snapshots over a watch channel.

mod executor;


pub use executor::ConversationRuntime;

use crate::resolver::ResponseResolver;
use crate::state_machine::{ConvContext, ConvState};
use crate::store::{Message, MessageLog};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch, RwLock};

/// Type alias for production runtime with a shared resolver
pub type ProductionRuntime = ConversationRuntime<Arc<dyn ResponseResolver>>;

const COMMAND_CHANNEL_SIZE: usize = 32;
const BROADCAST_CHANNEL_SIZE: usize = 128;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Session {0} is no longer running")]
    Closed(String),
}

/// User commands accepted by a session
#[derive(Debug, Clone)]
pub enum Command {
    Submit { text: String },
    NewConversation,
}

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Init {
        session: SessionSummary,
        messages: Vec<Message>,
        awaiting_reply: bool,
    },
    Message {
        message: Message,
    },
    StateChange {
        state: ConvState,
    },
    ReplyDone,
    ConversationReset {
        title: String,
        description: String,
    },
}

/// Listing entry for a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub message_count: usize,
    pub state: &'static str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Point-in-time copy of a session, published after every change
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session: SessionSummary,
    pub messages: Vec<Message>,
    pub state: ConvState,
}

impl SessionSnapshot {
    pub fn build(
        context: &ConvContext,
        state: &ConvState,
        log: &MessageLog,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session: SessionSummary {
                id: context.session_id.clone(),
                slug: context.slug.clone(),
                title: log.title(),
                message_count: log.len(),
                state: state.label(),
                created_at: context.created_at,
                updated_at,
            },
            messages: log.messages().to_vec(),
            state: state.clone(),
        }
    }

    pub fn awaiting_reply(&self) -> bool {
        self.state.is_awaiting_reply()
    }
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub command_tx: mpsc::Sender<Command>,
    pub broadcast_tx: broadcast::Sender<SseEvent>,
    pub snapshot_rx: watch::Receiver<SessionSnapshot>,
}

/// Manager for all session runtimes
pub struct SessionManager {
    resolver: Arc<dyn ResponseResolver>,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionManager {
    pub fn new(resolver: Arc<dyn ResponseResolver>) -> Self {
        Self {
            resolver,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a new session seeded with the greeting
    pub async fn create(&self, slug: &str) -> SessionSummary {
        let id = uuid::Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;

        let slug = if sessions
            .values()
            .any(|h| h.snapshot_rx.borrow().session.slug == slug)
        {
            let suffix: String = id.chars().take(8).collect();
            format!("{slug}-{suffix}")
        } else {
            slug.to_string()
        };

        let context = ConvContext::new(&id, &slug);
        let log = MessageLog::new();
        let initial = SessionSnapshot::build(&context, &ConvState::Idle, &log, context.created_at);
        let summary = initial.session.clone();

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CHANNEL_SIZE);
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);

        let runtime: ProductionRuntime = ConversationRuntime::new(
            context,
            log,
            self.resolver.clone(),
            command_rx,
            broadcast_tx.clone(),
            snapshot_tx,
        );

        let session_id = id.clone();
        tokio::spawn(async move {
            runtime.run().await;
            tracing::info!(session_id = %session_id, "Session runtime finished");
        });

        sessions.insert(
            id,
            SessionHandle {
                command_tx,
                broadcast_tx,
                snapshot_rx,
            },
        );

        tracing::info!(session_id = %summary.id, slug = %summary.slug, "Session created");
        summary
    }

    async fn handle(&self, session_id: &str) -> Result<SessionHandle, SessionError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    /// All sessions, most recently updated first
    pub async fn list(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .read()
            .await
            .values()
            .map(|h| h.snapshot_rx.borrow().session.clone())
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        summaries
    }

    pub async fn snapshot(&self, session_id: &str) -> Result<SessionSnapshot, SessionError> {
        let handle = self.handle(session_id).await?;
        let snapshot = handle.snapshot_rx.borrow().clone();
        Ok(snapshot)
    }

    pub async fn snapshot_by_slug(&self, slug: &str) -> Result<SessionSnapshot, SessionError> {
        self.sessions
            .read()
            .await
            .values()
            .map(|h| h.snapshot_rx.borrow().clone())
            .find(|s| s.session.slug == slug)
            .ok_or_else(|| SessionError::NotFound(slug.to_string()))
    }

    /// Send a command to a session
    pub async fn send(&self, session_id: &str, command: Command) -> Result<(), SessionError> {
        let handle = self.handle(session_id).await?;
        handle
            .command_tx
            .send(command)
            .await
            .map_err(|_| SessionError::Closed(session_id.to_string()))
    }

    /// Subscribe to session updates.
    ///
    /// The receiver is created before the snapshot is taken, so an event may
    /// show up in both but none is lost between them.
    pub async fn subscribe(
        &self,
        session_id: &str,
    ) -> Result<(SessionSnapshot, broadcast::Receiver<SseEvent>), SessionError> {
        let handle = self.handle(session_id).await?;
        let rx = handle.broadcast_tx.subscribe();
        let snapshot = handle.snapshot_rx.borrow().clone();
        Ok((snapshot, rx))
    }
}
