//! Conversation state types

use crate::resolver::Reply;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Identifier of one accepted submission, assigned by the runtime.
///
/// Strictly increasing per session and never reused, also across resets.
pub type RequestId = u64;

/// A submission whose reply has not been appended yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingReply {
    pub request_id: RequestId,
    pub utterance: String,
    /// Reply that arrived ahead of an earlier submission's, held until its turn
    #[serde(skip_serializing)]
    pub ready: Option<Reply>,
}

impl PendingReply {
    pub fn new(request_id: RequestId, utterance: impl Into<String>) -> Self {
        Self {
            request_id,
            utterance: utterance.into(),
            ready: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_some()
    }
}

/// Conversation state
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvState {
    /// Ready for user input, no pending replies
    #[default]
    Idle,

    /// One or more replies outstanding
    AwaitingReply {
        /// Outstanding submissions in acceptance order. Never empty.
        pending: Vec<PendingReply>,
    },
}

impl ConvState {
    pub fn is_awaiting_reply(&self) -> bool {
        matches!(self, ConvState::AwaitingReply { .. })
    }

    /// Request ids still outstanding, in acceptance order
    pub fn pending_ids(&self) -> Vec<RequestId> {
        match self {
            ConvState::Idle => vec![],
            ConvState::AwaitingReply { pending } => pending.iter().map(|p| p.request_id).collect(),
        }
    }

    /// Short name for logs and listings
    pub fn label(&self) -> &'static str {
        match self {
            ConvState::Idle => "idle",
            ConvState::AwaitingReply { .. } => "awaiting_reply",
        }
    }
}

/// Context for a session (immutable identity)
#[derive(Debug, Clone)]
pub struct ConvContext {
    pub session_id: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

impl ConvContext {
    pub fn new(session_id: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            slug: slug.into(),
            created_at: Utc::now(),
        }
    }
}
