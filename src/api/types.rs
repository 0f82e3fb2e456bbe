//! API request and response types

use crate::runtime::SessionSummary;
use crate::store::Message;
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// Response with a list of sessions
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
}

/// Response with a single session
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: SessionSummary,
}

/// Response with session and messages
#[derive(Debug, Serialize)]
pub struct SessionWithMessagesResponse {
    pub session: SessionSummary,
    pub messages: Vec<Message>,
    pub awaiting_reply: bool,
}

/// Response for chat action
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub queued: bool,
}

/// Acknowledgment shown after a conversation reset
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub title: String,
    pub description: String,
}

/// Suggested prompts for an empty conversation
#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<&'static str>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
