//! Effects produced by state transitions

use super::state::RequestId;
use crate::resolver::Reply;
use crate::store::{Attachment, ContentBlock, Sender};
use serde::Serialize;

pub const RESET_TITLE: &str = "Nouvelle conversation";
pub const RESET_DESCRIPTION: &str = "Une nouvelle conversation a été démarrée";

/// Effects to be executed after state transition
#[derive(Debug, Clone)]
pub enum Effect {
    /// Append a message to the session log
    AppendMessage {
        sender: Sender,
        content: Vec<ContentBlock>,
        attachments: Vec<Attachment>,
    },

    /// Publish the new state to readers
    PublishState,

    /// Resolve a reply (spawns as background task)
    RequestReply {
        request_id: RequestId,
        utterance: String,
    },

    /// Abort in-flight reply tasks
    AbortReplies { request_ids: Vec<RequestId> },

    /// Clear the log and reseed the greeting
    ResetLog,

    /// Notify connected clients
    NotifyClient(ClientNotice),
}

/// User-visible notices that are not messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientNotice {
    /// All outstanding replies have landed
    ReplyDone,
    /// Acknowledgment toast for "new conversation"
    ConversationReset { title: String, description: String },
}

impl Effect {
    pub fn append_user_message(text: &str) -> Self {
        Effect::AppendMessage {
            sender: Sender::User,
            content: vec![ContentBlock::text(text)],
            attachments: vec![],
        }
    }

    pub fn append_reply(reply: Reply) -> Self {
        Effect::AppendMessage {
            sender: Sender::Assistant,
            content: reply.content,
            attachments: reply.attachments,
        }
    }

    pub fn notify_reply_done() -> Self {
        Effect::NotifyClient(ClientNotice::ReplyDone)
    }

    pub fn notify_reset() -> Self {
        Effect::NotifyClient(ClientNotice::ConversationReset {
            title: RESET_TITLE.to_string(),
            description: RESET_DESCRIPTION.to_string(),
        })
    }
}
