//! Events that can occur in a conversation

use super::state::RequestId;
use crate::resolver::Reply;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserMessage {
        text: String,
        request_id: RequestId,
    },
    NewConversation,

    // Resolver events
    ReplyReady {
        request_id: RequestId,
        reply: Reply,
    },
}
