//! Append-only message log for a single conversation
//!
//! The log is owned by exactly one session runtime. Readers get clones.

mod types;

pub use types::*;

use chrono::Utc;

/// Greeting seeded into every new or reset conversation
pub const GREETING: &str =
    "Bonjour, je suis votre assistant BCEAO. Comment puis-je vous aider aujourd'hui ?";

/// Title used in the history listing before the user has said anything
pub const UNTITLED: &str = "Nouvelle conversation";

const TITLE_MAX_CHARS: usize = 60;

/// Ordered conversation log.
///
/// Ids come from a counter that is never rewound, so an id is not reused
/// even after `reset`.
#[derive(Debug, Clone)]
pub struct MessageLog {
    messages: Vec<Message>,
    next_id: u64,
}

impl MessageLog {
    /// Create a log seeded with the assistant greeting
    pub fn new() -> Self {
        let mut log = Self {
            messages: Vec::new(),
            next_id: 1,
        };
        log.seed_greeting();
        log
    }

    /// Append a message at the tail, stamping a fresh id and timestamp
    pub fn append(
        &mut self,
        sender: Sender,
        content: Vec<ContentBlock>,
        attachments: Vec<Attachment>,
    ) -> &Message {
        let message = Message {
            id: self.next_id,
            sender,
            content,
            timestamp: Utc::now(),
            attachments,
        };
        self.next_id += 1;
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// Discard all history and reseed the greeting
    pub fn reset(&mut self) -> &Message {
        self.messages.clear();
        self.seed_greeting()
    }

    fn seed_greeting(&mut self) -> &Message {
        self.append(Sender::Assistant, vec![ContentBlock::text(GREETING)], vec![])
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Never true for a live log: the greeting is always present
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last_id(&self) -> Option<u64> {
        self.messages.last().map(|m| m.id)
    }

    /// Display title: the first user utterance, truncated
    pub fn title(&self) -> String {
        let Some(first) = self.messages.iter().find(|m| m.sender == Sender::User) else {
            return UNTITLED.to_string();
        };
        let text = first.text();
        if text.chars().count() <= TITLE_MAX_CHARS {
            return text;
        }
        let mut title: String = text.chars().take(TITLE_MAX_CHARS).collect();
        title.push('…');
        title
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}
