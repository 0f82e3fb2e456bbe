//! Message types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

/// A block of rendered message content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    Heading { text: String },
    /// Titled passage, e.g. a numbered part of a report excerpt
    Section { title: String, body: String },
    /// Placeholder for a rendered figure; the UI draws it from the attachment
    Figure { caption: String, alt: String },
}

impl ContentBlock {
    pub fn text(s: impl Into<String>) -> Self {
        ContentBlock::Text { text: s.into() }
    }

    pub fn heading(s: impl Into<String>) -> Self {
        ContentBlock::Heading { text: s.into() }
    }

    pub fn section(title: impl Into<String>, body: impl Into<String>) -> Self {
        ContentBlock::Section {
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn figure(caption: impl Into<String>, alt: impl Into<String>) -> Self {
        ContentBlock::Figure {
            caption: caption.into(),
            alt: alt.into(),
        }
    }

    /// Plain-text rendering of the block
    pub fn plain_text(&self) -> String {
        match self {
            ContentBlock::Text { text } | ContentBlock::Heading { text } => text.clone(),
            ContentBlock::Section { title, body } => format!("{title}\n{body}"),
            ContentBlock::Figure { caption, .. } => caption.clone(),
        }
    }
}

/// Kind of artifact a reply carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Chart,
    Document,
}

/// Typed reference to an artifact; opaque to the conversation core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub reference: String,
}

impl Attachment {
    pub fn chart(reference: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Chart,
            reference: reference.into(),
        }
    }

    pub fn document(reference: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Document,
            reference: reference.into(),
        }
    }
}

/// A message in the conversation log.
///
/// Only the store constructs these: `id` and `timestamp` are stamped on
/// append and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub sender: Sender,
    pub content: Vec<ContentBlock>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Concatenated plain text of all content blocks
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(ContentBlock::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
