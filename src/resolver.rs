//! Response resolution
//!
//! The resolver is the seam where a real inference service would plug in:
//! text goes in, a structured reply comes out.

mod canned;

#[allow(unused_imports)] // Public API re-exports
pub use canned::{classify, resolve, CannedResolver, Topic, DEFAULT_LATENCY};

use crate::store::{Attachment, ContentBlock};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Reply payload, not yet stamped with an id or timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub topic: Topic,
    pub content: Vec<ContentBlock>,
    pub attachments: Vec<Attachment>,
}

/// Common interface for reply producers
#[async_trait]
pub trait ResponseResolver: Send + Sync {
    /// Produce the reply to one utterance
    async fn reply(&self, utterance: &str) -> Reply;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<T: ResponseResolver + ?Sized> ResponseResolver for Arc<T> {
    async fn reply(&self, utterance: &str) -> Reply {
        (**self).reply(utterance).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Logging wrapper for resolvers
pub struct LoggingResolver<R> {
    inner: R,
}

impl<R: ResponseResolver> LoggingResolver<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<R: ResponseResolver> ResponseResolver for LoggingResolver<R> {
    async fn reply(&self, utterance: &str) -> Reply {
        let start = std::time::Instant::now();
        let reply = self.inner.reply(utterance).await;
        let duration = start.elapsed();

        tracing::info!(
            resolver = self.inner.name(),
            topic = ?reply.topic,
            attachments = reply.attachments.len(),
            duration_ms = %duration.as_millis(),
            "Reply resolved"
        );

        reply
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
