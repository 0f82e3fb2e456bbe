//! Session runtime executor

use super::{Command, SessionSnapshot, SseEvent};

use crate::resolver::ResponseResolver;
use crate::state_machine::{
    transition, ClientNotice, ConvContext, ConvState, Effect, Event, RequestId, TransitionError,
};
use crate::store::MessageLog;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

const REPLY_CHANNEL_SIZE: usize = 32;

/// Session runtime that can work with any resolver implementation
pub struct ConversationRuntime<R>
where
    R: ResponseResolver + 'static,
{
    context: ConvContext,
    state: ConvState,
    log: MessageLog,
    resolver: Arc<R>,
    command_rx: mpsc::Receiver<Command>,
    /// Completed replies come back through here
    reply_tx: mpsc::Sender<Event>,
    reply_rx: mpsc::Receiver<Event>,
    broadcast_tx: broadcast::Sender<SseEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    /// Tokens for reply tasks still running
    reply_tokens: HashMap<RequestId, CancellationToken>,
    next_request_id: RequestId,
    updated_at: DateTime<Utc>,
}

impl<R> ConversationRuntime<R>
where
    R: ResponseResolver + 'static,
{
    pub fn new(
        context: ConvContext,
        log: MessageLog,
        resolver: R,
        command_rx: mpsc::Receiver<Command>,
        broadcast_tx: broadcast::Sender<SseEvent>,
        snapshot_tx: watch::Sender<SessionSnapshot>,
    ) -> Self {
        let (reply_tx, reply_rx) = mpsc::channel(REPLY_CHANNEL_SIZE);
        let updated_at = context.created_at;
        Self {
            context,
            state: ConvState::Idle,
            log,
            resolver: Arc::new(resolver),
            command_rx,
            reply_tx,
            reply_rx,
            broadcast_tx,
            snapshot_tx,
            reply_tokens: HashMap::new(),
            next_request_id: 1,
            updated_at,
        }
    }

    /// Process commands and replies until every command sender is gone
    pub async fn run(mut self) {
        tracing::info!(session_id = %self.context.session_id, "Starting session runtime");

        loop {
            tokio::select! {
                command = self.command_rx.recv() => {
                    let Some(command) = command else { break };
                    let event = self.command_to_event(command);
                    self.process_event(event);
                }
                Some(event) = self.reply_rx.recv() => {
                    self.process_event(event);
                }
            }
        }

        for (_, token) in self.reply_tokens.drain() {
            token.cancel();
        }
        tracing::info!(session_id = %self.context.session_id, "Session runtime stopped");
    }

    fn command_to_event(&mut self, command: Command) -> Event {
        match command {
            Command::Submit { text } => {
                let request_id = self.next_request_id;
                self.next_request_id += 1;
                Event::UserMessage { text, request_id }
            }
            Command::NewConversation => Event::NewConversation,
        }
    }

    fn process_event(&mut self, event: Event) {
        if let Event::ReplyReady { request_id, .. } = &event {
            self.reply_tokens.remove(request_id);
        }

        let result = match transition(&self.state, event) {
            Ok(r) => r,
            Err(e @ TransitionError::UnknownRequest(_)) => {
                // Reply raced a reset; it was already discarded
                tracing::debug!(session_id = %self.context.session_id, error = %e, "Dropping stale reply");
                return;
            }
            Err(e) => {
                tracing::warn!(session_id = %self.context.session_id, error = %e, "Rejected event");
                return;
            }
        };

        self.state = result.new_state;
        for effect in result.effects {
            self.execute_effect(effect);
        }
    }

    /// Execute an effect
    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendMessage {
                sender,
                content,
                attachments,
            } => {
                let message = self.log.append(sender, content, attachments).clone();
                tracing::debug!(
                    session_id = %self.context.session_id,
                    message_id = message.id,
                    sender = ?message.sender,
                    "Message appended"
                );
                self.updated_at = message.timestamp;
                self.publish_snapshot();
                let _ = self.broadcast_tx.send(SseEvent::Message { message });
            }

            Effect::PublishState => {
                self.publish_snapshot();
                let _ = self.broadcast_tx.send(SseEvent::StateChange {
                    state: self.state.clone(),
                });
            }

            Effect::RequestReply {
                request_id,
                utterance,
            } => {
                let cancel_token = CancellationToken::new();
                self.reply_tokens.insert(request_id, cancel_token.clone());

                let resolver = self.resolver.clone();
                let reply_tx = self.reply_tx.clone();
                let session_id = self.context.session_id.clone();

                tokio::spawn(async move {
                    tracing::debug!(session_id = %session_id, request_id, "Resolving reply (background)");

                    // Race the resolver against cancellation
                    tokio::select! {
                        biased;

                        () = cancel_token.cancelled() => {
                            tracing::debug!(session_id = %session_id, request_id, "Reply cancelled");
                        }

                        reply = resolver.reply(&utterance) => {
                            let _ = reply_tx.send(Event::ReplyReady { request_id, reply }).await;
                        }
                    }
                });
            }

            Effect::AbortReplies { request_ids } => {
                for request_id in request_ids {
                    if let Some(token) = self.reply_tokens.remove(&request_id) {
                        token.cancel();
                    }
                }
            }

            Effect::ResetLog => {
                let greeting_id = self.log.reset().id;
                self.updated_at = Utc::now();
                tracing::info!(
                    session_id = %self.context.session_id,
                    greeting_id,
                    "Conversation reset"
                );
                self.publish_snapshot();
            }

            Effect::NotifyClient(notice) => {
                let event = match notice {
                    ClientNotice::ReplyDone => SseEvent::ReplyDone,
                    ClientNotice::ConversationReset { title, description } => {
                        SseEvent::ConversationReset { title, description }
                    }
                };
                let _ = self.broadcast_tx.send(event);
            }
        }
    }

    fn publish_snapshot(&self) {
        self.snapshot_tx.send_replace(SessionSnapshot::build(
            &self.context,
            &self.state,
            &self.log,
            self.updated_at,
        ));
    }
}
