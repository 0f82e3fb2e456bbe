//! Pure state transition function
//!
//! Given the same state and event it always produces the same new state and
//! effects. All I/O happens in the runtime that executes the effects.

use super::state::{PendingReply, RequestId};
use super::{ConvState, Effect, Event};
use crate::resolver::Reply;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// Reply for a request that is not outstanding (e.g. discarded by a reset)
    #[error("No pending request {0}")]
    UnknownRequest(RequestId),
    #[error("Reply for request {0} already received")]
    DuplicateReply(RequestId),
}

pub fn transition(state: &ConvState, event: Event) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // User Messages
        // ============================================================

        // Blank input is ignored without a trace
        (state, Event::UserMessage { text, .. }) if text.trim().is_empty() => {
            Ok(TransitionResult::new(state.clone()))
        }

        (ConvState::Idle, Event::UserMessage { text, request_id }) => {
            let effects = accept_submission(&text, request_id);
            Ok(TransitionResult::new(ConvState::AwaitingReply {
                pending: vec![PendingReply::new(request_id, text)],
            })
            .with_effects(effects))
        }

        // Overlapping submissions queue behind the outstanding ones
        (ConvState::AwaitingReply { pending }, Event::UserMessage { text, request_id }) => {
            let effects = accept_submission(&text, request_id);
            let mut pending = pending.clone();
            pending.push(PendingReply::new(request_id, text));
            Ok(TransitionResult::new(ConvState::AwaitingReply { pending }).with_effects(effects))
        }

        // ============================================================
        // Replies
        // ============================================================
        (ConvState::AwaitingReply { pending }, Event::ReplyReady { request_id, reply }) => {
            record_reply(pending, request_id, reply)
        }

        (ConvState::Idle, Event::ReplyReady { request_id, .. }) => {
            Err(TransitionError::UnknownRequest(request_id))
        }

        // ============================================================
        // New Conversation
        // ============================================================
        (state, Event::NewConversation) => {
            let request_ids = state.pending_ids();
            let mut result = TransitionResult::new(ConvState::Idle);
            if !request_ids.is_empty() {
                result = result.with_effect(Effect::AbortReplies { request_ids });
            }
            Ok(result
                .with_effect(Effect::ResetLog)
                .with_effect(Effect::PublishState)
                .with_effect(Effect::notify_reset()))
        }
    }
}

fn accept_submission(text: &str, request_id: RequestId) -> [Effect; 3] {
    [
        Effect::append_user_message(text),
        Effect::PublishState,
        Effect::RequestReply {
            request_id,
            utterance: text.to_string(),
        },
    ]
}

/// Store a reply against its submission, then release every reply at the
/// head of the queue that is ready. Replies therefore land in submission
/// order no matter which resolves first.
fn record_reply(
    pending: &[PendingReply],
    request_id: RequestId,
    reply: Reply,
) -> Result<TransitionResult, TransitionError> {
    let mut pending = pending.to_vec();
    let slot = pending
        .iter_mut()
        .find(|p| p.request_id == request_id)
        .ok_or(TransitionError::UnknownRequest(request_id))?;
    if slot.is_ready() {
        return Err(TransitionError::DuplicateReply(request_id));
    }
    slot.ready = Some(reply);

    let releasable = pending.iter().take_while(|p| p.is_ready()).count();
    let effects: Vec<Effect> = pending
        .drain(..releasable)
        .filter_map(|p| p.ready)
        .map(Effect::append_reply)
        .collect();

    if pending.is_empty() {
        Ok(TransitionResult::new(ConvState::Idle)
            .with_effects(effects)
            .with_effect(Effect::PublishState)
            .with_effect(Effect::notify_reply_done()))
    } else {
        Ok(TransitionResult::new(ConvState::AwaitingReply { pending })
            .with_effects(effects)
            .with_effect(Effect::PublishState))
    }
}
