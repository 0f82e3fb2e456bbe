//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use crate::resolver::{resolve, Reply, Topic};
use crate::store::{ContentBlock, Sender};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_utterance() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Quelle est la situation de l'inflation ?".to_string()),
        Just("Montrez-moi le rapport".to_string()),
        Just("bonjour".to_string()),
        "[a-zA-Z][a-zA-Z ]{0,29}",
    ]
}

fn arb_blank() -> impl Strategy<Value = String> {
    "[ \t\n]{0,8}"
}

/// Abstract operations; request ids are filled in by the driver
#[derive(Debug, Clone)]
enum Op {
    Submit(String),
    SubmitBlank(String),
    /// Resolve the nth outstanding request (modulo the queue length)
    Resolve(usize),
    Reset,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => arb_utterance().prop_map(Op::Submit),
        1 => arb_blank().prop_map(Op::SubmitBlank),
        4 => (0usize..8).prop_map(Op::Resolve),
        1 => Just(Op::Reset),
    ]
}

// ============================================================================
// Driver
// ============================================================================

/// Minimal effect interpreter tracking what the log would contain
#[derive(Default)]
struct Model {
    state: ConvState,
    next_request_id: RequestId,
    /// (sender, `request_id` the message belongs to)
    log: Vec<(Sender, RequestId)>,
    in_flight: Vec<RequestId>,
    reply_done_count: usize,
}

impl Model {
    fn apply(&mut self, event: Event, origin: RequestId) -> Result<(), TransitionError> {
        let result = transition(&self.state, event)?;
        self.state = result.new_state;
        for effect in result.effects {
            match effect {
                Effect::AppendMessage {
                    sender: Sender::User,
                    ..
                } => self.log.push((Sender::User, origin)),
                Effect::AppendMessage {
                    sender: Sender::Assistant,
                    content,
                    ..
                } => self.log.push((Sender::Assistant, reply_owner(&content))),
                Effect::RequestReply { request_id, .. } => self.in_flight.push(request_id),
                Effect::AbortReplies { request_ids } => {
                    self.in_flight.retain(|id| !request_ids.contains(id));
                }
                Effect::ResetLog => self.log.clear(),
                Effect::NotifyClient(ClientNotice::ReplyDone) => self.reply_done_count += 1,
                _ => {}
            }
        }
        Ok(())
    }

    fn run(&mut self, op: Op) {
        match op {
            Op::Submit(text) | Op::SubmitBlank(text) => {
                self.next_request_id += 1;
                let id = self.next_request_id;
                let _ = self.apply(
                    Event::UserMessage {
                        text,
                        request_id: id,
                    },
                    id,
                );
            }
            Op::Resolve(n) => {
                if self.in_flight.is_empty() {
                    return;
                }
                let id = self.in_flight.remove(n % self.in_flight.len());
                let _ = self.apply(
                    Event::ReplyReady {
                        request_id: id,
                        reply: tagged_reply(id),
                    },
                    id,
                );
            }
            Op::Reset => {
                let _ = self.apply(Event::NewConversation, 0);
            }
        }
    }
}

/// Reply whose text names the request it answers
fn tagged_reply(request_id: RequestId) -> Reply {
    Reply {
        topic: Topic::General,
        content: vec![ContentBlock::text(format!("reply-{request_id}"))],
        attachments: vec![],
    }
}

fn reply_owner(content: &[ContentBlock]) -> RequestId {
    content
        .iter()
        .map(ContentBlock::plain_text)
        .find_map(|text| text.strip_prefix("reply-").and_then(|id| id.parse().ok()))
        .unwrap_or(RequestId::MAX)
}

fn is_valid_state(state: &ConvState) -> bool {
    match state {
        ConvState::Idle => true,
        ConvState::AwaitingReply { pending } => {
            !pending.is_empty()
                && pending.windows(2).all(|w| w[0].request_id < w[1].request_id)
                // The head is never left ready: it would have been released
                && !pending[0].is_ready()
        }
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Invariant 1: Valid state after any sequence of operations
    #[test]
    fn prop_operations_preserve_validity(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let mut model = Model::default();
        for op in ops {
            model.run(op);
            prop_assert!(is_valid_state(&model.state), "Invalid state: {:?}", model.state);
        }
    }

    // Invariant 2: Blank submissions never change anything
    #[test]
    fn prop_blank_submission_is_noop(
        prefix in proptest::collection::vec(arb_op(), 0..10),
        blank in arb_blank()
    ) {
        let mut model = Model::default();
        for op in prefix {
            model.run(op);
        }
        let before_state = model.state.clone();
        let result = transition(&before_state, Event::UserMessage { text: blank, request_id: 999 }).unwrap();
        prop_assert_eq!(result.new_state, before_state);
        prop_assert!(result.effects.is_empty());
    }

    // Invariant 3: Replies land in submission order, one per user message
    #[test]
    fn prop_replies_follow_submission_order(
        utterances in proptest::collection::vec(arb_utterance(), 1..6),
        order in proptest::collection::vec(0usize..8, 0..12)
    ) {
        let mut model = Model::default();
        for text in utterances.iter().cloned() {
            model.run(Op::Submit(text));
        }
        for n in order {
            model.run(Op::Resolve(n));
        }
        // Drain whatever is left
        while !model.in_flight.is_empty() {
            model.run(Op::Resolve(0));
        }

        prop_assert_eq!(model.state.clone(), ConvState::Idle);
        let users: Vec<RequestId> = model.log.iter().filter(|(s, _)| *s == Sender::User).map(|(_, id)| *id).collect();
        let replies: Vec<RequestId> = model.log.iter().filter(|(s, _)| *s == Sender::Assistant).map(|(_, id)| *id).collect();
        prop_assert_eq!(users.len(), utterances.len());
        prop_assert_eq!(&users, &replies);
        prop_assert!(model.reply_done_count >= 1);
    }

    // Invariant 3b: Completing newest-first holds every reply until the oldest lands
    #[test]
    fn prop_newest_first_completion_is_held(
        utterances in proptest::collection::vec(arb_utterance(), 2..6)
    ) {
        let mut model = Model::default();
        for text in utterances.iter().cloned() {
            model.run(Op::Submit(text));
        }
        let count = model.in_flight.len();
        for remaining in (1..count).rev() {
            model.run(Op::Resolve(remaining));
            let replies = model.log.iter().filter(|(s, _)| *s == Sender::Assistant).count();
            prop_assert_eq!(replies, 0);
        }
        model.run(Op::Resolve(0));

        let replies: Vec<RequestId> = model.log.iter().filter(|(s, _)| *s == Sender::Assistant).map(|(_, id)| *id).collect();
        let expected: Vec<RequestId> = (1..=count as RequestId).collect();
        prop_assert_eq!(replies, expected);
        prop_assert_eq!(model.reply_done_count, 1);
    }

    // Invariant 4: Reset always lands in Idle and aborts exactly what was pending
    #[test]
    fn prop_reset_discards_pending(prefix in proptest::collection::vec(arb_op(), 0..20)) {
        let mut model = Model::default();
        for op in prefix {
            model.run(op);
        }
        let pending = model.state.pending_ids();
        let result = transition(&model.state, Event::NewConversation).unwrap();
        prop_assert_eq!(result.new_state, ConvState::Idle);

        let aborted: Vec<RequestId> = result
            .effects
            .iter()
            .filter_map(|e| match e {
                Effect::AbortReplies { request_ids } => Some(request_ids.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        prop_assert_eq!(aborted, pending);
    }

    // Invariant 5: After a reset no earlier request is accepted
    #[test]
    fn prop_stale_replies_rejected_after_reset(utterances in proptest::collection::vec(arb_utterance(), 1..5)) {
        let mut model = Model::default();
        for text in utterances {
            model.run(Op::Submit(text));
        }
        let stale = model.state.pending_ids();
        model.run(Op::Reset);

        for id in stale {
            let result = transition(&model.state, Event::ReplyReady { request_id: id, reply: resolve("bonjour") });
            prop_assert_eq!(result.unwrap_err(), TransitionError::UnknownRequest(id));
        }
    }
}
