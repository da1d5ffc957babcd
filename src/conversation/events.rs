//! Events a conversation reports to its observer.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::RunError;
use crate::error::ThreadError;

use super::pending::PendingToolRequest;

/// Observer callback receiving every event of a conversation, in order.
pub type EventSink = Arc<dyn Fn(ConversationEvent) + Send + Sync>;

/// Something that happened to the conversation's current run.
#[derive(Debug)]
pub enum ConversationEvent {
    Queued,
    InProgress,
    /// The run is paused until the request's outputs are submitted.
    RequiresAction(PendingToolRequest),
    Cancelling,
    Cancelled,
    Failed { last_error: Option<RunError> },
    Completed,
    /// The assistant's reply, sent right after `Completed`.
    Message(String),
    Expired,
    Incomplete,
    /// A status check or reply fetch failed; polling has ended.
    Error(ThreadError),
}

impl ConversationEvent {
    /// Stable event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction(_) => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Failed { .. } => "failed",
            Self::Completed => "completed",
            Self::Message(_) => "message",
            Self::Expired => "expired",
            Self::Incomplete => "incomplete",
            Self::Error(_) => "error",
        }
    }

    /// Whether no further event follows for this run.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            Self::Cancelled
                | Self::Failed { .. }
                | Self::Message(_)
                | Self::Expired
                | Self::Incomplete
                | Self::Error(_)
        )
    }
}

/// Build a sink that forwards events into an unbounded channel.
pub fn event_channel() -> (EventSink, mpsc::UnboundedReceiver<ConversationEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sink: EventSink = Arc::new(move |event| {
        let _ = tx.send(event);
    });
    (sink, rx)
}
