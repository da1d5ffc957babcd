//! Pure run-status transition table and reply extraction.

use crate::api::{MessageContent, MessageRole, RequiredAction, Run, RunStatus, ThreadMessage};
use crate::error::ThreadError;

use super::events::ConversationEvent;

/// What one status check asks the poller to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Announce the status and keep polling.
    Notify(RunStatus),
    /// `requires_action` without a payload: nothing to do yet.
    Idle,
    /// Stop polling and hand the action to the caller.
    Suspend(RequiredAction),
    /// Stop polling and announce a terminal status.
    Finish(RunStatus),
    /// Stop polling, announce completion, then fetch the reply.
    Complete,
}

impl Transition {
    pub fn stops_polling(&self) -> bool {
        matches!(self, Self::Suspend(_) | Self::Finish(_) | Self::Complete)
    }
}

/// Map a run snapshot to the poller's next step.
pub fn transition(run: &Run) -> Transition {
    match run.status {
        RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling => {
            Transition::Notify(run.status)
        }
        RunStatus::RequiresAction => match &run.required_action {
            Some(action) => Transition::Suspend(action.clone()),
            None => Transition::Idle,
        },
        RunStatus::Cancelled | RunStatus::Failed | RunStatus::Expired | RunStatus::Incomplete => {
            Transition::Finish(run.status)
        }
        RunStatus::Completed => Transition::Complete,
    }
}

/// Event announcing a plain status; `None` for statuses that carry data of
/// their own (`requires_action`) or announce in two steps (`completed`).
pub(crate) fn status_event(run: &Run) -> Option<ConversationEvent> {
    let event = match run.status {
        RunStatus::Queued => ConversationEvent::Queued,
        RunStatus::InProgress => ConversationEvent::InProgress,
        RunStatus::Cancelling => ConversationEvent::Cancelling,
        RunStatus::Cancelled => ConversationEvent::Cancelled,
        RunStatus::Failed => ConversationEvent::Failed {
            last_error: run.last_error.clone(),
        },
        RunStatus::Expired => ConversationEvent::Expired,
        RunStatus::Incomplete => ConversationEvent::Incomplete,
        RunStatus::RequiresAction | RunStatus::Completed => return None,
    };
    Some(event)
}

/// Text of the assistant's reply, given messages most recent first.
pub fn assistant_text(messages: &[ThreadMessage]) -> Result<String, ThreadError> {
    let message = match messages.first() {
        Some(m) if m.role == MessageRole::Assistant => m,
        _ => return Err(ThreadError::NoResponse),
    };

    match message.content.first() {
        None => Err(ThreadError::EmptyResponse),
        Some(MessageContent::Text { text }) => Ok(text.value.clone()),
        Some(other) => Err(ThreadError::NonTextResponse {
            kind: other.kind().to_string(),
        }),
    }
}
