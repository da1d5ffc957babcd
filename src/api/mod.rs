//! The remote Assistants API boundary.

pub mod types;

#[cfg(feature = "openai")]
pub mod http;
#[cfg(feature = "openai")]
pub mod openai;

use async_trait::async_trait;

use crate::error::ThreadError;

pub use types::{
    CreateMessageRequest, CreateRunRequest, MessageContent, MessageList, MessageRole,
    RequiredAction, RequiredToolCall, Run, RunError, RunStatus, SubmitToolOutputsRequest, Thread,
    ThreadMessage, ToolOutputPayload,
};

/// Operations the conversation core needs from the remote service.
///
/// One implementation is shared (behind an `Arc`) by every conversation and
/// pending tool request spawned from it, so it must be `Send + Sync`.
#[async_trait]
pub trait AssistantsApi: Send + Sync {
    /// Allocate a new, empty thread.
    async fn create_thread(&self) -> Result<Thread, ThreadError>;

    /// Append a message to a thread.
    async fn create_message(
        &self,
        thread_id: &str,
        request: &CreateMessageRequest,
    ) -> Result<ThreadMessage, ThreadError>;

    /// Start a run of an assistant over a thread.
    async fn create_run(
        &self,
        thread_id: &str,
        request: &CreateRunRequest,
    ) -> Result<Run, ThreadError>;

    /// Fetch the current snapshot of a run.
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ThreadError>;

    /// Answer a run's pending `submit_tool_outputs` action.
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        request: &SubmitToolOutputsRequest,
    ) -> Result<Run, ThreadError>;

    /// List a thread's messages, most recent first.
    async fn list_messages(&self, thread_id: &str) -> Result<MessageList, ThreadError>;

    /// Ask the remote to cancel a run.
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ThreadError>;
}
