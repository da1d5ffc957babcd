//! A paused run waiting for tool outputs.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::types::SUBMIT_TOOL_OUTPUTS;
use crate::api::{AssistantsApi, RequiredAction, SubmitToolOutputsRequest, ToolOutputPayload};
use crate::error::ThreadError;

/// A tool invocation requested by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// The caller's result for one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub call_id: String,
    pub value: serde_json::Value,
}

impl ToolOutput {
    pub fn new(call_id: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            call_id: call_id.into(),
            value,
        }
    }

    /// Build an output from any serializable value.
    pub fn json<T: Serialize + ?Sized>(
        call_id: impl Into<String>,
        value: &T,
    ) -> Result<Self, ThreadError> {
        Ok(Self::new(call_id, serde_json::to_value(value)?))
    }
}

type SubmitSignal = Box<dyn FnOnce() + Send + Sync>;

/// One `requires_action` episode of a run.
///
/// Outputs can be submitted once; a successful submission fires the
/// signal registered with [`PendingToolRequest::on_submitted`], which is how
/// the owning conversation resumes polling.
pub struct PendingToolRequest {
    api: Arc<dyn AssistantsApi>,
    thread_id: String,
    run_id: String,
    action: RequiredAction,
    tool_calls: Vec<ToolCall>,
    on_submitted: Option<SubmitSignal>,
    submitted: bool,
}

impl fmt::Debug for PendingToolRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingToolRequest")
            .field("thread_id", &self.thread_id)
            .field("run_id", &self.run_id)
            .field("tool_calls", &self.tool_calls)
            .field("submitted", &self.submitted)
            .finish()
    }
}

impl PendingToolRequest {
    /// Validate the action and decode every call's arguments.
    ///
    /// Never touches the remote.
    pub fn new(
        api: Arc<dyn AssistantsApi>,
        thread_id: impl Into<String>,
        run_id: impl Into<String>,
        action: RequiredAction,
    ) -> Result<Self, ThreadError> {
        if action.kind != SUBMIT_TOOL_OUTPUTS {
            warn!(kind = %action.kind, "unsupported required action");
            return Err(ThreadError::UnsupportedAction(action.kind));
        }

        let tool_calls = action
            .submit_tool_outputs
            .iter()
            .flat_map(|payload| payload.tool_calls.iter())
            .map(|call| -> Result<ToolCall, ThreadError> {
                let arguments = serde_json::from_str(&call.function.arguments).map_err(
                    |source| ThreadError::InvalidToolArguments {
                        call_id: call.id.clone(),
                        source,
                    },
                )?;
                Ok(ToolCall {
                    id: call.id.clone(),
                    name: call.function.name.clone(),
                    arguments,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            api,
            thread_id: thread_id.into(),
            run_id: run_id.into(),
            action,
            tool_calls,
            on_submitted: None,
            submitted: false,
        })
    }

    /// Register the one-shot completion signal.
    pub fn on_submitted(mut self, signal: impl FnOnce() + Send + Sync + 'static) -> Self {
        self.on_submitted = Some(Box::new(signal));
        self
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.tool_calls
    }

    pub fn required_action(&self) -> &RequiredAction {
        &self.action
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Send outputs back for this (thread, run) pair.
    ///
    /// Values are re-serialized to compact JSON text. Call-id coverage is
    /// not checked locally. A failed submission can be retried; after a
    /// successful one every call fails with [`ThreadError::AlreadySubmitted`].
    pub async fn submit_outputs(&mut self, outputs: Vec<ToolOutput>) -> Result<(), ThreadError> {
        if self.submitted {
            return Err(ThreadError::AlreadySubmitted);
        }

        let request = SubmitToolOutputsRequest {
            tool_outputs: outputs
                .into_iter()
                .map(|output| ToolOutputPayload {
                    tool_call_id: output.call_id,
                    output: output.value.to_string(),
                })
                .collect(),
        };

        self.api
            .submit_tool_outputs(&self.thread_id, &self.run_id, &request)
            .await?;
        self.submitted = true;
        debug!(
            thread_id = %self.thread_id,
            run_id = %self.run_id,
            outputs = request.tool_outputs.len(),
            "tool outputs submitted"
        );

        if let Some(signal) = self.on_submitted.take() {
            signal();
        }
        Ok(())
    }
}
