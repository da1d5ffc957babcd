//! Shared test helpers and a recording mock of the Assistants API.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Barrier, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;

use threadkit::api::types::*;
use threadkit::api::AssistantsApi;
use threadkit::conversation::ConversationEvent;
use threadkit::error::ThreadError;

pub const THREAD_ID: &str = "thread_abc123";
pub const RUN_ID: &str = "run_abc123";

/// One recorded remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    CreateThread,
    CreateMessage {
        thread_id: String,
        request: CreateMessageRequest,
    },
    CreateRun {
        thread_id: String,
        request: CreateRunRequest,
    },
    RetrieveRun {
        thread_id: String,
        run_id: String,
    },
    SubmitToolOutputs {
        thread_id: String,
        run_id: String,
        request: SubmitToolOutputsRequest,
    },
    ListMessages {
        thread_id: String,
    },
    CancelRun {
        thread_id: String,
        run_id: String,
    },
}

/// Mock API that records calls and replays queued run snapshots.
///
/// Once the queue is empty, `retrieve_run` keeps answering `in_progress`.
#[derive(Default)]
pub struct MockAssistantsApi {
    runs: Mutex<VecDeque<Result<Run, ThreadError>>>,
    messages: Mutex<Vec<ThreadMessage>>,
    failures: Mutex<HashMap<&'static str, ThreadError>>,
    run_ids: Mutex<VecDeque<String>>,
    retrieve_gate: Mutex<Option<Arc<Barrier>>>,
    calls: Mutex<Vec<ApiCall>>,
}

impl MockAssistantsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next snapshot `retrieve_run` returns.
    pub fn queue_run(&self, run: Run) {
        self.runs.lock().unwrap().push_back(Ok(run));
    }

    pub fn queue_retrieve_error(&self, err: ThreadError) {
        self.runs.lock().unwrap().push_back(Err(err));
    }

    /// Id given to the next run `create_run` starts (default `RUN_ID`).
    pub fn queue_run_id(&self, id: &str) {
        self.run_ids.lock().unwrap().push_back(id.to_string());
    }

    /// Block the next `retrieve_run` on `gate`, synchronously, twice: once
    /// on entry and once before returning. Its snapshot is taken on entry.
    pub fn hold_next_retrieve(&self, gate: Arc<Barrier>) {
        *self.retrieve_gate.lock().unwrap() = Some(gate);
    }

    /// Messages returned by `list_messages`, most recent first.
    pub fn set_messages(&self, messages: Vec<ThreadMessage>) {
        *self.messages.lock().unwrap() = messages;
    }

    /// Make the next call of `op` fail with `err`.
    pub fn fail_next(&self, op: &'static str, err: ThreadError) {
        self.failures.lock().unwrap().insert(op, err);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn retrieve_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ApiCall::RetrieveRun { .. }))
            .count()
    }

    pub fn submissions(&self) -> Vec<SubmitToolOutputsRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::SubmitToolOutputs { request, .. } => Some(request),
                _ => None,
            })
            .collect()
    }

    fn record(&self, op: &'static str, call: ApiCall) -> Result<(), ThreadError> {
        self.calls.lock().unwrap().push(call);
        match self.failures.lock().unwrap().remove(op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AssistantsApi for MockAssistantsApi {
    async fn create_thread(&self) -> Result<Thread, ThreadError> {
        self.record("create_thread", ApiCall::CreateThread)?;
        Ok(Thread {
            id: THREAD_ID.to_string(),
            created_at: Utc::now(),
            metadata: None,
        })
    }

    async fn create_message(
        &self,
        thread_id: &str,
        request: &CreateMessageRequest,
    ) -> Result<ThreadMessage, ThreadError> {
        self.record(
            "create_message",
            ApiCall::CreateMessage {
                thread_id: thread_id.to_string(),
                request: request.clone(),
            },
        )?;
        Ok(message(
            request.role,
            vec![MessageContent::text(request.content.clone())],
        ))
    }

    async fn create_run(
        &self,
        thread_id: &str,
        request: &CreateRunRequest,
    ) -> Result<Run, ThreadError> {
        self.record(
            "create_run",
            ApiCall::CreateRun {
                thread_id: thread_id.to_string(),
                request: request.clone(),
            },
        )?;
        let mut created = run(RunStatus::Queued);
        if let Some(id) = self.run_ids.lock().unwrap().pop_front() {
            created.id = id;
        }
        Ok(created)
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ThreadError> {
        self.record(
            "retrieve_run",
            ApiCall::RetrieveRun {
                thread_id: thread_id.to_string(),
                run_id: run_id.to_string(),
            },
        )?;
        let snapshot = self
            .runs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(run(RunStatus::InProgress)));
        let gate = self.retrieve_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.wait();
            gate.wait();
        }
        snapshot
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        request: &SubmitToolOutputsRequest,
    ) -> Result<Run, ThreadError> {
        self.record(
            "submit_tool_outputs",
            ApiCall::SubmitToolOutputs {
                thread_id: thread_id.to_string(),
                run_id: run_id.to_string(),
                request: request.clone(),
            },
        )?;
        Ok(run(RunStatus::Queued))
    }

    async fn list_messages(&self, thread_id: &str) -> Result<MessageList, ThreadError> {
        self.record(
            "list_messages",
            ApiCall::ListMessages {
                thread_id: thread_id.to_string(),
            },
        )?;
        Ok(MessageList {
            data: self.messages.lock().unwrap().clone(),
            first_id: None,
            last_id: None,
            has_more: false,
        })
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ThreadError> {
        self.record(
            "cancel_run",
            ApiCall::CancelRun {
                thread_id: thread_id.to_string(),
                run_id: run_id.to_string(),
            },
        )?;
        Ok(run(RunStatus::Cancelling))
    }
}

pub fn run(status: RunStatus) -> Run {
    Run {
        id: RUN_ID.to_string(),
        thread_id: THREAD_ID.to_string(),
        assistant_id: "asst_1".to_string(),
        status,
        required_action: None,
        last_error: None,
        created_at: Utc::now(),
    }
}

/// A `requires_action` snapshot asking for the given (id, name, arguments) calls.
pub fn run_requiring(calls: &[(&str, &str, &str)]) -> Run {
    let mut snapshot = run(RunStatus::RequiresAction);
    snapshot.required_action = Some(RequiredAction::submit_tool_outputs(
        calls
            .iter()
            .map(|(id, name, args)| RequiredToolCall::function(*id, *name, *args))
            .collect(),
    ));
    snapshot
}

pub fn message(role: MessageRole, content: Vec<MessageContent>) -> ThreadMessage {
    ThreadMessage {
        id: "msg_1".to_string(),
        thread_id: THREAD_ID.to_string(),
        role,
        content,
        run_id: None,
        created_at: Utc::now(),
    }
}

pub fn assistant_message(text: &str) -> ThreadMessage {
    message(MessageRole::Assistant, vec![MessageContent::text(text)])
}

/// Next event, failing the test if the channel closed.
pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<ConversationEvent>) -> ConversationEvent {
    rx.recv().await.expect("event channel closed")
}

/// Let (paused) time run long enough for many poll intervals.
pub async fn idle_for_a_while() {
    tokio::time::sleep(std::time::Duration::from_secs(30)).await;
}
