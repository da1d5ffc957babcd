//! Conversations: one remote thread, its current run, and the run poller.
//!
//! A [`Conversation`] appends a user message, starts a run, and polls the
//! run until it finishes or needs tool outputs. Every status change becomes a
//! [`ConversationEvent`] delivered to the registered [`EventSink`].
//!
//! Polling is a re-schedule-after-completion loop: wait one interval, check
//! the run, act on the result, repeat. At most one such cycle is active per
//! conversation.

pub mod events;
pub mod pending;
pub mod state;

pub use events::{event_channel, ConversationEvent, EventSink};
pub use pending::{PendingToolRequest, ToolCall, ToolOutput};
pub use state::{assistant_text, transition, Transition};

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{AssistantsApi, CreateMessageRequest, CreateRunRequest, Run, Thread};
use crate::config::{ClientConfig, DEFAULT_POLL_INTERVAL};
use crate::error::ThreadError;

/// A remote thread plus the local poller for its current run.
///
/// Dropping a conversation stops its poller, like [`Conversation::stop`].
pub struct Conversation {
    api: Arc<dyn AssistantsApi>,
    thread: Thread,
    poll_interval: Duration,
    assistant_id: Option<String>,
    sink: Option<EventSink>,
    state: Arc<PollState>,
}

impl Conversation {
    /// Allocate a new remote thread.
    pub async fn create(api: Arc<dyn AssistantsApi>) -> Result<Self, ThreadError> {
        let thread = api.create_thread().await?;
        debug!(thread_id = %thread.id, "thread created");
        Ok(Self::attach(api, thread))
    }

    /// Wrap a thread that already exists remotely.
    pub fn attach(api: Arc<dyn AssistantsApi>, thread: Thread) -> Self {
        Self {
            api,
            thread,
            poll_interval: DEFAULT_POLL_INTERVAL,
            assistant_id: None,
            sink: None,
            state: Arc::new(PollState::default()),
        }
    }

    /// Register the observer. Runs started afterwards report to it.
    pub fn with_event_sink(mut self, sink: EventSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Assistant used by [`Conversation::query_default`].
    pub fn with_assistant_id(mut self, assistant_id: impl Into<String>) -> Self {
        self.assistant_id = Some(assistant_id.into());
        self
    }

    /// Apply the poll interval and default assistant of a [`ClientConfig`].
    pub fn with_config(mut self, config: &ClientConfig) -> Self {
        if let Some(assistant_id) = &config.assistant_id {
            self.assistant_id = Some(assistant_id.clone());
        }
        self.with_poll_interval(config.poll_interval)
    }

    /// Route events into a fresh channel, replacing any registered sink.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ConversationEvent> {
        let (sink, rx) = event_channel();
        self.sink = Some(sink);
        rx
    }

    pub fn thread(&self) -> &Thread {
        &self.thread
    }

    pub fn thread_id(&self) -> &str {
        &self.thread.id
    }

    /// Id of the most recently started run, if any.
    pub fn current_run_id(&self) -> Option<String> {
        lock(&self.state.current_run).clone()
    }

    /// Whether a polling cycle is active.
    pub fn is_polling(&self) -> bool {
        lock(&self.state.active).is_some()
    }

    /// Append `text` as a user message and start a run of `assistant_id`.
    ///
    /// Returns once polling has started; the outcome arrives as events.
    pub async fn query(
        &self,
        text: impl Into<String>,
        assistant_id: impl Into<String>,
    ) -> Result<(), ThreadError> {
        let message = CreateMessageRequest::user(text);
        self.api.create_message(self.thread_id(), &message).await?;

        let request = CreateRunRequest {
            assistant_id: assistant_id.into(),
        };
        let run = self.api.create_run(self.thread_id(), &request).await?;
        debug!(
            thread_id = %self.thread.id,
            run_id = %run.id,
            assistant_id = %request.assistant_id,
            "run started"
        );

        *lock(&self.state.current_run) = Some(run.id.clone());
        self.context().start(run.id);
        Ok(())
    }

    /// [`Conversation::query`] with the configured default assistant.
    ///
    /// Fails with [`ThreadError::Configuration`] before any remote call when
    /// no assistant was configured.
    pub async fn query_default(&self, text: impl Into<String>) -> Result<(), ThreadError> {
        let assistant_id = self.assistant_id.clone().ok_or_else(|| {
            ThreadError::Configuration("No default assistant (set OPENAI_ASSISTANT_ID)".into())
        })?;
        self.query(text, assistant_id).await
    }

    /// Halt local polling. Idempotent.
    ///
    /// The remote run keeps going; use [`Conversation::cancel`] to stop it
    /// too. A pending tool request issued before the stop no longer resumes
    /// polling when its outputs are submitted.
    pub fn stop(&self) {
        self.state.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(cycle) = lock(&self.state.active).take() {
            debug!(thread_id = %self.thread.id, run_id = %cycle.run_id, "polling stopped");
            cycle.cancel();
        }
    }

    /// Stop polling and ask the remote to cancel the current run.
    ///
    /// Returns `Ok(None)` when no run was ever started.
    pub async fn cancel(&self) -> Result<Option<Run>, ThreadError> {
        self.stop();
        let Some(run_id) = self.current_run_id() else {
            return Ok(None);
        };
        let run = self.api.cancel_run(self.thread_id(), &run_id).await?;
        debug!(thread_id = %self.thread.id, run_id = %run.id, status = %run.status, "run cancel requested");
        Ok(Some(run))
    }

    /// Text of the latest assistant message on the thread.
    pub async fn latest_assistant_message(&self) -> Result<String, ThreadError> {
        fetch_assistant_message(self.api.as_ref(), self.thread_id()).await
    }

    fn context(&self) -> PollContext {
        PollContext {
            api: Arc::clone(&self.api),
            thread_id: self.thread.id.clone(),
            interval: self.poll_interval,
            sink: self.sink.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl Drop for Conversation {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn fetch_assistant_message(
    api: &dyn AssistantsApi,
    thread_id: &str,
) -> Result<String, ThreadError> {
    let messages = api.list_messages(thread_id).await?;
    assistant_text(&messages.data)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Poller bookkeeping shared between a conversation and its cycles.
#[derive(Default)]
struct PollState {
    active: Mutex<Option<PollCycle>>,
    next_cycle: AtomicU64,
    /// Bumped by `stop` and by every new cycle; cycles and resume signals
    /// from an older epoch go quiet.
    epoch: AtomicU64,
    current_run: Mutex<Option<String>>,
}

impl PollState {
    /// Drop the active cycle if it is still `cycle`.
    fn release(&self, cycle: u64) {
        let mut active = lock(&self.active);
        if active.as_ref().is_some_and(|c| c.id == cycle) {
            *active = None;
        }
    }
}

/// Handle on one running poll loop.
///
/// Cancelling ends the loop at its next await point. A tick that is already
/// past its last await cannot be stopped, but its events carry a retired
/// epoch and are dropped.
struct PollCycle {
    id: u64,
    run_id: String,
    token: CancellationToken,
}

impl PollCycle {
    fn cancel(self) {
        self.token.cancel();
    }
}

/// Everything a poll loop needs, detached from the `Conversation` borrow.
#[derive(Clone)]
struct PollContext {
    api: Arc<dyn AssistantsApi>,
    thread_id: String,
    interval: Duration,
    sink: Option<EventSink>,
    state: Arc<PollState>,
}

impl PollContext {
    /// Replace any active cycle with a fresh one polling `run_id`.
    fn start(&self, run_id: String) {
        let mut active = lock(&self.state.active);
        if let Some(previous) = active.take() {
            previous.cancel();
        }

        let id = self.state.next_cycle.fetch_add(1, Ordering::SeqCst);
        let epoch = self.state.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        tokio::spawn(self.clone().poll(id, epoch, run_id.clone(), token.clone()));
        *active = Some(PollCycle { id, run_id, token });
    }

    async fn poll(self, cycle: u64, epoch: u64, run_id: String, token: CancellationToken) {
        loop {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(self.interval) => {}
            }

            let step = tokio::select! {
                _ = token.cancelled() => return,
                step = self.tick(cycle, epoch, &run_id) => step,
            };
            if step.is_break() {
                return;
            }
        }
    }

    async fn tick(&self, cycle: u64, epoch: u64, run_id: &str) -> ControlFlow<()> {
        let run = match self.api.retrieve_run(&self.thread_id, run_id).await {
            Ok(run) => run,
            Err(err) => {
                warn!(thread_id = %self.thread_id, run_id, error = %err, "run status check failed");
                self.state.release(cycle);
                self.emit(epoch, ConversationEvent::Error(err));
                return ControlFlow::Break(());
            }
        };

        let next = transition(&run);
        debug!(thread_id = %self.thread_id, run_id, status = %run.status, "run status");

        if next.stops_polling() {
            self.state.release(cycle);
        }

        match next {
            Transition::Idle => ControlFlow::Continue(()),
            Transition::Notify(_) => {
                if let Some(event) = state::status_event(&run) {
                    self.emit(epoch, event);
                }
                ControlFlow::Continue(())
            }
            Transition::Finish(_) => {
                if let Some(event) = state::status_event(&run) {
                    self.emit(epoch, event);
                }
                ControlFlow::Break(())
            }
            Transition::Suspend(action) => {
                let api = Arc::clone(&self.api);
                match PendingToolRequest::new(api, &self.thread_id, run_id, action) {
                    Ok(request) => {
                        let request = request.on_submitted(self.resume_signal(epoch, run_id));
                        self.emit(epoch, ConversationEvent::RequiresAction(request));
                    }
                    Err(err) => self.emit(epoch, ConversationEvent::Error(err)),
                }
                ControlFlow::Break(())
            }
            Transition::Complete => {
                self.emit(epoch, ConversationEvent::Completed);
                match fetch_assistant_message(self.api.as_ref(), &self.thread_id).await {
                    Ok(text) => self.emit(epoch, ConversationEvent::Message(text)),
                    Err(err) => {
                        warn!(thread_id = %self.thread_id, run_id, error = %err, "reply fetch failed");
                        self.emit(epoch, ConversationEvent::Error(err));
                    }
                }
                ControlFlow::Break(())
            }
        }
    }

    /// Restart polling `run_id` once its outputs are in, unless the
    /// conversation was stopped or moved on to another run meanwhile.
    fn resume_signal(&self, epoch: u64, run_id: &str) -> impl FnOnce() + Send + Sync + 'static {
        let ctx = self.clone();
        let run_id = run_id.to_string();
        move || {
            let current = lock(&ctx.state.current_run).clone();
            if ctx.state.epoch.load(Ordering::SeqCst) != epoch
                || current.as_deref() != Some(run_id.as_str())
            {
                debug!(thread_id = %ctx.thread_id, run_id = %run_id, "not resuming stale run");
                return;
            }
            debug!(thread_id = %ctx.thread_id, run_id = %run_id, "resuming polling");
            ctx.start(run_id);
        }
    }

    fn emit(&self, epoch: u64, event: ConversationEvent) {
        if self.state.epoch.load(Ordering::SeqCst) != epoch {
            debug!(thread_id = %self.thread_id, event = event.name(), "dropping event from retired cycle");
            return;
        }
        if let Some(sink) = &self.sink {
            sink(event);
        }
    }
}
