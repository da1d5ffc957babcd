//! Convenience re-exports for common use.

pub use crate::api::{AssistantsApi, Run, RunStatus, Thread};
#[cfg(feature = "openai")]
pub use crate::api::openai::OpenAiAssistantsClient;
pub use crate::config::ClientConfig;
pub use crate::conversation::{
    event_channel, Conversation, ConversationEvent, EventSink, PendingToolRequest, ToolCall,
    ToolOutput,
};
pub use crate::error::{Result, ThreadError};
pub use crate::tools::{FnTool, FunctionTool, ToolRegistry};
