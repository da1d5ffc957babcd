//! Function tool trait and closure-based tool wrapper.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ThreadError;

/// A caller-defined function the assistant can invoke.
#[async_trait]
pub trait FunctionTool: Send + Sync {
    /// Tool name (must match the name the assistant was configured with).
    fn name(&self) -> &str;

    /// Execute the tool with the call's decoded arguments.
    async fn execute(&self, args: &serde_json::Value) -> Result<serde_json::Value, ThreadError>;
}

type ToolHandler = dyn Fn(
        serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, ThreadError>> + Send>>
    + Send
    + Sync;

/// Closure-based tool for quick tool creation.
pub struct FnTool {
    name: String,
    handler: Arc<ToolHandler>,
}

impl FnTool {
    /// Create a tool from an async closure.
    pub fn new<F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, ThreadError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }
}

#[async_trait]
impl FunctionTool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, args: &serde_json::Value) -> Result<serde_json::Value, ThreadError> {
        (self.handler)(args.clone()).await
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool").field("name", &self.name).finish()
    }
}
