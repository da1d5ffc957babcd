//! Name-keyed tool lookup and dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::debug;

use crate::conversation::{PendingToolRequest, ToolCall, ToolOutput};
use crate::error::ThreadError;

use super::tool::FunctionTool;

/// Tools available to answer a run's tool calls.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn FunctionTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn FunctionTool>) -> &mut Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn FunctionTool>) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn FunctionTool>> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run the tool a single call names.
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolOutput, ThreadError> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| ThreadError::UnknownTool(call.name.clone()))?;
        debug!(tool = %call.name, call_id = %call.id, "executing tool");
        let value = tool.execute(&call.arguments).await?;
        Ok(ToolOutput::new(call.id.clone(), value))
    }

    /// Run every call concurrently; outputs keep the calls' order.
    pub async fn execute_all(&self, calls: &[ToolCall]) -> Result<Vec<ToolOutput>, ThreadError> {
        try_join_all(calls.iter().map(|call| self.execute(call))).await
    }

    /// Answer a pending request with this registry's tools.
    pub async fn resolve(&self, request: &mut PendingToolRequest) -> Result<(), ThreadError> {
        let outputs = self.execute_all(request.tool_calls()).await?;
        request.submit_outputs(outputs).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}
