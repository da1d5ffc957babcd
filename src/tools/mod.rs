//! Caller-side helpers for answering tool calls.

pub mod registry;
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::{FnTool, FunctionTool};
