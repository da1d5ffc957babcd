//! Tests for the tool registry and closure tools.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use threadkit::api::types::*;
use threadkit::conversation::{PendingToolRequest, ToolCall, ToolOutput};
use threadkit::error::ThreadError;
use threadkit::tools::{FnTool, FunctionTool, ToolRegistry};

struct ProductCatalog;

#[async_trait]
impl FunctionTool for ProductCatalog {
    fn name(&self) -> &str {
        "consult_product_catalog"
    }

    async fn execute(&self, args: &serde_json::Value) -> Result<serde_json::Value, ThreadError> {
        match args.get("id").and_then(|v| v.as_str()) {
            Some("home") => Ok(json!({"id": "home", "covers": ["fire", "flood"]})),
            Some(other) => Err(ThreadError::tool(self.name(), format!("no product {other}"))),
            None => Err(ThreadError::tool(self.name(), "missing id")),
        }
    }
}

fn registry() -> ToolRegistry {
    ToolRegistry::new()
        .with_tool(Arc::new(ProductCatalog))
        .with_tool(Arc::new(FnTool::new("echo", |args| async move { Ok::<_, ThreadError>(args) })))
}

fn call(id: &str, name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall {
        id: id.into(),
        name: name.into(),
        arguments,
    }
}

#[tokio::test]
async fn execute_dispatches_by_name() {
    let tools = registry();

    let output = tools
        .execute(&call("call_1", "consult_product_catalog", json!({"id": "home"})))
        .await
        .unwrap();

    assert_eq!(
        output,
        ToolOutput::new("call_1", json!({"id": "home", "covers": ["fire", "flood"]}))
    );
    assert_eq!(tools.len(), 2);
}

#[tokio::test]
async fn execute_reports_unknown_tool() {
    let err = registry()
        .execute(&call("call_1", "get_weather", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, ThreadError::UnknownTool(ref name) if name == "get_weather"));
}

#[tokio::test]
async fn execute_all_keeps_call_order() {
    let outputs = registry()
        .execute_all(&[
            call("call_1", "echo", json!("first")),
            call("call_2", "consult_product_catalog", json!({"id": "home"})),
            call("call_3", "echo", json!("third")),
        ])
        .await
        .unwrap();

    let ids: Vec<&str> = outputs.iter().map(|o| o.call_id.as_str()).collect();
    assert_eq!(ids, vec!["call_1", "call_2", "call_3"]);
    assert_eq!(outputs[2].value, json!("third"));
}

#[tokio::test]
async fn execute_all_fails_on_tool_error() {
    let err = registry()
        .execute_all(&[
            call("call_1", "echo", json!(1)),
            call("call_2", "consult_product_catalog", json!({"id": "boat"})),
        ])
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Tool execution error: consult_product_catalog: no product boat"
    );
}

#[tokio::test]
async fn resolve_executes_and_submits() {
    let api = Arc::new(MockAssistantsApi::new());
    let mut request = PendingToolRequest::new(
        api.clone(),
        THREAD_ID,
        RUN_ID,
        RequiredAction::submit_tool_outputs(vec![RequiredToolCall::function(
            "call_1",
            "echo",
            r#"{"hello":"world"}"#,
        )]),
    )
    .unwrap();

    registry().resolve(&mut request).await.unwrap();

    assert!(request.is_submitted());
    assert_eq!(
        api.submissions(),
        vec![SubmitToolOutputsRequest {
            tool_outputs: vec![ToolOutputPayload {
                tool_call_id: "call_1".into(),
                output: r#"{"hello":"world"}"#.into(),
            }],
        }]
    );
}
