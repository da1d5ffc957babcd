//! Assistants API client over HTTPS.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::{ClientConfig, DEFAULT_BASE_URL};
use crate::error::ThreadError;

use super::http::{assistants_headers, shared_client, status_to_error};
use super::types::*;
use super::AssistantsApi;

/// reqwest-backed [`AssistantsApi`].
pub struct OpenAiAssistantsClient {
    api_key: String,
    base_url: String,
    organization: Option<String>,
}

impl OpenAiAssistantsClient {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            organization: None,
        }
    }

    /// Build a client from config; fails when no API key is configured.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ThreadError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ThreadError::Configuration("Missing OPENAI_API_KEY".into()))?;
        let mut client = Self::new(api_key, Some(config.normalized_base_url().to_string()));
        client.organization = config.organization.clone();
        Ok(client)
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self) -> HeaderMap {
        assistants_headers(&self.api_key, self.organization.as_deref())
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ThreadError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let resp = shared_client()
            .post(&url)
            .headers(self.headers())
            .json(body)
            .send()
            .await?;
        decode(resp).await
    }

    async fn get<T>(&self, path: &str) -> Result<T, ThreadError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let resp = shared_client()
            .get(&url)
            .headers(self.headers())
            .send()
            .await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ThreadError> {
    let status = resp.status();
    if !status.is_success() {
        let body_text = resp.text().await.unwrap_or_default();
        return Err(status_to_error(status.as_u16(), &body_text));
    }
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl AssistantsApi for OpenAiAssistantsClient {
    async fn create_thread(&self) -> Result<Thread, ThreadError> {
        debug!("Assistants create_thread");
        self.post("/threads", &serde_json::json!({})).await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        request: &CreateMessageRequest,
    ) -> Result<ThreadMessage, ThreadError> {
        debug!(thread_id, role = %request.role, "Assistants create_message");
        self.post(&format!("/threads/{thread_id}/messages"), request)
            .await
    }

    async fn create_run(
        &self,
        thread_id: &str,
        request: &CreateRunRequest,
    ) -> Result<Run, ThreadError> {
        debug!(thread_id, assistant_id = %request.assistant_id, "Assistants create_run");
        self.post(&format!("/threads/{thread_id}/runs"), request).await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ThreadError> {
        debug!(thread_id, run_id, "Assistants retrieve_run");
        self.get(&format!("/threads/{thread_id}/runs/{run_id}")).await
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        request: &SubmitToolOutputsRequest,
    ) -> Result<Run, ThreadError> {
        debug!(
            thread_id,
            run_id,
            outputs = request.tool_outputs.len(),
            "Assistants submit_tool_outputs"
        );
        self.post(
            &format!("/threads/{thread_id}/runs/{run_id}/submit_tool_outputs"),
            request,
        )
        .await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<MessageList, ThreadError> {
        debug!(thread_id, "Assistants list_messages");
        self.get(&format!("/threads/{thread_id}/messages?order=desc"))
            .await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ThreadError> {
        debug!(thread_id, run_id, "Assistants cancel_run");
        self.post(
            &format!("/threads/{thread_id}/runs/{run_id}/cancel"),
            &serde_json::json!({}),
        )
        .await
    }
}
