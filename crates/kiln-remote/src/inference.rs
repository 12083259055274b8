//! HTTP inference collaborator: chat, completion, and analysis.

use crate::{build_client, error_from_response, map_transport_error};
use async_trait::async_trait;
use kiln_core::Result;
use kiln_core::config::WorkspaceConfig;
use kiln_core::language::Language;
use kiln_core::remote::{AnalysisKind, ChatRequest, InferenceService};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Chat/completion/analysis over the sidecar backend.
#[derive(Clone)]
pub struct HttpInferenceService {
    client: Client,
    base_url: String,
}

impl HttpInferenceService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &WorkspaceConfig) -> Self {
        Self::new(config.backend.base_url.clone())
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
struct CompleteBody<'a> {
    code: &'a str,
    cursor_position: usize,
    language: Language,
}

#[derive(Deserialize)]
struct CompleteResponse {
    completion: String,
}

#[derive(Serialize)]
struct AnalyzeBody<'a> {
    code: &'a str,
    language: Language,
    analysis_type: AnalysisKind,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    analysis: String,
}

#[async_trait]
impl InferenceService for HttpInferenceService {
    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(request)
            .send()
            .await
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            return Err(error_from_response("chat", response).await);
        }
        let parsed: ChatResponse = response.json().await.map_err(map_transport_error)?;
        Ok(parsed
            .response
            .or(parsed.message)
            .unwrap_or_else(|| "No response received".to_string()))
    }

    async fn complete(
        &self,
        code: &str,
        cursor_offset: usize,
        language: Language,
    ) -> Result<String> {
        tracing::debug!(%language, cursor_offset, "requesting completion");
        let response = self
            .client
            .post(self.url("/api/code/complete"))
            .json(&CompleteBody {
                code,
                cursor_position: cursor_offset,
                language,
            })
            .send()
            .await
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            return Err(error_from_response("completion", response).await);
        }
        let parsed: CompleteResponse = response.json().await.map_err(map_transport_error)?;
        Ok(parsed.completion)
    }

    async fn analyze(&self, code: &str, language: Language, kind: AnalysisKind) -> Result<String> {
        tracing::debug!(%language, %kind, "requesting analysis");
        let response = self
            .client
            .post(self.url("/api/code/analyze"))
            .json(&AnalyzeBody {
                code,
                language,
                analysis_type: kind,
            })
            .send()
            .await
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            return Err(error_from_response("analysis", response).await);
        }
        let parsed: AnalyzeResponse = response.json().await.map_err(map_transport_error)?;
        Ok(parsed.analysis)
    }
}
