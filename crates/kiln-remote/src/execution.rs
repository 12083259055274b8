//! HTTP execution collaborator.

use crate::{build_client, error_from_response, map_transport_error};
use async_trait::async_trait;
use kiln_core::Result;
use kiln_core::config::WorkspaceConfig;
use kiln_core::remote::{ExecutionOutcome, ExecutionService};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Remote sandbox execution over the sidecar backend.
#[derive(Clone)]
pub struct HttpExecutionService {
    client: Client,
    base_url: String,
}

impl HttpExecutionService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &WorkspaceConfig) -> Self {
        Self::new(config.backend.base_url.clone())
    }
}

#[derive(Serialize)]
struct ExecuteBody<'a> {
    executor: &'a str,
    filename: &'a str,
    workspace: &'a str,
}

/// Wire shape of the sandbox's execution report.
#[derive(Deserialize)]
struct ExecuteResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
    #[serde(default)]
    exit_code: Option<i32>,
    #[serde(default)]
    execution_time: Option<f64>,
    #[serde(default)]
    error: Option<String>,
}

impl From<ExecuteResponse> for ExecutionOutcome {
    fn from(response: ExecuteResponse) -> Self {
        Self {
            success: response.success,
            stdout: response.stdout,
            stderr: response.stderr,
            exit_code: response.exit_code,
            elapsed_seconds: response.execution_time,
            error: response.error,
        }
    }
}

#[async_trait]
impl ExecutionService for HttpExecutionService {
    async fn execute(
        &self,
        executor: &str,
        filename: &str,
        working_dir: &str,
    ) -> Result<ExecutionOutcome> {
        tracing::debug!(executor, filename, working_dir, "dispatching execution");
        let response = self
            .client
            .post(format!("{}/api/execute", self.base_url))
            .json(&ExecuteBody {
                executor,
                filename,
                workspace: working_dir,
            })
            .send()
            .await
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            return Err(error_from_response(filename, response).await);
        }
        let parsed: ExecuteResponse = response.json().await.map_err(map_transport_error)?;
        Ok(parsed.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_maps_execution_time_to_elapsed() {
        let parsed: ExecuteResponse = serde_json::from_str(
            r#"{"success": true, "stdout": "42\n", "exit_code": 0, "execution_time": 0.12}"#,
        )
        .unwrap();
        let outcome: ExecutionOutcome = parsed.into();
        assert!(outcome.success);
        assert_eq!(outcome.elapsed_seconds, Some(0.12));
        assert_eq!(outcome.exit_code, Some(0));
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_execute_body_uses_workspace_field() {
        let body = serde_json::to_value(ExecuteBody {
            executor: "python",
            filename: "main.py",
            workspace: "/proj",
        })
        .unwrap();
        assert_eq!(body["workspace"], "/proj");
        assert_eq!(body["executor"], "python");
    }
}
