//! HTTP file collaborator.

use crate::{build_client, error_from_response, map_transport_error};
use async_trait::async_trait;
use kiln_core::Result;
use kiln_core::config::WorkspaceConfig;
use kiln_core::remote::{DirEntry, FileStore};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// File read/write/listing over the sidecar backend.
#[derive(Clone)]
pub struct HttpFileStore {
    client: Client,
    base_url: String,
}

impl HttpFileStore {
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

#[derive(Serialize)]
struct WriteFileBody<'a> {
    path: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct PathBody<'a> {
    path: &'a str,
}

#[derive(Deserialize)]
struct ReadFileResponse {
    content: String,
}

#[derive(Deserialize)]
struct ListFilesResponse {
    #[serde(default)]
    files: Vec<DirEntry>,
}

#[async_trait]
impl FileStore for HttpFileStore {
    async fn read_file(&self, path: &str) -> Result<String> {
        let response = self
            .client
            .get(self.url("/api/files/read"))
            .query(&[("path", path)])
            .send()
            .await
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            return Err(error_from_response(path, response).await);
        }
        let parsed: ReadFileResponse = response.json().await.map_err(map_transport_error)?;
        Ok(parsed.content)
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url("/api/files/write"))
            .json(&WriteFileBody { path, content })
            .send()
            .await
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            return Err(error_from_response(path, response).await);
        }
        Ok(())
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>> {
        let response = self
            .client
            .get(self.url("/api/files/list"))
            .query(&[("path", path)])
            .send()
            .await
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            return Err(error_from_response(path, response).await);
        }
        let parsed: ListFilesResponse = response.json().await.map_err(map_transport_error)?;
        Ok(parsed.files)
    }

    async fn create_directory(&self, path: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url("/api/files/create-directory"))
            .json(&PathBody { path })
            .send()
            .await
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            return Err(error_from_response(path, response).await);
        }
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url("/api/files/delete"))
            .query(&[("path", path)])
            .send()
            .await
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            return Err(error_from_response(path, response).await);
        }
        Ok(())
    }
}
