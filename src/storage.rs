use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use postlens::config::StorageConfig;
use postlens::PostRecord;

/// JSON document-API client for the post collections backend.
///
/// The backend is the only suspending collaborator; an empty documents
/// array is a valid outcome (no data), not an error.
#[derive(Clone)]
pub struct StorageClient {
    endpoint: String,
    token: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    data: Option<DataPayload>,
    #[serde(default)]
    status: Option<StatusPayload>,
}

#[derive(Debug, Deserialize)]
struct DataPayload {
    #[serde(default)]
    documents: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    #[serde(default)]
    collections: Vec<String>,
}

impl StorageClient {
    pub fn from_config(config: &StorageConfig) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| format!("failed to build storage client: {}", err))?;
        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            client,
        })
    }

    /// Fetch every document of a collection as lenient post records.
    /// Documents that are not objects are dropped; wrongly-typed fields
    /// inside a document become absent fields on the record.
    pub async fn fetch(&self, collection: &str) -> Result<Vec<PostRecord>, String> {
        let url = format!("{}/{}", self.endpoint, collection);
        let body = serde_json::json!({ "find": {} });
        let response = self.request(&url, &body).await?;
        let documents = response
            .data
            .map(|data| data.documents)
            .unwrap_or_default();
        Ok(documents
            .into_iter()
            .filter_map(|doc| serde_json::from_value(doc).ok())
            .collect())
    }

    pub async fn list_collections(&self) -> Result<Vec<String>, String> {
        let body = serde_json::json!({ "findCollections": {} });
        let response = self.request(&self.endpoint, &body).await?;
        Ok(response
            .status
            .map(|status| status.collections)
            .unwrap_or_default())
    }

    async fn request(&self, url: &str, body: &Value) -> Result<ApiResponse, String> {
        let response = self
            .client
            .post(url)
            .header("Token", &self.token)
            .json(body)
            .send()
            .await
            .map_err(|err| format!("storage request failed: {}", err))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("storage error {}: {}", status, body));
        }

        response
            .json::<ApiResponse>()
            .await
            .map_err(|err| format!("storage response parse failed: {}", err))
    }
}
