use crate::core::search::MediaStore;
use crate::services::StoreError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Object-storage client listing a provider's media files.
///
/// Files live in one bucket, prefixed by the record's folder key
/// (`{folder}/image.jpg`). Listing an absent folder is an empty result,
/// not an error.
pub struct MediaStorageClient {
    endpoint: String,
    api_key: String,
    project_id: String,
    bucket_id: String,
    client: Client,
}

impl MediaStorageClient {
    pub fn new(endpoint: String, api_key: String, project_id: String, bucket_id: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            project_id,
            bucket_id,
            client,
        }
    }

    fn view_url(&self, file_id: &str) -> String {
        format!(
            "{}/storage/buckets/{}/files/{}/view?project={}",
            self.endpoint, self.bucket_id, file_id, self.project_id
        )
    }
}

#[async_trait]
impl MediaStore for MediaStorageClient {
    async fn list_urls(&self, folder_key: &str) -> Result<Vec<String>, StoreError> {
        let queries = vec![format!("startsWith(\"name\", \"{}/\")", folder_key)];
        let queries_json = serde_json::to_string(&queries)
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        let encoded_queries = urlencoding::encode(&queries_json).into_owned();

        let url = format!(
            "{}/storage/buckets/{}/files?queries={}",
            self.endpoint, self.bucket_id, encoded_queries
        );

        tracing::debug!("Listing media for folder {}", folder_key);

        let response = self
            .client
            .get(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            // Bucket folder does not exist for this record.
            return Ok(Vec::new());
        }

        if !response.status().is_success() {
            return Err(StoreError::Api(format!(
                "media store returned {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;

        let files = body
            .get("files")
            .and_then(|f| f.as_array())
            .ok_or_else(|| StoreError::InvalidResponse("missing files array".to_string()))?;

        let urls = files
            .iter()
            .filter_map(|file| file.get("$id").and_then(Value::as_str))
            .map(|id| self.view_url(id))
            .collect();

        Ok(urls)
    }
}
