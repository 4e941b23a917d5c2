use crate::core::search::EntityStore;
use crate::services::StoreError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Production adapter for the OData-style entity store.
///
/// Builds `{environment}/api/data/{version}/{entity_set}` requests with
/// `$select`/`$filter` query options and the OData 4.0 headers the backend
/// requires. The bearer token is supplied per call.
pub struct DataverseClient {
    base_url: String,
    client: Client,
}

impl DataverseClient {
    pub fn new(environment_url: String, api_version: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: format!(
                "{}/api/data/{}",
                environment_url.trim_end_matches('/'),
                api_version
            ),
            client,
        }
    }

    /// Assemble an entity request URL. A filter is only attached when no id
    /// is present; an id addresses a single record and takes precedence.
    fn request_url(
        &self,
        entity_set: &str,
        select: &[&str],
        filter: Option<&str>,
        id: Option<&str>,
    ) -> String {
        let mut url = format!("{}/{}", self.base_url, entity_set);

        if let Some(id) = id {
            url.push_str(&format!("({})", id));
        }

        let mut suffix = Vec::new();
        if !select.is_empty() {
            suffix.push(format!("$select={}", select.join(",")));
        }
        if id.is_none() {
            if let Some(filter) = filter {
                suffix.push(format!("$filter={}", urlencoding::encode(filter)));
            }
        }

        if !suffix.is_empty() {
            url.push('?');
            url.push_str(&suffix.join("&"));
        }

        url
    }

    async fn execute(&self, token: &str, url: &str) -> Result<Value, StoreError> {
        tracing::debug!("Entity store request: {}", url);

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .header("OData-MaxVersion", "4.0")
            .header("OData-Version", "4.0")
            .bearer_auth(token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(url.to_string()));
        }

        if !response.status().is_success() {
            return Err(StoreError::Api(format!(
                "entity store returned {} for {}",
                response.status(),
                url
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl EntityStore for DataverseClient {
    async fn query(
        &self,
        token: &str,
        entity_set: &str,
        select: &[&str],
        filter: Option<&str>,
    ) -> Result<Vec<Value>, StoreError> {
        let url = self.request_url(entity_set, select, filter, None);
        let body = self.execute(token, &url).await?;

        match body.get("value").and_then(|v| v.as_array()) {
            Some(records) => Ok(records.clone()),
            None => Err(StoreError::InvalidResponse(
                "missing value array".to_string(),
            )),
        }
    }

    async fn query_by_id(
        &self,
        token: &str,
        entity_set: &str,
        select: &[&str],
        id: &str,
    ) -> Result<Value, StoreError> {
        let url = self.request_url(entity_set, select, None, Some(id));
        self.execute(token, &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> DataverseClient {
        DataverseClient::new(base.to_string(), "v9.1".to_string())
    }

    #[test]
    fn test_url_with_select_and_filter() {
        let dataverse = client("https://org.crm.test/");

        let url = dataverse.request_url(
            "accounts",
            &["name", "accountid"],
            Some("statecode eq 0"),
            None,
        );

        assert_eq!(
            url,
            "https://org.crm.test/api/data/v9.1/accounts?$select=name,accountid&$filter=statecode%20eq%200"
        );
    }

    #[test]
    fn test_id_suppresses_filter() {
        let dataverse = client("https://org.crm.test");

        let url = dataverse.request_url("contacts", &["contactid"], Some("statecode eq 0"), Some("c-1"));

        assert_eq!(
            url,
            "https://org.crm.test/api/data/v9.1/contacts(c-1)?$select=contactid"
        );
    }

    #[test]
    fn test_bare_entity_set_url() {
        let dataverse = client("https://org.crm.test");

        let url = dataverse.request_url("nsat_clinicalprofiles", &[], None, Some("p-9"));

        assert_eq!(
            url,
            "https://org.crm.test/api/data/v9.1/nsat_clinicalprofiles(p-9)"
        );
    }

    #[tokio::test]
    async fn test_query_unwraps_value_array() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/data/v9.1/accounts?$select=accountid")
            .match_header("OData-Version", "4.0")
            .match_header("Authorization", "Bearer token-123")
            .with_status(200)
            .with_body(r#"{"@odata.context": "ctx", "value": [{"accountid": "a-1"}, {"accountid": "a-2"}]}"#)
            .create_async()
            .await;

        let dataverse = client(&server.url());
        let records = dataverse
            .query("token-123", "accounts", &["accountid"], None)
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["accountid"], "a-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_query_by_id_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/data/v9.1/contacts(missing)")
            .with_status(404)
            .create_async()
            .await;

        let dataverse = client(&server.url());
        let err = dataverse
            .query_by_id("token-123", "contacts", &[], "missing")
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_value_array_is_invalid() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/data/v9.1/accounts")
            .with_status(200)
            .with_body(r#"{"unexpected": true}"#)
            .create_async()
            .await;

        let dataverse = client(&server.url());
        let err = dataverse
            .query("token-123", "accounts", &[], None)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::InvalidResponse(_)));
    }
}
