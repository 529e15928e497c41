use common_http_errors::ApiResult;
use serde::Deserialize;

use crate::client::{ApiClient, ApiRequest};
use crate::models::{Id, Page, Recipient, RecipientInput, RecipientQuery};
use crate::paths::{resolve_path, Resource};

/// Outcome of a bulk import; rows the server rejected come back in `errors`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkCreateSummary {
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub skipped: u64,
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
}

#[derive(Clone)]
pub struct RecipientsApi {
    client: ApiClient,
}

impl RecipientsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn prefix(&self) -> String {
        resolve_path(self.client.current_role().as_ref(), Resource::Recipients)
    }

    pub async fn list(&self, query: &RecipientQuery) -> ApiResult<Page<Recipient>> {
        let request = ApiRequest::get(format!("{}/", self.prefix()))
            .query_opt("search", query.search.as_deref().filter(|s| !s.is_empty()))
            .query_opt("group", query.group)
            .query_opt("page", query.page)
            .query_opt("page_size", query.page_size);
        self.client.execute(request).await
    }

    pub async fn get(&self, id: Id) -> ApiResult<Recipient> {
        self.client.get(&format!("{}/{id}/", self.prefix())).await
    }

    pub async fn create(&self, input: &RecipientInput) -> ApiResult<Recipient> {
        self.client.post(&format!("{}/", self.prefix()), input).await
    }

    pub async fn update(&self, id: Id, input: &RecipientInput) -> ApiResult<Recipient> {
        self.client
            .put(&format!("{}/{id}/", self.prefix()), input)
            .await
    }

    pub async fn delete(&self, id: Id) -> ApiResult<()> {
        self.client.delete(&format!("{}/{id}/", self.prefix())).await
    }

    pub async fn bulk_create(&self, recipients: &[RecipientInput]) -> ApiResult<BulkCreateSummary> {
        self.client
            .post(&format!("{}/bulk/", self.prefix()), recipients)
            .await
    }
}
