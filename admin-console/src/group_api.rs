use common_http_errors::ApiResult;
use serde_json::json;
use tracing::debug;

use crate::client::{ApiClient, ApiRequest};
use crate::models::{ContactGroup, GroupInput, Id, Page};
use crate::paths::{resolve_path, Resource};

#[derive(Clone)]
pub struct GroupsApi {
    client: ApiClient,
}

impl GroupsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn prefix(&self) -> String {
        let role = self.client.current_role();
        let prefix = resolve_path(role.as_ref(), Resource::Groups);
        debug!(role = ?role, %prefix, "resolved groups path");
        prefix
    }

    pub async fn list(&self, page: Option<u32>) -> ApiResult<Page<ContactGroup>> {
        let request = ApiRequest::get(format!("{}/", self.prefix())).query_opt("page", page);
        self.client.execute(request).await
    }

    pub async fn get(&self, id: Id) -> ApiResult<ContactGroup> {
        self.client.get(&format!("{}/{id}/", self.prefix())).await
    }

    pub async fn create(&self, input: &GroupInput) -> ApiResult<ContactGroup> {
        self.client.post(&format!("{}/", self.prefix()), input).await
    }

    pub async fn update(&self, id: Id, input: &GroupInput) -> ApiResult<ContactGroup> {
        self.client
            .put(&format!("{}/{id}/", self.prefix()), input)
            .await
    }

    pub async fn delete(&self, id: Id) -> ApiResult<()> {
        self.client.delete(&format!("{}/{id}/", self.prefix())).await
    }

    pub async fn add_recipients(&self, id: Id, recipient_ids: &[Id]) -> ApiResult<()> {
        let request = ApiRequest::post(format!("{}/{id}/add_recipients/", self.prefix()))
            .json(&json!({ "recipient_ids": recipient_ids }))?;
        self.client.execute_empty(request).await
    }

    pub async fn remove_recipient(&self, id: Id, recipient_id: Id) -> ApiResult<()> {
        let request = ApiRequest::post(format!("{}/{id}/remove_recipient/", self.prefix()))
            .json(&json!({ "recipient_id": recipient_id }))?;
        self.client.execute_empty(request).await
    }
}
