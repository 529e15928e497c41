use common_http_errors::ApiResult;

use crate::client::{ApiClient, ApiRequest};
use crate::models::{Batch, BatchAction, BatchInput, Id, Page};
use crate::paths::{resolve_path, Resource};

#[derive(Clone)]
pub struct BatchesApi {
    client: ApiClient,
}

impl BatchesApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn prefix(&self) -> String {
        resolve_path(self.client.current_role().as_ref(), Resource::Batches)
    }

    pub async fn list(&self, page: Option<u32>) -> ApiResult<Page<Batch>> {
        let request = ApiRequest::get(format!("{}/", self.prefix())).query_opt("page", page);
        self.client.execute(request).await
    }

    pub async fn get(&self, id: Id) -> ApiResult<Batch> {
        self.client.get(&format!("{}/{id}/", self.prefix())).await
    }

    pub async fn create(&self, input: &BatchInput) -> ApiResult<Batch> {
        self.client.post(&format!("{}/", self.prefix()), input).await
    }

    pub async fn update(&self, id: Id, input: &BatchInput) -> ApiResult<Batch> {
        self.client
            .put(&format!("{}/{id}/", self.prefix()), input)
            .await
    }

    pub async fn delete(&self, id: Id) -> ApiResult<()> {
        self.client.delete(&format!("{}/{id}/", self.prefix())).await
    }

    pub async fn start(&self, id: Id) -> ApiResult<Batch> {
        self.perform(id, BatchAction::Start).await
    }

    pub async fn pause(&self, id: Id) -> ApiResult<Batch> {
        self.perform(id, BatchAction::Pause).await
    }

    pub async fn resume(&self, id: Id) -> ApiResult<Batch> {
        self.perform(id, BatchAction::Resume).await
    }

    pub async fn cancel(&self, id: Id) -> ApiResult<Batch> {
        self.perform(id, BatchAction::Cancel).await
    }

    pub async fn perform(&self, id: Id, action: BatchAction) -> ApiResult<Batch> {
        let path = format!("{}/{id}/{}/", self.prefix(), action.as_str());
        self.client.execute(ApiRequest::post(path)).await
    }
}
