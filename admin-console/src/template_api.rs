use std::collections::BTreeMap;

use common_http_errors::ApiResult;
use serde_json::{json, Value};

use crate::client::{ApiClient, ApiRequest};
use crate::models::{EmailTemplate, Id, Page, TemplateInput, TemplatePreview};

const TEMPLATES_PATH: &str = "/emails/templates/";

#[derive(Clone)]
pub struct TemplatesApi {
    client: ApiClient,
}

impl TemplatesApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, page: Option<u32>) -> ApiResult<Page<EmailTemplate>> {
        let request = ApiRequest::get(TEMPLATES_PATH).query_opt("page", page);
        self.client.execute(request).await
    }

    pub async fn get(&self, id: Id) -> ApiResult<EmailTemplate> {
        self.client.get(&format!("{TEMPLATES_PATH}{id}/")).await
    }

    pub async fn create(&self, input: &TemplateInput) -> ApiResult<EmailTemplate> {
        self.client.post(TEMPLATES_PATH, input).await
    }

    pub async fn update(&self, id: Id, input: &TemplateInput) -> ApiResult<EmailTemplate> {
        self.client
            .put(&format!("{TEMPLATES_PATH}{id}/"), input)
            .await
    }

    pub async fn delete(&self, id: Id) -> ApiResult<()> {
        self.client.delete(&format!("{TEMPLATES_PATH}{id}/")).await
    }

    /// Renders the template server-side with `context` substituted.
    pub async fn preview(
        &self,
        id: Id,
        context: &BTreeMap<String, Value>,
    ) -> ApiResult<TemplatePreview> {
        let request = ApiRequest::post(format!("{TEMPLATES_PATH}{id}/preview/"))
            .json(&json!({ "context": context }))?;
        self.client.execute(request).await
    }
}
