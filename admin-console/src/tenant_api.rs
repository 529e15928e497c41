use common_http_errors::ApiResult;

use crate::client::{ApiClient, ApiRequest};
use crate::models::{Id, Page, Tenant, TenantInput};

/// Tenant administration. Platform operators manage every tenant through the
/// `/admin/tenants/` family; everyone else sees `/tenants/`.
#[derive(Clone)]
pub struct TenantsApi {
    client: ApiClient,
}

impl TenantsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn base(&self) -> &'static str {
        match self.client.current_role() {
            Some(role) if role.is_platform() => "/admin/tenants",
            _ => "/tenants",
        }
    }

    fn item(&self, id: Id) -> String {
        format!("{}/{id}/", self.base())
    }

    pub async fn list(&self, page: Option<u32>) -> ApiResult<Page<Tenant>> {
        let request = ApiRequest::get(format!("{}/", self.base())).query_opt("page", page);
        self.client.execute(request).await
    }

    pub async fn get(&self, id: Id) -> ApiResult<Tenant> {
        self.client.get(&self.item(id)).await
    }

    pub async fn create(&self, input: &TenantInput) -> ApiResult<Tenant> {
        self.client.post(&format!("{}/", self.base()), input).await
    }

    pub async fn update(&self, id: Id, input: &TenantInput) -> ApiResult<Tenant> {
        self.client.patch(&self.item(id), input).await
    }

    pub async fn delete(&self, id: Id) -> ApiResult<()> {
        self.client.delete(&self.item(id)).await
    }

    pub async fn activate(&self, id: Id) -> ApiResult<Tenant> {
        self.action(id, "activate").await
    }

    pub async fn deactivate(&self, id: Id) -> ApiResult<Tenant> {
        self.action(id, "deactivate").await
    }

    async fn action(&self, id: Id, action: &str) -> ApiResult<Tenant> {
        let path = format!("{}/{id}/{action}/", self.base());
        self.client.execute(ApiRequest::post(path)).await
    }
}
