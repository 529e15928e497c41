use common_http_errors::ApiResult;
use serde_json::Value;

use crate::client::{ApiClient, ApiRequest};
use crate::models::{
    Id, LoginCredentials, LoginResponse, NewUser, OAuthLogin, Page, PasswordChange,
    Registration, User, UserPatch,
};

pub const LOGIN_PATH: &str = "/auth/login/";
pub const REGISTER_PATH: &str = "/auth/register/";
pub const GOOGLE_LOGIN_PATH: &str = "/auth/google/";
pub const PROFILE_PATH: &str = "/auth/profile/";
const USERS_PATH: &str = "/auth/users/";

/// Sign-in and user administration endpoints.
#[derive(Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> ApiResult<LoginResponse> {
        let request = ApiRequest::post(LOGIN_PATH)
            .json(credentials)?
            .anonymous()
            .silent();
        self.client.execute(request).await
    }

    /// The response body varies by deployment, so it is returned untyped.
    pub async fn register(&self, registration: &Registration) -> ApiResult<Value> {
        let request = ApiRequest::post(REGISTER_PATH)
            .json(registration)?
            .anonymous()
            .silent();
        self.client.execute(request).await
    }

    pub async fn oauth_login(&self, login: &OAuthLogin) -> ApiResult<LoginResponse> {
        let request = ApiRequest::post(GOOGLE_LOGIN_PATH)
            .json(login)?
            .anonymous()
            .silent();
        self.client.execute(request).await
    }

    pub async fn profile(&self) -> ApiResult<User> {
        self.client.get(PROFILE_PATH).await
    }

    pub async fn update_profile(&self, patch: &UserPatch) -> ApiResult<User> {
        self.client.patch(PROFILE_PATH, patch).await
    }

    pub async fn list_users(&self, page: Option<u32>) -> ApiResult<Page<User>> {
        self.client
            .execute(ApiRequest::get(USERS_PATH).query_opt("page", page))
            .await
    }

    pub async fn create_user(&self, user: &NewUser) -> ApiResult<User> {
        self.client.post(USERS_PATH, user).await
    }

    pub async fn update_user(&self, id: Id, patch: &UserPatch) -> ApiResult<User> {
        self.client.patch(&format!("{USERS_PATH}{id}/"), patch).await
    }

    pub async fn delete_user(&self, id: Id) -> ApiResult<()> {
        self.client.delete(&format!("{USERS_PATH}{id}/")).await
    }

    pub async fn change_password(&self, change: &PasswordChange) -> ApiResult<()> {
        let request = ApiRequest::post(format!("{USERS_PATH}change-password/")).json(change)?;
        self.client.execute_empty(request).await
    }
}
