use std::sync::Arc;
use std::time::Duration;

use common_auth::{AccessClaims, ExpiryConfig, Role};
use common_http_errors::{ApiError, ApiResult};
use common_observability::{ClientMetrics, ErrorHistory, ErrorRecord};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::notify::{Notice, Notifier, TracingNotifier};
use crate::store::{SessionStore, SessionStoreExt, StorageKey};

pub const REFRESH_PATH: &str = "/auth/refresh/";
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to register client metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// A single API call, described independently of how it is sent so it can be
/// replayed after a token refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    anonymous: bool,
    silent: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            anonymous: false,
            silent: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ApiResult<Self> {
        self.body = Some(serde_json::to_value(body).map_err(ApiError::decode)?);
        Ok(self)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Sends without a bearer token and without refresh-on-401 handling.
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// Failures are still recorded but not toasted; the caller reports them.
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }
}

struct RawResponse {
    status: StatusCode,
    body: String,
    request_id: String,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum RefreshTrigger {
    Expired,
    Unauthorized,
}

impl RefreshTrigger {
    fn as_str(&self) -> &'static str {
        match self {
            RefreshTrigger::Expired => "expired",
            RefreshTrigger::Unauthorized => "unauthorized",
        }
    }
}

struct ClientInner {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    history: Arc<ErrorHistory>,
    metrics: Arc<ClientMetrics>,
    expiry: ExpiryConfig,
    proactive_refresh: bool,
}

/// Shared REST client: attaches the bearer token, refreshes it once on 401,
/// and records failures for diagnostics.
///
/// Clones share one connection pool and session store. Concurrent requests
/// refresh independently; each request is retried at most once.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl ApiClient {
    pub fn builder(base_url: impl Into<String>, store: Arc<dyn SessionStore>) -> ApiClientBuilder {
        ApiClientBuilder::new(base_url, store)
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.inner.store
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.inner.notifier
    }

    pub fn history(&self) -> &Arc<ErrorHistory> {
        &self.inner.history
    }

    pub fn metrics(&self) -> &Arc<ClientMetrics> {
        &self.inner.metrics
    }

    /// Role of the cached user, read fresh on every call.
    pub fn current_role(&self) -> Option<Role> {
        self.inner.store.current_role()
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.inner.base_url, path)
        } else {
            format!("{}/{}", self.inner.base_url, path)
        }
    }

    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let body = self.dispatch(&request).await?;
        let text = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(text).map_err(|err| {
            let err = ApiError::decode(err);
            self.inner.history.record(
                ErrorRecord::new(err.to_string())
                    .with_request(request.method.as_str(), self.url(&request.path))
                    .with_body(&body),
            );
            err
        })
    }

    /// Sends a request whose response body is ignored (e.g. 204 No Content).
    pub async fn execute_empty(&self, request: ApiRequest) -> ApiResult<()> {
        self.dispatch(&request).await.map(|_| ())
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.execute(ApiRequest::get(path)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(ApiRequest::put(path).json(body)?).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(ApiRequest::patch(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        self.execute_empty(ApiRequest::delete(path)).await
    }

    async fn dispatch(&self, request: &ApiRequest) -> ApiResult<String> {
        if request.anonymous {
            let response = self.send_once(request, None).await?;
            return self.finish(request, response);
        }

        let mut token = self.inner.store.read(StorageKey::AccessToken);
        let mut refreshed = false;

        if self.inner.proactive_refresh && token.as_deref().is_some_and(|t| self.is_expired(t)) {
            refreshed = true;
            match self.refresh_access_token(RefreshTrigger::Expired).await {
                Ok(fresh) => token = Some(fresh),
                Err(err) => return Err(self.end_session(request, err)),
            }
        }

        let response = self.send_once(request, token.as_deref()).await?;
        if response.status != StatusCode::UNAUTHORIZED || refreshed {
            return self.finish(request, response);
        }

        debug!(method = %request.method, path = %request.path, "received 401, refreshing access token");
        let fresh = match self.refresh_access_token(RefreshTrigger::Unauthorized).await {
            Ok(fresh) => fresh,
            Err(err) => return Err(self.end_session(request, err)),
        };

        let retry = self.send_once(request, Some(&fresh)).await?;
        self.finish(request, retry)
    }

    fn is_expired(&self, token: &str) -> bool {
        match AccessClaims::decode_unverified(token) {
            Ok(claims) => claims.is_expired(&self.inner.expiry),
            Err(err) => {
                debug!(error = %err, "access token is opaque, skipping expiry check");
                false
            }
        }
    }

    async fn send_once(&self, request: &ApiRequest, token: Option<&str>) -> ApiResult<RawResponse> {
        let url = self.url(&request.path);
        let request_id = Uuid::new_v4().to_string();

        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), &url)
            .header(REQUEST_ID_HEADER, &request_id);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => return Err(self.network_failure(request, &url, &request_id, err)),
        };
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => return Err(self.network_failure(request, &url, &request_id, err)),
        };

        debug!(method = %request.method, path = %request.path, status = status.as_u16(), "response received");
        Ok(RawResponse {
            status,
            body,
            request_id,
        })
    }

    fn network_failure(
        &self,
        request: &ApiRequest,
        url: &str,
        request_id: &str,
        err: reqwest::Error,
    ) -> ApiError {
        warn!(method = %request.method, %url, error = %err, "request failed before a response arrived");
        let err = ApiError::network(err);
        self.inner.metrics.request(request.method.as_str(), "network_error");
        self.inner.history.record(
            ErrorRecord::new(err.to_string())
                .with_request(request.method.as_str(), url)
                .with_request_id(request_id),
        );
        if !request.silent {
            self.inner.notifier.notify(Notice::error_toast(err.user_message()));
        }
        err
    }

    fn finish(&self, request: &ApiRequest, response: RawResponse) -> ApiResult<String> {
        let method = request.method.as_str();
        if response.status.is_success() {
            self.inner.metrics.request(method, "ok");
            return Ok(response.body);
        }

        let status = response.status.as_u16();
        let err = ApiError::from_response(response.status, &response.body);
        let url = self.url(&request.path);
        warn!(%method, %url, status, code = err.code(), "API request failed");

        self.inner.metrics.request(method, "error");
        self.inner.metrics.http_error(status);
        self.inner.history.record(
            ErrorRecord::new(err.to_string())
                .with_request(method, url)
                .with_status(status)
                .with_body(&response.body)
                .with_request_id(response.request_id),
        );
        if err.should_notify() && !request.silent {
            self.inner.notifier.notify(Notice::error_toast(err.user_message()));
        }
        Err(err)
    }

    /// Exchanges the stored refresh token for a new access token and stores it.
    async fn refresh_access_token(&self, trigger: RefreshTrigger) -> ApiResult<String> {
        let outcome = self.try_refresh().await;
        let label = if outcome.is_ok() { "success" } else { "failure" };
        self.inner.metrics.token_refresh(trigger.as_str(), label);
        outcome
    }

    async fn try_refresh(&self) -> ApiResult<String> {
        let refresh = self
            .inner
            .store
            .read(StorageKey::RefreshToken)
            .ok_or(ApiError::SessionExpired)?;

        let response = self
            .inner
            .http
            .post(self.url(REFRESH_PATH))
            .json(&RefreshRequest { refresh: &refresh })
            .send()
            .await
            .map_err(ApiError::network)?;
        let status = response.status();
        let body = response.text().await.map_err(ApiError::network)?;
        if !status.is_success() {
            return Err(ApiError::from_response(status, &body));
        }

        let tokens: RefreshResponse = serde_json::from_str(&body).map_err(ApiError::decode)?;
        if let Err(err) = self.inner.store.set(StorageKey::AccessToken, &tokens.access) {
            warn!(error = %err, "failed to persist refreshed access token");
        }
        if let Some(rotated) = tokens.refresh.as_deref() {
            if let Err(err) = self.inner.store.set(StorageKey::RefreshToken, rotated) {
                warn!(error = %err, "failed to persist rotated refresh token");
            }
        }
        info!("access token refreshed");
        Ok(tokens.access)
    }

    /// Tears the session down after an unrecoverable refresh failure.
    fn end_session(&self, request: &ApiRequest, cause: ApiError) -> ApiError {
        warn!(method = %request.method, path = %request.path, cause = %cause, "token refresh failed, clearing session");
        if let Err(err) = self.inner.store.clear() {
            warn!(error = %err, "failed to clear session storage");
        }
        self.inner.metrics.request(request.method.as_str(), "session_expired");
        self.inner.history.record(
            ErrorRecord::new(format!("session expired: {cause}"))
                .with_request(request.method.as_str(), self.url(&request.path))
                .with_status(StatusCode::UNAUTHORIZED.as_u16()),
        );
        self.inner
            .notifier
            .notify(Notice::RedirectToLogin { return_to: None });
        ApiError::SessionExpired
    }
}

pub struct ApiClientBuilder {
    base_url: String,
    store: Arc<dyn SessionStore>,
    notifier: Option<Arc<dyn Notifier>>,
    history: Option<Arc<ErrorHistory>>,
    metrics: Option<Arc<ClientMetrics>>,
    timeout: Duration,
    expiry: ExpiryConfig,
    proactive_refresh: bool,
}

impl ApiClientBuilder {
    fn new(base_url: impl Into<String>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
            notifier: None,
            history: None,
            metrics: None,
            timeout: DEFAULT_TIMEOUT,
            expiry: ExpiryConfig::new(),
            proactive_refresh: true,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_history(mut self, history: Arc<ErrorHistory>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<ClientMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_expiry(mut self, expiry: ExpiryConfig) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn with_proactive_refresh(mut self, enabled: bool) -> Self {
        self.proactive_refresh = enabled;
        self
    }

    pub fn build(self) -> Result<ApiClient, ClientBuildError> {
        let http = reqwest::Client::builder().timeout(self.timeout).build()?;
        let metrics = match self.metrics {
            Some(metrics) => metrics,
            None => Arc::new(ClientMetrics::new()?),
        };

        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                http,
                base_url: self.base_url,
                store: self.store,
                notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
                history: self.history.unwrap_or_default(),
                metrics,
                expiry: self.expiry,
                proactive_refresh: self.proactive_refresh,
            }),
        })
    }
}
