use std::sync::Arc;

use common_observability::{ClientMetrics, ErrorHistory};
use tracing::info;

use crate::auth_api::AuthApi;
use crate::batch_api::BatchesApi;
use crate::client::{ApiClient, ClientBuildError};
use crate::config::ConsoleConfig;
use crate::diagnostics::{DiagnosticReport, Diagnostics};
use crate::group_api::GroupsApi;
use crate::log_api::LogsApi;
use crate::notify::{Notifier, TracingNotifier};
use crate::recipient_api::RecipientsApi;
use crate::session::SessionManager;
use crate::store::{FileSessionStore, SessionStore, SessionStoreExt};
use crate::template_api::TemplatesApi;
use crate::tenant_api::TenantsApi;

/// Everything one console session needs, wired around a single client.
pub struct ConsoleApp {
    client: ApiClient,
    session: SessionManager,
    diagnostics: Diagnostics,
}

impl ConsoleApp {
    pub fn from_config(config: &ConsoleConfig) -> Result<Self, ClientBuildError> {
        let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(&config.session_file));
        Self::with_parts(config, store, Arc::new(TracingNotifier))
    }

    pub fn with_parts(
        config: &ConsoleConfig,
        store: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ClientBuildError> {
        let history = Arc::new(ErrorHistory::new(config.error_history_limit));
        let metrics = Arc::new(ClientMetrics::new()?);

        let client = ApiClient::builder(&config.api_url, store)
            .with_notifier(notifier)
            .with_history(history.clone())
            .with_metrics(metrics.clone())
            .with_timeout(config.timeout)
            .with_expiry(config.expiry())
            .with_proactive_refresh(config.proactive_refresh)
            .build()?;
        info!(api_url = %client.base_url(), "console client ready");

        Ok(Self {
            session: SessionManager::new(client.clone()),
            diagnostics: Diagnostics::new(history, metrics),
            client,
        })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.client.clone())
    }

    pub fn tenants(&self) -> TenantsApi {
        TenantsApi::new(self.client.clone())
    }

    pub fn groups(&self) -> GroupsApi {
        GroupsApi::new(self.client.clone())
    }

    pub fn recipients(&self) -> RecipientsApi {
        RecipientsApi::new(self.client.clone())
    }

    pub fn batches(&self) -> BatchesApi {
        BatchesApi::new(self.client.clone())
    }

    pub fn templates(&self) -> TemplatesApi {
        TemplatesApi::new(self.client.clone())
    }

    pub fn logs(&self) -> LogsApi {
        LogsApi::new(self.client.clone())
    }

    pub fn diagnostic_report(&self) -> DiagnosticReport {
        let user = self
            .session
            .user()
            .or_else(|| self.client.store().load_user());
        self.diagnostics
            .report(self.client.base_url(), user.as_ref())
    }
}
