use std::sync::Arc;

use chrono::{DateTime, Utc};
use common_observability::{ClientMetrics, ErrorHistory, ErrorRecord};
use serde::Serialize;
use tracing::{error, warn};

use crate::models::{Id, User};

/// Who was signed in when the report was taken. Never carries tokens.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserSummary {
    pub id: Id,
    pub username: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<Id>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role.to_string(),
            tenant_id: user.tenant.as_ref().map(|tenant| tenant.id()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    pub generated_at: DateTime<Utc>,
    pub client_version: &'static str,
    pub api_base_url: String,
    pub user: Option<UserSummary>,
    pub api_errors: Vec<ErrorRecord>,
    pub app_errors: Vec<ErrorRecord>,
    pub metrics: String,
}

impl DiagnosticReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// The two error histories plus metrics, assembled on demand into a report
/// the user can copy into a support ticket.
#[derive(Clone)]
pub struct Diagnostics {
    api_errors: Arc<ErrorHistory>,
    app_errors: Arc<ErrorHistory>,
    metrics: Arc<ClientMetrics>,
}

impl Diagnostics {
    pub fn new(api_errors: Arc<ErrorHistory>, metrics: Arc<ClientMetrics>) -> Self {
        let app_errors = Arc::new(ErrorHistory::new(api_errors.capacity()));
        Self {
            api_errors,
            app_errors,
            metrics,
        }
    }

    pub fn api_errors(&self) -> &Arc<ErrorHistory> {
        &self.api_errors
    }

    pub fn app_errors(&self) -> &Arc<ErrorHistory> {
        &self.app_errors
    }

    /// Records a failure outside the HTTP layer (e.g. a command handler).
    pub fn record_app_error(&self, context: &str, err: &(dyn std::error::Error + 'static)) {
        error!(%context, error = %err, "application error");
        self.app_errors
            .record(ErrorRecord::new(err.to_string()).with_context(context));
    }

    pub fn report(&self, api_base_url: &str, user: Option<&User>) -> DiagnosticReport {
        let metrics = self.metrics.render().unwrap_or_else(|err| {
            warn!(error = %err, "failed to render client metrics");
            String::new()
        });
        DiagnosticReport {
            generated_at: Utc::now(),
            client_version: env!("CARGO_PKG_VERSION"),
            api_base_url: api_base_url.to_string(),
            user: user.map(UserSummary::from),
            api_errors: self.api_errors.snapshot(),
            app_errors: self.app_errors.snapshot(),
            metrics,
        }
    }

    pub fn clear(&self) {
        self.api_errors.clear();
        self.app_errors.clear();
    }
}
