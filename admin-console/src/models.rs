//! Wire types exchanged with the RecallIQ REST API.
//!
//! Fields the console does not act on are optional with serde defaults so that
//! additions on the server side do not break deserialization.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use common_auth::Role;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub type Id = i64;

/// A tenant as embedded in a user profile: either a bare id or a summary object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TenantRef {
    Id(Id),
    Summary {
        id: Id,
        #[serde(default)]
        name: Option<String>,
    },
}

impl TenantRef {
    pub fn id(&self) -> Id {
        match self {
            TenantRef::Id(id) | TenantRef::Summary { id, .. } => *id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            TenantRef::Id(_) => None,
            TenantRef::Summary { name, .. } => name.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_recipients: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_groups: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_batches: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_email_limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_email_limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<TenantRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<UserLimits>,
}

impl User {
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) if !first.is_empty() => format!("{first} {last}"),
            (Some(first), _) if !first.is_empty() => first.to_string(),
            _ => self.username.clone(),
        }
    }

    /// Merges the set fields of `patch`; unset fields are left untouched.
    pub fn apply(&mut self, patch: &UserPatch) {
        if let Some(username) = &patch.username {
            self.username = username.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        if let Some(first_name) = &patch.first_name {
            self.first_name = Some(first_name.clone());
        }
        if let Some(last_name) = &patch.last_name {
            self.last_name = Some(last_name.clone());
        }
        if let Some(role) = &patch.role {
            self.role = role.clone();
        }
        if let Some(tenant) = &patch.tenant {
            self.tenant = Some(tenant.clone());
        }
        if let Some(limits) = &patch.limits {
            self.limits = Some(limits.clone());
        }
    }
}

/// Partial user update, used both for `PATCH` bodies and in-memory merges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<TenantRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<UserLimits>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Clone, Serialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Access + refresh + user triple returned by every sign-in flavour.
#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: User,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub tenant_name: String,
    pub role: Role,
}

impl Registration {
    pub fn tenant_admin(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        tenant_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            first_name: None,
            last_name: None,
            tenant_name: tenant_name.into(),
            role: Role::TenantAdmin,
        }
    }

    pub fn credentials(&self) -> LoginCredentials {
        LoginCredentials {
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

/// New-tenant data bundled with a third-party sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantProvisioning {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OAuthLogin {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_data: Option<TenantProvisioning>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub limits: Option<UserLimits>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TenantInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<UserLimits>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactGroup {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub recipient_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub id: Id,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub groups: Vec<Id>,
    #[serde(default)]
    pub is_subscribed: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RecipientInput {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Id>,
}

#[derive(Debug, Clone, Default)]
pub struct RecipientQuery {
    pub search: Option<String>,
    pub group: Option<Id>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BatchStatus {
    Draft,
    Scheduled,
    Running,
    Paused,
    Completed,
    Cancelled,
    Failed,
    Other(String),
}

impl BatchStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BatchStatus::Draft => "draft",
            BatchStatus::Scheduled => "scheduled",
            BatchStatus::Running => "running",
            BatchStatus::Paused => "paused",
            BatchStatus::Completed => "completed",
            BatchStatus::Cancelled => "cancelled",
            BatchStatus::Failed => "failed",
            BatchStatus::Other(raw) => raw.as_str(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchStatus::Completed | BatchStatus::Cancelled | BatchStatus::Failed
        )
    }
}

impl From<String> for BatchStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "draft" | "pending" => BatchStatus::Draft,
            "scheduled" => BatchStatus::Scheduled,
            "running" | "processing" | "sending" => BatchStatus::Running,
            "paused" => BatchStatus::Paused,
            "completed" => BatchStatus::Completed,
            "cancelled" | "canceled" => BatchStatus::Cancelled,
            "failed" => BatchStatus::Failed,
            _ => BatchStatus::Other(value),
        }
    }
}

impl From<BatchStatus> for String {
    fn from(value: BatchStatus) -> Self {
        match value {
            BatchStatus::Other(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: Id,
    pub name: String,
    pub status: BatchStatus,
    #[serde(default)]
    pub template: Option<Id>,
    #[serde(default)]
    pub groups: Vec<Id>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_recipients: Option<u64>,
    #[serde(default)]
    pub sent_count: Option<u64>,
    #[serde(default)]
    pub failed_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchInput {
    pub name: String,
    pub template: Id,
    pub groups: Vec<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchAction {
    Start,
    Pause,
    Resume,
    Cancel,
}

impl BatchAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchAction::Start => "start",
            BatchAction::Pause => "pause",
            BatchAction::Resume => "resume",
            BatchAction::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub id: Id,
    pub name: String,
    pub subject: String,
    #[serde(default)]
    pub html_content: Option<String>,
    #[serde(default)]
    pub text_content: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplateInput {
    pub name: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplatePreview {
    pub subject: String,
    #[serde(default)]
    pub html_content: Option<String>,
    #[serde(default)]
    pub text_content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailLog {
    pub id: Id,
    #[serde(alias = "recipient")]
    pub recipient_email: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub status: String,
    #[serde(default)]
    pub batch: Option<Id>,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub status: Option<String>,
    pub batch: Option<Id>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    #[serde(default)]
    pub sent: u64,
    #[serde(default)]
    pub failed: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailAnalytics {
    #[serde(default)]
    pub total_sent: u64,
    #[serde(default)]
    pub delivered: u64,
    #[serde(default)]
    pub opened: u64,
    #[serde(default)]
    pub clicked: u64,
    #[serde(default)]
    pub bounced: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub daily: Vec<DailyStat>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl EmailAnalytics {
    pub fn delivery_rate(&self) -> Option<f64> {
        (self.total_sent > 0).then(|| self.delivered as f64 / self.total_sent as f64)
    }
}

/// A list response; accepts both a bare array and a paginated envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub count: Option<u64>,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn into_results(self) -> Vec<T> {
        self.results
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Page<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr<T> {
            Paged {
                #[serde(default)]
                count: Option<u64>,
                #[serde(default)]
                next: Option<String>,
                #[serde(default)]
                previous: Option<String>,
                results: Vec<T>,
            },
            Plain(Vec<T>),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Paged {
                count,
                next,
                previous,
                results,
            } => Page {
                count,
                next,
                previous,
                results,
            },
            Repr::Plain(results) => Page {
                count: Some(results.len() as u64),
                next: None,
                previous: None,
                results,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_defaults_missing_role_to_member() {
        let user: User = serde_json::from_value(json!({
            "id": 7,
            "username": "ana",
            "email": "ana@example.com",
            "tenant": { "id": 3, "name": "Acme" }
        }))
        .expect("user");
        assert_eq!(user.role, Role::Member);
        assert_eq!(user.tenant.as_ref().map(TenantRef::id), Some(3));
        assert_eq!(user.tenant.as_ref().and_then(TenantRef::name), Some("Acme"));
    }

    #[test]
    fn tenant_reference_accepts_bare_id() {
        let user: User = serde_json::from_value(json!({
            "id": 1, "username": "x", "role": "staff", "tenant": 12
        }))
        .expect("user");
        assert_eq!(user.tenant, Some(TenantRef::Id(12)));
        assert_eq!(user.role, Role::Staff);
    }

    #[test]
    fn apply_patch_only_touches_set_fields() {
        let mut user: User = serde_json::from_value(json!({
            "id": 1, "username": "old", "email": "old@example.com", "role": "staff"
        }))
        .expect("user");
        user.apply(&UserPatch {
            first_name: Some("Ada".into()),
            ..UserPatch::default()
        });
        assert_eq!(user.username, "old");
        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        assert_eq!(user.display_name(), "Ada");
    }

    #[test]
    fn page_accepts_both_shapes() {
        let paged: Page<Id> = serde_json::from_value(json!({
            "count": 10, "next": "http://x/?page=2", "previous": null, "results": [1, 2]
        }))
        .expect("paged");
        assert!(paged.has_next());
        assert_eq!(paged.results, vec![1, 2]);

        let plain: Page<Id> = serde_json::from_value(json!([4, 5, 6])).expect("plain");
        assert_eq!(plain.count, Some(3));
        assert!(!plain.has_next());
    }

    #[test]
    fn batch_status_keeps_unknown_values() {
        let status: BatchStatus = serde_json::from_value(json!("archived")).expect("status");
        assert_eq!(status, BatchStatus::Other("archived".into()));
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("archived"));
        assert!(BatchStatus::from("Canceled".to_string()).is_terminal());
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = LoginCredentials {
            email: "a@b.c".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
