//! Session layer and typed REST client for the RecallIQ admin console.

pub mod app;
pub mod auth_api;
pub mod batch_api;
pub mod client;
pub mod config;
pub mod diagnostics;
pub mod forms;
pub mod group_api;
pub mod guard;
pub mod log_api;
pub mod models;
pub mod notify;
pub mod paths;
pub mod recipient_api;
pub mod session;
pub mod store;
pub mod template_api;
pub mod tenant_api;

pub use app::ConsoleApp;
pub use client::{ApiClient, ApiClientBuilder, ApiRequest, ClientBuildError};
pub use config::{load_console_config, ConsoleConfig};
pub use diagnostics::{DiagnosticReport, Diagnostics};
pub use forms::FormErrors;
pub use guard::{GuardDecision, RouteGuard, LOGIN_ROUTE};
pub use notify::{Notice, NoticeLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use paths::{resolve_path, PathFamily, Resource};
pub use session::{AuthPhase, AuthState, SessionError, SessionManager, SessionResult};
pub use store::{
    FileSessionStore, MemorySessionStore, SessionStore, SessionStoreExt, StorageKey, StoreError,
};

pub use common_auth::Role;
pub use common_http_errors::{ApiError, ApiResult, FieldErrors};
