use admin_console::models::{LoginCredentials, Registration, TenantProvisioning, UserPatch};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use admin_console::store::StoreResult;
use admin_console::{
    ApiClient, ApiError, AuthPhase, FileSessionStore, GuardDecision, MemorySessionStore, Notice,
    Role, RouteGuard, SessionError, SessionManager, SessionStore, SessionStoreExt, StorageKey,
    StoreError,
};
use httpmock::prelude::*;
use serde_json::json;

mod support;
use support::{mint_token, user_json, TestContext};

fn credentials() -> LoginCredentials {
    LoginCredentials {
        email: "user1@example.com".into(),
        password: "s3cret".into(),
    }
}

#[tokio::test]
async fn login_persists_tokens_and_user() {
    let server = MockServer::start_async().await;
    let ctx = TestContext::new(&server);
    let access = mint_token("1", 600);

    let authorized = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/auth/login/")
                .header_exists("Authorization");
            then.status(400);
        })
        .await;
    let login = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/auth/login/")
                .json_body(json!({ "email": "user1@example.com", "password": "s3cret" }));
            then.status(200).json_body(json!({
                "access": access,
                "refresh": "refresh-1",
                "user": user_json(1, "tenant_admin"),
            }));
        })
        .await;

    let session = ctx.session();
    let user = session.login(&credentials()).await.expect("login");

    login.assert_async().await;
    authorized.assert_hits_async(0).await;
    assert_eq!(user.role, Role::TenantAdmin);
    let state = session.state();
    assert_eq!(state.phase, AuthPhase::Authenticated);
    assert_eq!(ctx.stored(StorageKey::AccessToken), Some(access));
    assert_eq!(ctx.stored(StorageKey::RefreshToken).as_deref(), Some("refresh-1"));
    assert_eq!(ctx.store.current_role(), Some(Role::TenantAdmin));
    assert_eq!(ctx.client.current_role(), Some(Role::TenantAdmin));
    assert_eq!(session.post_login_destination(None), "/tenant-admin/dashboard");
}

#[tokio::test]
async fn login_replaces_unreadable_session_file() {
    let server = MockServer::start_async().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{truncated").expect("seed file");

    let store = Arc::new(FileSessionStore::new(&path));
    let client = ApiClient::builder(server.url("/api"), store.clone())
        .build()
        .expect("client");
    let access = mint_token("1", 600);

    let login = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/login/");
            then.status(200).json_body(json!({
                "access": access,
                "refresh": "refresh-1",
                "user": user_json(1, "staff"),
            }));
        })
        .await;

    let session = SessionManager::new(client);
    let user = session.login(&credentials()).await.expect("first login");

    login.assert_hits_async(1).await;
    assert_eq!(user.role, Role::Staff);
    assert_eq!(session.state().phase, AuthPhase::Authenticated);
    assert_eq!(
        store.get(StorageKey::RefreshToken).expect("readable").as_deref(),
        Some("refresh-1")
    );
    assert_eq!(store.current_role(), Some(Role::Staff));
}

#[tokio::test]
async fn failed_login_shows_popup_and_stays_anonymous() {
    let server = MockServer::start_async().await;
    let ctx = TestContext::new(&server);

    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/login/");
            then.status(401).json_body(json!({
                "detail": "No active account found with the given credentials"
            }));
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/refresh/");
            then.status(200).json_body(json!({ "access": "x" }));
        })
        .await;

    let session = ctx.session();
    let err = session.login(&credentials()).await.expect_err("rejected");

    assert!(matches!(err, SessionError::Api(ApiError::Unauthorized { .. })));
    refresh.assert_hits_async(0).await;
    assert_eq!(session.state().phase, AuthPhase::Anonymous);
    assert!(ctx.store.is_empty());
    assert_eq!(
        ctx.notifier.popups(),
        vec![(
            "Login failed".to_string(),
            "No active account found with the given credentials".to_string()
        )]
    );
    assert!(ctx.notifier.toasts().is_empty());
    assert!(!ctx.notifier.redirected_to_login());
}

#[tokio::test]
async fn register_then_signs_in_with_same_credentials() {
    let server = MockServer::start_async().await;
    let ctx = TestContext::new(&server);

    let register = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/auth/register/")
                .json_body_partial(
                    r#"{"email": "owner@acme.test", "tenant_name": "Acme", "role": "tenant_admin"}"#,
                );
            then.status(201).json_body(json!({ "message": "created" }));
        })
        .await;
    let login = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/auth/login/")
                .json_body(json!({ "email": "owner@acme.test", "password": "pw-123456" }));
            then.status(200).json_body(json!({
                "access": "access-1",
                "refresh": "refresh-1",
                "user": user_json(5, "tenant_admin"),
            }));
        })
        .await;

    let session = ctx.session();
    let registration = Registration::tenant_admin("owner", "owner@acme.test", "pw-123456", "Acme");
    let user = session.register(&registration).await.expect("register");

    register.assert_async().await;
    login.assert_async().await;
    assert_eq!(user.id, 5);
    assert!(session.state().is_authenticated());
}

#[tokio::test]
async fn rejected_registration_does_not_attempt_login() {
    let server = MockServer::start_async().await;
    let ctx = TestContext::new(&server);

    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/register/");
            then.status(400)
                .json_body(json!({ "email": ["already exists"] }));
        })
        .await;
    let login = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/login/");
            then.status(200);
        })
        .await;

    let session = ctx.session();
    let err = session
        .register(&Registration::tenant_admin("o", "o@acme.test", "pw", "Acme"))
        .await
        .expect_err("duplicate email");

    let SessionError::Api(api) = err else {
        panic!("expected API error");
    };
    assert_eq!(
        api.field_errors().and_then(|e| e.first("email")),
        Some("already exists")
    );
    login.assert_hits_async(0).await;
    assert_eq!(session.state().phase, AuthPhase::Anonymous);
    assert_eq!(ctx.notifier.popups().len(), 1);
}

#[tokio::test]
async fn oauth_login_sends_provider_token_and_tenant_data() {
    let server = MockServer::start_async().await;
    let ctx = TestContext::new(&server);

    let google = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/google/").json_body(json!({
                "token": "google-id-token",
                "tenant_data": { "name": "Acme" }
            }));
            then.status(200).json_body(json!({
                "access": "access-g",
                "refresh": "refresh-g",
                "user": user_json(8, "tenant_admin"),
            }));
        })
        .await;

    let session = ctx.session();
    let tenant = TenantProvisioning {
        name: "Acme".into(),
        domain: None,
    };
    let user = session
        .login_with_oauth_token("google-id-token", Some(tenant))
        .await
        .expect("oauth");

    google.assert_async().await;
    assert_eq!(user.id, 8);
    assert_eq!(ctx.stored(StorageKey::AccessToken).as_deref(), Some("access-g"));
}

#[tokio::test]
async fn logout_is_idempotent() {
    let server = MockServer::start_async().await;
    let ctx = TestContext::new(&server);
    ctx.sign_in("staff", "a", "r");

    let session = ctx.session();
    session.logout();
    session.logout();

    assert!(ctx.store.is_empty());
    assert_eq!(session.state().phase, AuthPhase::Anonymous);
    assert!(session.user().is_none());
}

#[tokio::test]
async fn restore_without_token_is_anonymous_without_network() {
    let server = MockServer::start_async().await;
    let ctx = TestContext::new(&server);
    let profile = server
        .mock_async(|when, then| {
            when.path("/api/auth/profile/");
            then.status(200).json_body(user_json(1, "staff"));
        })
        .await;

    let session = ctx.session();
    assert_eq!(session.state().phase, AuthPhase::Restoring);
    let state = session.restore().await;

    assert_eq!(state.phase, AuthPhase::Anonymous);
    profile.assert_hits_async(0).await;
}

#[tokio::test]
async fn restore_refreshes_cached_user_from_profile() {
    let server = MockServer::start_async().await;
    let ctx = TestContext::new(&server);
    ctx.sign_in("staff", "opaque", "refresh-1");

    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/auth/profile/")
                .header("Authorization", "Bearer opaque");
            then.status(200).json_body(user_json(1, "staff_admin"));
        })
        .await;

    let session = ctx.session();
    let state = session.restore().await;

    assert!(state.is_authenticated());
    assert_eq!(state.role(), Some(&Role::StaffAdmin));
    assert_eq!(ctx.store.current_role(), Some(Role::StaffAdmin));
}

#[tokio::test]
async fn restore_with_dead_session_clears_everything() {
    let server = MockServer::start_async().await;
    let ctx = TestContext::new(&server);
    ctx.sign_in("staff", "opaque", "refresh-1");

    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/auth/profile/");
            then.status(401);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/refresh/");
            then.status(401);
        })
        .await;

    let session = ctx.session();
    let state = session.restore().await;

    assert_eq!(state.phase, AuthPhase::Anonymous);
    assert!(ctx.store.is_empty());
    assert!(ctx.notifier.redirected_to_login());
}

#[tokio::test]
async fn update_user_merges_locally() {
    let server = MockServer::start_async().await;
    let ctx = TestContext::new(&server);
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/login/");
            then.status(200).json_body(json!({
                "access": "a",
                "refresh": "r",
                "user": user_json(1, "staff"),
            }));
        })
        .await;

    let session = ctx.session();
    session.login(&credentials()).await.expect("login");
    let updated = session
        .update_user(&UserPatch {
            first_name: Some("Grace".into()),
            ..UserPatch::default()
        })
        .expect("update")
        .expect("signed in");

    assert_eq!(updated.first_name.as_deref(), Some("Grace"));
    assert_eq!(updated.email, "user1@example.com");
    assert_eq!(
        ctx.store.load_user().and_then(|u| u.first_name).as_deref(),
        Some("Grace")
    );

    session.logout();
    assert!(session
        .update_user(&UserPatch::default())
        .expect("no-op")
        .is_none());
}

/// Memory store whose writes can be switched off.
#[derive(Default)]
struct FlakyStore {
    inner: MemorySessionStore,
    reject_writes: AtomicBool,
}

impl FlakyStore {
    fn check(&self) -> StoreResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        Ok(())
    }
}

impl SessionStore for FlakyStore {
    fn get(&self, key: StorageKey) -> StoreResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: StorageKey, value: &str) -> StoreResult<()> {
        self.check()?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: StorageKey) -> StoreResult<()> {
        self.check()?;
        self.inner.remove(key)
    }
}

#[tokio::test]
async fn failed_user_update_leaves_session_untouched() {
    let server = MockServer::start_async().await;
    let store = Arc::new(FlakyStore::default());
    let client = ApiClient::builder(server.url("/api"), store.clone())
        .build()
        .expect("client");
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/login/");
            then.status(200).json_body(json!({
                "access": "a",
                "refresh": "r",
                "user": user_json(1, "staff"),
            }));
        })
        .await;

    let session = SessionManager::new(client);
    session.login(&credentials()).await.expect("login");
    store.reject_writes.store(true, Ordering::SeqCst);

    let err = session
        .update_user(&UserPatch {
            first_name: Some("Grace".into()),
            ..UserPatch::default()
        })
        .expect_err("store rejects write");

    assert!(matches!(err, SessionError::Store(StoreError::Io(_))));
    let user = session.user().expect("still signed in");
    assert_eq!(user.first_name.as_deref(), Some("Test"));
    assert_eq!(
        store.load_user().and_then(|u| u.first_name).as_deref(),
        Some("Test")
    );
}

#[tokio::test]
async fn session_becomes_anonymous_when_client_tears_it_down() {
    let server = MockServer::start_async().await;
    let ctx = TestContext::new(&server);
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/login/");
            then.status(200).json_body(json!({
                "access": "a",
                "refresh": "r",
                "user": user_json(1, "super_admin"),
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/admin/tenants/");
            then.status(401);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/refresh/");
            then.status(401);
        })
        .await;

    let session = ctx.session();
    session.login(&credentials()).await.expect("login");
    let err = ctx
        .client
        .get::<serde_json::Value>("/admin/tenants/")
        .await
        .expect_err("expired");
    assert!(matches!(err, ApiError::SessionExpired));

    assert_eq!(session.state().phase, AuthPhase::Anonymous);
    let decision = RouteGuard::new([Role::SuperAdmin]).check(&session.state(), "/admin/tenants");
    assert!(matches!(decision, GuardDecision::RedirectToLogin { .. }));
}

#[tokio::test]
async fn protected_route_round_trip_returns_to_requested_path() {
    let server = MockServer::start_async().await;
    let ctx = TestContext::new(&server);
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/login/");
            then.status(200).json_body(json!({
                "access": "a",
                "refresh": "r",
                "user": user_json(1, "tenant_admin"),
            }));
        })
        .await;

    let session = ctx.session();
    let guard = RouteGuard::new([Role::TenantAdmin, Role::StaffAdmin]);

    assert_eq!(guard.check(&session.state(), "/batches"), GuardDecision::Loading);
    session.restore().await;
    let GuardDecision::RedirectToLogin { return_to } = guard.check(&session.state(), "/batches")
    else {
        panic!("expected redirect");
    };

    session.login(&credentials()).await.expect("login");
    let destination = session.post_login_destination(Some(&return_to));
    assert_eq!(destination, "/batches");
    assert_eq!(guard.check(&session.state(), &destination), GuardDecision::Render);
    assert!(!ctx
        .notifier
        .notices()
        .iter()
        .any(|n| matches!(n, Notice::RedirectToLogin { .. })));
}
