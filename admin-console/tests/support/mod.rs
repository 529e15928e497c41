#![allow(dead_code)]

use std::sync::Arc;

use admin_console::{
    ApiClient, MemorySessionStore, RecordingNotifier, SessionManager, SessionStore,
    SessionStoreExt,
};
use chrono::Utc;
use httpmock::MockServer;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use serde_json::{json, Value};

const TEST_SECRET: &[u8] = b"console-test-secret";

#[derive(Serialize)]
struct TokenClaims<'a> {
    sub: &'a str,
    token_type: &'a str,
    exp: i64,
    iat: i64,
}

/// HS256 access token expiring `ttl_secs` from now (negative for expired).
pub fn mint_token(subject: &str, ttl_secs: i64) -> String {
    let issued_at = Utc::now().timestamp();
    let claims = TokenClaims {
        sub: subject,
        token_type: "access",
        exp: issued_at + ttl_secs,
        iat: issued_at,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET),
    )
    .expect("sign token")
}

pub fn user_json(id: i64, role: &str) -> Value {
    json!({
        "id": id,
        "username": format!("user{id}"),
        "email": format!("user{id}@example.com"),
        "first_name": "Test",
        "last_name": "User",
        "role": role,
        "tenant": { "id": 1, "name": "Acme" }
    })
}

pub struct TestContext {
    pub client: ApiClient,
    pub store: Arc<MemorySessionStore>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestContext {
    pub fn new(server: &MockServer) -> Self {
        Self::with_proactive_refresh(server, true)
    }

    pub fn with_proactive_refresh(server: &MockServer, enabled: bool) -> Self {
        Self::with_base_url(&server.url("/api"), enabled)
    }

    pub fn with_base_url(base_url: &str, proactive_refresh: bool) -> Self {
        let store = Arc::new(MemorySessionStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let client = ApiClient::builder(base_url, store.clone())
            .with_notifier(notifier.clone())
            .with_proactive_refresh(proactive_refresh)
            .build()
            .expect("client");
        Self {
            client,
            store,
            notifier,
        }
    }

    /// Seeds the store as if `role` had signed in earlier.
    pub fn sign_in(&self, role: &str, access: &str, refresh: &str) {
        self.store.save_tokens(access, refresh).expect("tokens");
        let user = serde_json::from_value(user_json(1, role)).expect("user");
        self.store.save_user(&user).expect("user");
    }

    pub fn session(&self) -> SessionManager {
        SessionManager::new(self.client.clone())
    }

    pub fn stored(&self, key: admin_console::StorageKey) -> Option<String> {
        self.store.get(key).expect("store read")
    }
}
