use std::sync::RwLock;

use common_auth::Role;
use common_http_errors::ApiError;
use thiserror::Error;
use tracing::{info, warn};

use crate::auth_api::AuthApi;
use crate::client::ApiClient;
use crate::guard::LOGIN_ROUTE;
use crate::models::{
    LoginCredentials, LoginResponse, OAuthLogin, Registration, TenantProvisioning, User,
    UserPatch,
};
use crate::notify::Notice;
use crate::store::{SessionStoreExt, StorageKey, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// Startup: a stored session has not been validated yet.
    Restoring,
    Anonymous,
    Authenticating,
    Authenticated,
}

impl AuthPhase {
    pub fn is_loading(&self) -> bool {
        matches!(self, AuthPhase::Restoring | AuthPhase::Authenticating)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub phase: AuthPhase,
    pub user: Option<User>,
}

impl AuthState {
    pub fn restoring() -> Self {
        Self {
            phase: AuthPhase::Restoring,
            user: None,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            phase: AuthPhase::Anonymous,
            user: None,
        }
    }

    pub fn authenticated(user: User) -> Self {
        Self {
            phase: AuthPhase::Authenticated,
            user: Some(user),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase.is_loading()
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase == AuthPhase::Authenticated && self.user.is_some()
    }

    pub fn role(&self) -> Option<&Role> {
        self.user.as_ref().map(|user| &user.role)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Owns the signed-in user and drives the session lifecycle on top of the
/// shared client and store.
pub struct SessionManager {
    client: ApiClient,
    auth: AuthApi,
    state: RwLock<AuthState>,
}

impl SessionManager {
    pub fn new(client: ApiClient) -> Self {
        Self {
            auth: AuthApi::new(client.clone()),
            client,
            state: RwLock::new(AuthState::restoring()),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Current state. A session torn down by the client after a failed
    /// refresh is reported as anonymous.
    pub fn state(&self) -> AuthState {
        let mut guard = self.state.write().expect("rwlock poisoned");
        if guard.phase == AuthPhase::Authenticated
            && self.client.store().read(StorageKey::AccessToken).is_none()
        {
            info!("stored session disappeared, marking session anonymous");
            *guard = AuthState::anonymous();
        }
        guard.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state().user
    }

    fn set_state(&self, state: AuthState) {
        *self.state.write().expect("rwlock poisoned") = state;
    }

    fn set_phase(&self, phase: AuthPhase) {
        self.state.write().expect("rwlock poisoned").phase = phase;
    }

    /// Validates a stored session against the profile endpoint.
    pub async fn restore(&self) -> AuthState {
        self.set_phase(AuthPhase::Restoring);
        let store = self.client.store();
        if store.read(StorageKey::AccessToken).is_none() {
            self.set_state(AuthState::anonymous());
            return AuthState::anonymous();
        }

        match self.auth.profile().await {
            Ok(user) => {
                if let Err(err) = store.save_user(&user) {
                    warn!(error = %err, "failed to cache restored user profile");
                }
                info!(user_id = user.id, role = %user.role, "session restored");
                let state = AuthState::authenticated(user);
                self.set_state(state.clone());
                state
            }
            Err(err) => {
                warn!(error = %err, "stored session is no longer valid");
                self.clear_store();
                self.set_state(AuthState::anonymous());
                AuthState::anonymous()
            }
        }
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> SessionResult<User> {
        self.set_phase(AuthPhase::Authenticating);
        let outcome = self.auth.login(credentials).await;
        self.complete_sign_in("Login failed", outcome)
    }

    /// Registers a tenant admin, then signs in with the same credentials.
    pub async fn register(&self, registration: &Registration) -> SessionResult<User> {
        self.set_phase(AuthPhase::Authenticating);
        if let Err(err) = self.auth.register(registration).await {
            return Err(self.fail_sign_in("Registration failed", err));
        }
        info!(email = %registration.email, "registration accepted, signing in");
        self.login(&registration.credentials()).await
    }

    pub async fn login_with_oauth_token(
        &self,
        provider_token: &str,
        tenant_data: Option<TenantProvisioning>,
    ) -> SessionResult<User> {
        self.set_phase(AuthPhase::Authenticating);
        let request = OAuthLogin {
            token: provider_token.to_string(),
            tenant_data,
        };
        let outcome = self.auth.oauth_login(&request).await;
        self.complete_sign_in("Sign-in failed", outcome)
    }

    fn complete_sign_in(
        &self,
        title: &str,
        outcome: Result<LoginResponse, ApiError>,
    ) -> SessionResult<User> {
        let response = outcome.map_err(|err| self.fail_sign_in(title, err))?;
        let store = self.client.store();
        let persisted = store
            .save_tokens(&response.access, &response.refresh)
            .and_then(|()| store.save_user(&response.user));
        if let Err(err) = persisted {
            warn!(error = %err, "failed to persist session");
            self.clear_store();
            self.set_state(AuthState::anonymous());
            return Err(err.into());
        }

        info!(user_id = response.user.id, role = %response.user.role, "signed in");
        self.set_state(AuthState::authenticated(response.user.clone()));
        Ok(response.user)
    }

    fn fail_sign_in(&self, title: &str, err: ApiError) -> SessionError {
        warn!(code = err.code(), "sign-in failed");
        self.client
            .notifier()
            .notify(Notice::popup(title, err.user_message()));
        self.set_state(AuthState::anonymous());
        err.into()
    }

    /// Clears tokens and user. Safe to call repeatedly.
    pub fn logout(&self) {
        self.clear_store();
        self.set_state(AuthState::anonymous());
        info!("signed out");
    }

    /// Merges `patch` into the signed-in user and its cached copy.
    ///
    /// The cached copy is written first; on a storage error the in-memory user is left as it was.
    pub fn update_user(&self, patch: &UserPatch) -> SessionResult<Option<User>> {
        let mut updated = match self.state.read().expect("rwlock poisoned").user.clone() {
            Some(user) => user,
            None => return Ok(None),
        };
        updated.apply(patch);
        self.client.store().save_user(&updated)?;

        let mut guard = self.state.write().expect("rwlock poisoned");
        match guard.user.as_mut() {
            Some(user) if user.id == updated.id => *user = updated.clone(),
            _ => return Ok(None),
        }
        Ok(Some(updated))
    }

    /// Where to go after signing in: the preserved path, else the role's home.
    pub fn post_login_destination(&self, return_to: Option<&str>) -> String {
        match return_to {
            Some(path) if path.starts_with('/') && !path.starts_with("//") && path != LOGIN_ROUTE => {
                path.to_string()
            }
            _ => self
                .state()
                .role()
                .unwrap_or(&Role::Member)
                .home_route()
                .to_string(),
        }
    }

    /// Reacts to `ApiError::SessionExpired` from any call.
    pub fn handle_session_expired(&self) {
        self.clear_store();
        self.set_state(AuthState::anonymous());
    }

    fn clear_store(&self) {
        if let Err(err) = self.client.store().clear() {
            warn!(error = %err, "failed to clear session storage");
        }
    }
}
