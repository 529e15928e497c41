use common_auth::{ensure_role, GuardError, Role};
use tracing::debug;

use crate::session::{AuthPhase, AuthState};

pub const LOGIN_ROUTE: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session state is still settling; show neither content nor a redirect.
    Loading,
    RedirectToLogin { return_to: String },
    Forbidden { required: Vec<Role> },
    Render,
}

impl GuardDecision {
    /// Login URL carrying the preserved path, for `RedirectToLogin`.
    pub fn redirect_url(&self) -> Option<String> {
        match self {
            GuardDecision::RedirectToLogin { return_to } => Some(format!(
                "{LOGIN_ROUTE}?next={}",
                urlencoding::encode(return_to)
            )),
            _ => None,
        }
    }
}

/// Gate for a protected view. An empty role set admits any signed-in user.
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    required: Vec<Role>,
}

impl RouteGuard {
    pub fn new(required: impl IntoIterator<Item = Role>) -> Self {
        Self {
            required: required.into_iter().collect(),
        }
    }

    pub fn any_authenticated() -> Self {
        Self::default()
    }

    pub fn required(&self) -> &[Role] {
        &self.required
    }

    pub fn check(&self, state: &AuthState, requested_path: &str) -> GuardDecision {
        if state.phase.is_loading() {
            return GuardDecision::Loading;
        }
        if state.phase != AuthPhase::Authenticated {
            return GuardDecision::RedirectToLogin {
                return_to: requested_path.to_string(),
            };
        }

        match ensure_role(state.role(), &self.required) {
            Ok(()) => GuardDecision::Render,
            Err(GuardError::Unauthenticated) => GuardDecision::RedirectToLogin {
                return_to: requested_path.to_string(),
            },
            Err(GuardError::Forbidden { actual, .. }) => {
                debug!(path = requested_path, role = %actual, "route forbidden for role");
                GuardDecision::Forbidden {
                    required: self.required.clone(),
                }
            }
        }
    }
}
