use std::sync::Mutex;

use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Something the user should see: a transient toast, a blocking popup, or a
/// forced navigation to the login screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Toast {
        level: NoticeLevel,
        message: String,
    },
    ErrorPopup {
        title: String,
        message: String,
    },
    RedirectToLogin {
        return_to: Option<String>,
    },
}

impl Notice {
    pub fn error_toast(message: impl Into<String>) -> Self {
        Notice::Toast {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn popup(title: impl Into<String>, message: impl Into<String>) -> Self {
        Notice::ErrorPopup {
            title: title.into(),
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Default sink for headless use: notices become log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Toast { level, message } => match level {
                NoticeLevel::Error => error!(%message, "toast"),
                NoticeLevel::Warning => warn!(%message, "toast"),
                NoticeLevel::Info | NoticeLevel::Success => info!(%message, "toast"),
            },
            Notice::ErrorPopup { title, message } => error!(%title, %message, "error popup"),
            Notice::RedirectToLogin { return_to } => {
                warn!(return_to = ?return_to, "redirecting to login")
            }
        }
    }
}

/// Keeps every notice in memory; used by tests and by callers that render
/// notices themselves.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().expect("mutex poisoned").clone()
    }

    pub fn toasts(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|notice| match notice {
                Notice::Toast { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn popups(&self) -> Vec<(String, String)> {
        self.notices()
            .into_iter()
            .filter_map(|notice| match notice {
                Notice::ErrorPopup { title, message } => Some((title, message)),
                _ => None,
            })
            .collect()
    }

    pub fn redirected_to_login(&self) -> bool {
        self.notices()
            .iter()
            .any(|notice| matches!(notice, Notice::RedirectToLogin { .. }))
    }

    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().expect("mutex poisoned"))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().expect("mutex poisoned").push(notice);
    }
}
