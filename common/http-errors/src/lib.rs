use std::collections::BTreeMap;
use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Keys that carry a request-level message rather than a field error.
const MESSAGE_KEYS: &[&str] = &[
    "detail",
    "message",
    "error",
    "error_description",
    "non_field_errors",
];

const MAX_RAW_MESSAGE: usize = 200;

/// Field-keyed validation messages as returned with a 400 response.
///
/// Nested objects are flattened with dotted keys (`tenant.name`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: &Value) -> Self {
        let mut errors = Self::new();
        if let Value::Object(map) = value {
            for (key, entry) in map {
                if MESSAGE_KEYS.contains(&key.as_str()) {
                    continue;
                }
                errors.collect(key.clone(), entry);
            }
        }
        errors
    }

    fn collect(&mut self, key: String, entry: &Value) {
        match entry {
            Value::String(message) => self.push(key, message.clone()),
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::String(message) => self.push(key.clone(), message.clone()),
                        Value::Object(_) => self.collect(key.clone(), item),
                        _ => {}
                    }
                }
            }
            Value::Object(nested) => {
                for (child, value) in nested {
                    self.collect(format!("{key}.{child}"), value);
                }
            }
            _ => {}
        }
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn first(&self, field: &str) -> Option<&str> {
        self.get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// All messages joined into one line, prefixed by field name.
    pub fn summary(&self) -> String {
        self.0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Failure taxonomy surfaced by the API client.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("network error: {message}")]
    Network { message: String },
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },
    #[error("session expired, please sign in again")]
    SessionExpired,
    #[error("forbidden: {message}")]
    Forbidden { message: String },
    #[error("not found: {message}")]
    NotFound { message: String },
    #[error("validation failed: {}", validation_text(.errors, .message))]
    /// 400 or 422; `status` keeps which one the server sent.
    Validation {
        status: StatusCode,
        errors: FieldErrors,
        message: Option<String>,
    },
    #[error("request failed ({status}): {message}")]
    Client { status: StatusCode, message: String },
    #[error("server error ({status}): {message}")]
    Server { status: StatusCode, message: String },
    #[error("failed to decode response: {message}")]
    Decode { message: String },
}

fn validation_text(errors: &FieldErrors, message: &Option<String>) -> String {
    match (message, errors.is_empty()) {
        (Some(message), true) => message.clone(),
        (Some(message), false) => format!("{message} ({})", errors.summary()),
        (None, false) => errors.summary(),
        (None, true) => "invalid request".to_string(),
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn network<E: fmt::Display>(err: E) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }

    pub fn decode<E: fmt::Display>(err: E) -> Self {
        Self::Decode {
            message: err.to_string(),
        }
    }

    /// Classifies a non-success response by status and body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed = serde_json::from_str::<Value>(body).ok();
        let message = parsed
            .as_ref()
            .and_then(extract_message)
            .or_else(|| raw_message(body))
            .unwrap_or_else(|| default_message(status));

        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let errors = parsed
                    .as_ref()
                    .map(FieldErrors::from_value)
                    .unwrap_or_default();
                let message = parsed
                    .as_ref()
                    .and_then(extract_message)
                    .or_else(|| errors.is_empty().then_some(message));
                ApiError::Validation {
                    status,
                    errors,
                    message,
                }
            }
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized { message },
            StatusCode::FORBIDDEN => ApiError::Forbidden { message },
            StatusCode::NOT_FOUND => ApiError::NotFound { message },
            s if s.is_server_error() => ApiError::Server { status, message },
            _ => ApiError::Client { status, message },
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized { .. } | ApiError::SessionExpired => {
                Some(StatusCode::UNAUTHORIZED)
            }
            ApiError::Forbidden { .. } => Some(StatusCode::FORBIDDEN),
            ApiError::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            ApiError::Validation { status, .. }
            | ApiError::Client { status, .. }
            | ApiError::Server { status, .. } => Some(*status),
            ApiError::Network { .. } | ApiError::Decode { .. } => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Network { .. } => "network_error",
            ApiError::Unauthorized { .. } => "unauthorized",
            ApiError::SessionExpired => "session_expired",
            ApiError::Forbidden { .. } => "forbidden",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Validation { .. } => "validation_failed",
            ApiError::Client { .. } => "client_error",
            ApiError::Server { .. } => "server_error",
            ApiError::Decode { .. } => "decode_error",
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Validation { errors, .. } if !errors.is_empty() => Some(errors),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, ApiError::Forbidden { .. })
    }

    /// Whether a generic notification should be shown for this error.
    ///
    /// 404s and field-level validation errors are left to the call site.
    pub fn should_notify(&self) -> bool {
        match self {
            ApiError::NotFound { .. } | ApiError::SessionExpired => false,
            ApiError::Validation { errors, .. } => errors.is_empty(),
            _ => true,
        }
    }

    /// Human-facing message for toasts and popups.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network { .. } => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            ApiError::Unauthorized { message }
            | ApiError::Forbidden { message }
            | ApiError::NotFound { message }
            | ApiError::Client { message, .. } => message.clone(),
            ApiError::SessionExpired => "Your session has expired. Please sign in again.".to_string(),
            ApiError::Validation {
                errors, message, ..
            } => validation_text(errors, message),
            ApiError::Server { message, .. } => {
                format!("{message}. Please try again in a moment.")
            }
            ApiError::Decode { .. } => "The server returned an unexpected response.".to_string(),
        }
    }
}

fn extract_message(value: &Value) -> Option<String> {
    let map = value.as_object()?;
    MESSAGE_KEYS.iter().find_map(|key| match map.get(*key)? {
        Value::String(message) if !message.trim().is_empty() => Some(message.trim().to_string()),
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(" ");
            (!joined.is_empty()).then_some(joined)
        }
        _ => None,
    })
}

fn raw_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.starts_with('<') || trimmed.starts_with('{') {
        return None;
    }
    Some(trimmed.chars().take(MAX_RAW_MESSAGE).collect())
}

fn default_message(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}
