use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ExpiryConfig;
use crate::error::{AuthError, AuthResult};

/// Claims read from an access token without verifying its signature.
///
/// The client never holds the signing key; it only inspects `exp` to decide
/// whether a refresh is due before sending a request. The server remains the
/// authority on validity.
#[derive(Debug, Clone, Serialize)]
pub struct AccessClaims {
    pub subject: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub issued_at: Option<DateTime<Utc>>,
    pub token_type: Option<String>,
    pub raw: Value,
}

impl AccessClaims {
    pub fn decode_unverified(token: &str) -> AuthResult<Self> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<Value>(token, &DecodingKey::from_secret(&[]), &validation)?;
        Self::try_from(data.claims)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>, config: &ExpiryConfig) -> bool {
        self.expires_at - Duration::seconds(i64::from(config.leeway_seconds)) <= now
    }

    pub fn is_expired(&self, config: &ExpiryConfig) -> bool {
        self.is_expired_at(Utc::now(), config)
    }
}

#[derive(Debug, Deserialize)]
struct ClaimsRepr {
    #[serde(default)]
    sub: Option<Value>,
    #[serde(default)]
    user_id: Option<Value>,
    exp: i64,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
}

fn subject_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl TryFrom<Value> for AccessClaims {
    type Error = AuthError;

    fn try_from(value: Value) -> AuthResult<Self> {
        let repr: ClaimsRepr = serde_json::from_value(value.clone())
            .map_err(|err| AuthError::InvalidJson(err.to_string()))?;

        let expires_at = Utc
            .timestamp_opt(repr.exp, 0)
            .single()
            .ok_or_else(|| AuthError::InvalidClaim("exp", repr.exp.to_string()))?;

        let issued_at = match repr.iat {
            Some(iat) => Some(
                Utc.timestamp_opt(iat, 0)
                    .single()
                    .ok_or_else(|| AuthError::InvalidClaim("iat", iat.to_string()))?,
            ),
            None => None,
        };

        let subject = repr.sub.or(repr.user_id).and_then(subject_string);

        Ok(Self {
            subject,
            expires_at,
            issued_at,
            token_type: repr.token_type,
            raw: value,
        })
    }
}
