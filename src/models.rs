//! Wire types for the auth and device endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A freshly issued access/refresh token pair.
///
/// This is both the body returned by `POST /auth/refresh` and the payload
/// handed to the credential-change callback.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenUpdate {
    /// New access token.
    pub token: String,
    /// New refresh token. Rotates on every refresh.
    pub refresh_token: String,
    /// Access token expiry, if the server reports one in a form we can read.
    /// An unreadable expiry is dropped rather than failing the token pair.
    #[serde(default, deserialize_with = "lenient_expiry")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Accepts an RFC 3339 string or a Unix timestamp (seconds or milliseconds,
/// as a number or numeric string). Anything else becomes `None`.
fn lenient_expiry<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let parsed = raw.as_ref().and_then(parse_expiry);
    if parsed.is_none()
        && let Some(raw) = raw.filter(|v| !v.is_null())
    {
        tracing::warn!(expires_at = %raw, "Ignoring unreadable token expiry");
    }
    Ok(parsed)
}

fn parse_expiry(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| s.trim().parse::<i64>().ok().and_then(from_epoch)),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(from_epoch),
        _ => None,
    }
}

// Values past year 5138 in seconds are read as milliseconds.
fn from_epoch(n: i64) -> Option<DateTime<Utc>> {
    if n.abs() >= 100_000_000_000 {
        DateTime::from_timestamp_millis(n)
    } else {
        DateTime::from_timestamp(n, 0)
    }
}

impl std::fmt::Debug for TokenUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenUpdate")
            .field("token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Body sent to `POST /auth/refresh`.
#[derive(Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Result of `login` or `register`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    /// The issued token pair.
    #[serde(flatten)]
    pub tokens: TokenUpdate,
    /// The account the tokens belong to, as returned by the server.
    #[serde(default)]
    pub user: Option<Value>,
}

/// Body sent to `POST /auth/login`.
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body sent to `POST /auth/register`.
#[derive(Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("company", &self.company)
            .finish()
    }
}

/// Body sent to `POST /devices/register` to pair a display.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceRegistration {
    /// Pairing code shown on the display and entered by the host.
    pub pairing_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
}

/// Response of `POST /devices/register`.
#[derive(Clone, Deserialize)]
pub struct DevicePairing {
    /// Long-lived device credential.
    pub device_token: String,
    #[serde(default)]
    pub device: Option<DeviceInfo>,
}

impl std::fmt::Debug for DevicePairing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevicePairing")
            .field("device_token", &"<redacted>")
            .field("device", &self.device)
            .finish()
    }
}

/// A paired display as reported by `GET /devices/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub property_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_seen_at: Option<DateTime<Utc>>,
    /// Fields this SDK does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body sent to `POST /devices/heartbeat`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HeartbeatPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_screen: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
