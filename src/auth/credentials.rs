//! The credential set held by a client.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};

use crate::models::TokenUpdate;

/// Snapshot of the tokens a client holds.
#[derive(Clone, Default, PartialEq)]
pub struct Credentials {
    /// User access token.
    pub access_token: Option<String>,
    /// User refresh token, paired with `access_token`.
    pub refresh_token: Option<String>,
    /// Device token for kiosk-style clients.
    pub device_token: Option<String>,
    /// Expiry of `access_token`, if known.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Credentials holding only a user token pair.
    pub fn user(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
            ..Default::default()
        }
    }

    /// Credentials holding only a device token.
    pub fn device(device_token: impl Into<String>) -> Self {
        Self {
            device_token: Some(device_token.into()),
            ..Default::default()
        }
    }

    /// True if no token of any kind is held.
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.device_token.is_none()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn mask(v: &Option<String>) -> &'static str {
            if v.is_some() { "<redacted>" } else { "None" }
        }
        f.debug_struct("Credentials")
            .field("access_token", &mask(&self.access_token))
            .field("refresh_token", &mask(&self.refresh_token))
            .field("device_token", &mask(&self.device_token))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Which credential was attached to an outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Attached {
    Device,
    Access(String),
    Anonymous,
}

impl Attached {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Attached::Device => "device",
            Attached::Access(_) => "access",
            Attached::Anonymous => "none",
        }
    }
}

/// Owned, lock-guarded credential set.
///
/// All writes go through the methods here; the access/refresh pair is only
/// ever replaced as a unit. The lock is never held across an `.await`.
#[derive(Default)]
pub(crate) struct CredentialState {
    inner: RwLock<Credentials>,
}

impl CredentialState {
    pub(crate) fn new(initial: Credentials) -> Self {
        Self {
            inner: RwLock::new(initial),
        }
    }

    pub(crate) fn snapshot(&self) -> Credentials {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn access_token(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .access_token
            .clone()
    }

    pub(crate) fn refresh_token(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .refresh_token
            .clone()
    }

    pub(crate) fn has_refresh_token(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .refresh_token
            .is_some()
    }

    /// Pick the credential for a request.
    ///
    /// The device token wins when requested and held; otherwise the access
    /// token is used if auth is required.
    pub(crate) fn select(&self, use_device_token: bool, requires_auth: bool) -> (Attached, Option<String>) {
        let creds = self.inner.read().unwrap_or_else(PoisonError::into_inner);

        if !requires_auth {
            return (Attached::Anonymous, None);
        }
        if use_device_token && let Some(device) = &creds.device_token {
            return (Attached::Device, Some(device.clone()));
        }
        match &creds.access_token {
            Some(access) => (Attached::Access(access.clone()), Some(access.clone())),
            None => (Attached::Anonymous, None),
        }
    }

    /// Replace the access/refresh pair together. Returns the new snapshot.
    pub(crate) fn replace_pair(&self, update: &TokenUpdate) -> Credentials {
        let mut creds = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        creds.access_token = Some(update.token.clone());
        creds.refresh_token = Some(update.refresh_token.clone());
        creds.expires_at = update.expires_at;
        creds.clone()
    }

    /// Set the whole credential set, as an explicit application assignment.
    pub(crate) fn set(&self, credentials: Credentials) -> Credentials {
        let mut creds = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *creds = credentials;
        creds.clone()
    }

    pub(crate) fn set_device_token(&self, device_token: Option<String>) -> Credentials {
        let mut creds = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        creds.device_token = device_token;
        creds.clone()
    }

    /// Drop the user pair, keeping any device token.
    pub(crate) fn clear_user(&self) -> Credentials {
        let mut creds = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        creds.access_token = None;
        creds.refresh_token = None;
        creds.expires_at = None;
        creds.clone()
    }

    /// Drop everything. Idempotent.
    pub(crate) fn clear_all(&self) {
        let mut creds = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *creds = Credentials::default();
    }
}
