//! Session notifications delivered to the embedding application.
//!
//! The client never decides UI or storage policy itself. It reports three
//! events and leaves the follow-up to the application:
//!
//! - credential change (after login, register and every successful refresh)
//! - an authentication error that refresh could not resolve
//! - device session invalidation (a device-authenticated info fetch got 401)
//!
//! Callbacks run synchronously on the task that observed the event, so they
//! should be quick. Any of them may be omitted. When no device-session
//! callback is set, the configured recovery strategy runs instead.

use std::sync::Arc;

use tracing::warn;

use crate::error::ApiError;
use crate::models::TokenUpdate;

type TokensChangedFn = dyn Fn(&TokenUpdate) + Send + Sync;
type AuthErrorFn = dyn Fn(&ApiError) + Send + Sync;
type SessionInvalidFn = dyn Fn() + Send + Sync;

/// Registered session callbacks.
#[derive(Clone, Default)]
pub struct SessionCallbacks {
    tokens_changed: Option<Arc<TokensChangedFn>>,
    auth_error: Option<Arc<AuthErrorFn>>,
    device_session_invalid: Option<Arc<SessionInvalidFn>>,
    recovery: Option<Arc<SessionInvalidFn>>,
}

impl SessionCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the new token pair after login, register and refresh.
    pub fn on_tokens_changed<F>(mut self, f: F) -> Self
    where
        F: Fn(&TokenUpdate) + Send + Sync + 'static,
    {
        self.tokens_changed = Some(Arc::new(f));
        self
    }

    /// Called when a 401 could not be resolved by refreshing.
    pub fn on_auth_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&ApiError) + Send + Sync + 'static,
    {
        self.auth_error = Some(Arc::new(f));
        self
    }

    /// Called after the device pairing was rejected and all credentials
    /// were cleared.
    pub fn on_device_session_invalid<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.device_session_invalid = Some(Arc::new(f));
        self
    }

    /// Recovery action used when no device-session callback is registered,
    /// e.g. returning a kiosk to its pairing screen.
    pub fn recovery_strategy<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.recovery = Some(Arc::new(f));
        self
    }

    pub(crate) fn tokens_changed(&self, update: &TokenUpdate) {
        if let Some(f) = &self.tokens_changed {
            f(update);
        }
    }

    pub(crate) fn auth_error(&self, error: &ApiError) {
        if let Some(f) = &self.auth_error {
            f(error);
        }
    }

    pub(crate) fn device_session_invalid(&self) {
        match (&self.device_session_invalid, &self.recovery) {
            (Some(f), _) => f(),
            (None, Some(recover)) => recover(),
            (None, None) => {
                warn!("Device session is no longer valid; the device must be paired again");
            }
        }
    }
}

impl std::fmt::Debug for SessionCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCallbacks")
            .field("tokens_changed", &self.tokens_changed.is_some())
            .field("auth_error", &self.auth_error.is_some())
            .field("device_session_invalid", &self.device_session_invalid.is_some())
            .field("recovery", &self.recovery.is_some())
            .finish()
    }
}
