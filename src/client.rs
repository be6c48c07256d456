//! Main client entry point.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::credentials::{CredentialState, Credentials};
use crate::auth::refresh::RefreshCoordinator;
use crate::callbacks::SessionCallbacks;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::TokenUpdate;
use crate::storage::{KeyValueStore, TokenPersistence};
use crate::transport::RequestDescriptor;

/// Staysign API client.
///
/// Cheap to clone; clones share credentials, the refresh coordinator and
/// callbacks.
///
/// # Examples
///
/// ```rust,no_run
/// use staysign::{SessionCallbacks, StaysignClient};
///
/// # async fn example() -> staysign::Result<()> {
/// let client = StaysignClient::builder()
///     .base_url("https://api.staysign.io/v1")
///     .callbacks(SessionCallbacks::new().on_auth_error(|err| {
///         eprintln!("signed out: {err}");
///     }))
///     .build()?;
///
/// client.login("host@example.com", "hunter2").await?;
/// let property: serde_json::Value = client.get("/properties/p1").await?;
/// println!("{property}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct StaysignClient {
    pub(crate) inner: Arc<ClientInner>,
}

/// State shared by every clone of a client.
pub(crate) struct ClientInner {
    pub(crate) config: ClientConfig,
    pub(crate) http: reqwest::Client,
    pub(crate) credentials: CredentialState,
    pub(crate) refresh: RefreshCoordinator,
    pub(crate) callbacks: SessionCallbacks,
    pub(crate) persistence: Option<TokenPersistence>,
    // Held from a credential mutation through its write-through.
    write_lock: Mutex<()>,
}

impl ClientInner {
    /// Install a new token pair, persist it and notify the application.
    pub(crate) fn apply_token_update(&self, update: &TokenUpdate) {
        self.update_credentials(|state| state.replace_pair(update));
        self.callbacks.tokens_changed(update);
    }

    /// Apply a credential mutation and write the result through to storage.
    ///
    /// Mutations and their writes are serialized, so the store always ends
    /// up holding what memory holds.
    pub(crate) fn update_credentials<F>(&self, mutate: F) -> Credentials
    where
        F: FnOnce(&CredentialState) -> Credentials,
    {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let creds = mutate(&self.credentials);
        self.persist(&creds);
        creds
    }

    fn persist(&self, creds: &Credentials) {
        if let Some(persistence) = &self.persistence
            && let Err(e) = persistence.save(creds)
        {
            warn!(store = persistence.store_name(), "Failed to persist tokens: {}", e);
        }
    }

    /// Clear every credential and report the lost device session.
    ///
    /// Credentials are cleared before the callback runs. Safe to call
    /// repeatedly.
    pub(crate) fn invalidate_device_session(&self) {
        warn!("Device session rejected; clearing all credentials");
        {
            let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.credentials.clear_all();
            if let Some(persistence) = &self.persistence
                && let Err(e) = persistence.clear()
            {
                warn!(store = persistence.store_name(), "Failed to clear stored tokens: {}", e);
            }
        }
        self.callbacks.device_session_invalid();
    }
}

impl StaysignClient {
    /// Create a builder for configuring the client.
    pub fn builder() -> StaysignClientBuilder {
        StaysignClientBuilder::new()
    }

    /// Send a request and decode the (unwrapped) success payload as `T`.
    pub async fn request<T: DeserializeOwned>(&self, request: RequestDescriptor) -> Result<T> {
        let payload = self.inner.dispatch(request).await?;
        Ok(serde_json::from_value(payload)?)
    }

    /// Send a request and return the raw unwrapped payload.
    pub async fn request_value(&self, request: RequestDescriptor) -> Result<Value> {
        self.inner.dispatch(request).await
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.request(RequestDescriptor::get(endpoint)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        self.request(RequestDescriptor::post(endpoint).json(body)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        self.request(RequestDescriptor::put(endpoint).json(body)).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        self.request(RequestDescriptor::patch(endpoint).json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.request(RequestDescriptor::delete(endpoint)).await
    }

    /// Snapshot of the held credentials.
    pub fn credentials(&self) -> Credentials {
        self.inner.credentials.snapshot()
    }

    /// True if an access token is held.
    pub fn is_authenticated(&self) -> bool {
        self.inner.credentials.snapshot().access_token.is_some()
    }

    /// True if a device token is held.
    pub fn has_device_token(&self) -> bool {
        self.inner.credentials.snapshot().device_token.is_some()
    }

    /// True while a token refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.inner.refresh.is_refreshing()
    }

    /// Install a token pair obtained elsewhere (e.g. restored by the app).
    ///
    /// Does not fire the credential-change callback.
    pub fn set_tokens(&self, access_token: impl Into<String>, refresh_token: impl Into<String>) {
        let update = TokenUpdate {
            token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at: None,
        };
        self.inner.update_credentials(|state| state.replace_pair(&update));
    }

    /// Assign or remove the device token.
    pub fn set_device_token(&self, device_token: Option<String>) {
        self.inner
            .update_credentials(|state| state.set_device_token(device_token));
    }

    /// Drop every held credential.
    pub fn clear_tokens(&self) {
        self.inner
            .update_credentials(|state| state.set(Credentials::default()));
    }

    /// The client's configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }
}

impl std::fmt::Debug for StaysignClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaysignClient")
            .field("base_url", &self.inner.config.base_url)
            .field("credentials", &self.inner.credentials.snapshot())
            .field("callbacks", &self.inner.callbacks)
            .field("has_storage", &self.inner.persistence.is_some())
            .finish()
    }
}

/// Builder for [`StaysignClient`].
#[derive(Default)]
pub struct StaysignClientBuilder {
    config: Option<ClientConfig>,
    base_url: Option<String>,
    credentials: Option<Credentials>,
    reqwest_client: Option<reqwest::Client>,
    callbacks: SessionCallbacks,
    storage: Option<Arc<dyn KeyValueStore>>,
}

impl StaysignClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a full configuration instead of the defaults.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Start with a user token pair.
    pub fn tokens(mut self, access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        let mut creds = self.credentials.take().unwrap_or_default();
        creds.access_token = Some(access_token.into());
        creds.refresh_token = Some(refresh_token.into());
        self.credentials = Some(creds);
        self
    }

    /// Start with a device token.
    pub fn device_token(mut self, device_token: impl Into<String>) -> Self {
        let mut creds = self.credentials.take().unwrap_or_default();
        creds.device_token = Some(device_token.into());
        self.credentials = Some(creds);
        self
    }

    /// Start with an explicit credential set.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set a custom reqwest client.
    pub fn reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.reqwest_client = Some(client);
        self
    }

    /// Register session callbacks.
    pub fn callbacks(mut self, callbacks: SessionCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Persist credentials to a key-value store.
    ///
    /// Stored credentials are restored at build time unless credentials were
    /// given explicitly.
    pub fn storage(mut self, storage: Arc<dyn KeyValueStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<StaysignClient> {
        let mut config = self.config.unwrap_or_default();
        if let Some(url) = self.base_url {
            config.base_url = url;
        }
        config.validate()?;

        let http = match self.reqwest_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .connect_timeout(config.connect_timeout)
                .timeout(config.request_timeout)
                .user_agent(config.user_agent.as_str())
                .build()
                .map_err(Error::Network)?,
        };

        let persistence = self.storage.map(TokenPersistence::new);

        let credentials = match (self.credentials, &persistence) {
            (Some(explicit), Some(persistence)) => {
                if let Err(e) = persistence.save(&explicit) {
                    warn!(store = persistence.store_name(), "Failed to persist tokens: {}", e);
                }
                explicit
            }
            (Some(explicit), None) => explicit,
            (None, Some(persistence)) => match persistence.load() {
                Ok(Some(restored)) => {
                    info!(source = persistence.store_name(), "Restored credentials from storage");
                    restored
                }
                Ok(None) => Credentials::default(),
                Err(e) => {
                    warn!(store = persistence.store_name(), "Failed to load stored tokens: {}", e);
                    Credentials::default()
                }
            },
            (None, None) => Credentials::default(),
        };

        info!(base_url = config.base_url.as_str(), "StaysignClient initialized");
        Ok(StaysignClient {
            inner: Arc::new(ClientInner {
                config,
                http,
                credentials: CredentialState::new(credentials),
                refresh: RefreshCoordinator::default(),
                callbacks: self.callbacks,
                persistence,
                write_lock: Mutex::new(()),
            }),
        })
    }
}
