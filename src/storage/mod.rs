//! Optional credential persistence.
//!
//! The client core never touches storage directly. When a
//! [`KeyValueStore`] is configured on the builder, a [`TokenPersistence`]
//! wrapper restores credentials at startup and writes every credential
//! change through.
//!
//! Backends:
//! - [`FileStore`] - single JSON file with 0600 permissions
//! - [`MemoryStore`] - in-memory (testing, ephemeral kiosks)

mod file;
mod memory;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::auth::Credentials;
use crate::error::{Error, Result};

// =============================================================================
// KeyValueStore trait
// =============================================================================

/// A string key-value store.
///
/// Implementations must be thread-safe; calls happen from whichever task
/// changed the credentials.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Name of this backend, for logs.
    fn name(&self) -> &str {
        "unknown"
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}

// =============================================================================
// TokenPersistence
// =============================================================================

/// Storage keys.
pub mod keys {
    pub const ACCESS_TOKEN: &str = concat!("staysign:", "access_token");
    pub const REFRESH_TOKEN: &str = concat!("staysign:", "refresh_token");
    pub const DEVICE_TOKEN: &str = concat!("staysign:", "device_token");
    pub const EXPIRES_AT: &str = concat!("staysign:", "expires_at");

    pub const ALL: [&str; 4] = [ACCESS_TOKEN, REFRESH_TOKEN, DEVICE_TOKEN, EXPIRES_AT];
}

/// Maps a [`Credentials`] set onto a [`KeyValueStore`].
pub struct TokenPersistence {
    store: Arc<dyn KeyValueStore>,
}

impl TokenPersistence {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Restore stored credentials. `None` if nothing is stored.
    #[instrument(skip(self), fields(store = self.store.name()))]
    pub fn load(&self) -> Result<Option<Credentials>> {
        let expires_at = match self.store.get(keys::EXPIRES_AT)? {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(&raw)
                    .map_err(|e| Error::Storage(format!("Invalid stored expiry '{raw}': {e}")))?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        let creds = Credentials {
            access_token: self.store.get(keys::ACCESS_TOKEN)?,
            refresh_token: self.store.get(keys::REFRESH_TOKEN)?,
            device_token: self.store.get(keys::DEVICE_TOKEN)?,
            expires_at,
        };

        Ok((!creds.is_empty()).then_some(creds))
    }

    /// Write the credential set. `None` fields are removed from the store.
    #[instrument(skip(self, creds), fields(store = self.store.name()))]
    pub fn save(&self, creds: &Credentials) -> Result<()> {
        let expires_at = creds.expires_at.map(|t| t.to_rfc3339());
        let fields = [
            (keys::ACCESS_TOKEN, creds.access_token.as_deref()),
            (keys::REFRESH_TOKEN, creds.refresh_token.as_deref()),
            (keys::DEVICE_TOKEN, creds.device_token.as_deref()),
            (keys::EXPIRES_AT, expires_at.as_deref()),
        ];

        for (key, value) in fields {
            match value {
                Some(v) => self.store.set(key, v)?,
                None => self.store.remove(key)?,
            }
        }
        Ok(())
    }

    /// Remove every stored credential.
    pub fn clear(&self) -> Result<()> {
        for key in keys::ALL {
            self.store.remove(key)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for TokenPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPersistence")
            .field("store", &self.store.name())
            .finish()
    }
}
