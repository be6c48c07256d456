//! # staysign
//!
//! Rust client for the Staysign vacation-rental signage API.
//!
//! The client attaches the right credential to each request, refreshes the
//! user token pair transparently on 401 (one shared refresh no matter how
//! many requests fail at once, one retry per call), and reports session
//! events to the embedding application through [`SessionCallbacks`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use staysign::{Result, SessionCallbacks, StaysignClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = StaysignClient::builder()
//!         .callbacks(SessionCallbacks::new().on_tokens_changed(|update| {
//!             println!("new token expires at {:?}", update.expires_at);
//!         }))
//!         .build()?;
//!
//!     client.login("host@example.com", "hunter2").await?;
//!
//!     // `{ "data": {...} }` envelopes are unwrapped for you
//!     let property: serde_json::Value = client.get("/properties/p1").await?;
//!     println!("{property}");
//!     Ok(())
//! }
//! ```
//!
//! ## Displays
//!
//! Kiosk clients pair with [`StaysignClient::register_device`] and then
//! authenticate with the device token. [`StaysignClient::start_heartbeat`]
//! keeps the pairing alive; when the server rejects the pairing, all
//! credentials are cleared and the device-session-invalid callback fires.

pub mod auth;
pub mod callbacks;
pub mod client;
pub mod config;
pub mod device;
pub mod error;
pub mod models;
pub mod storage;
pub mod transport;

// Re-exports for ergonomic usage
pub use auth::Credentials;
pub use callbacks::SessionCallbacks;
pub use client::{StaysignClient, StaysignClientBuilder};
pub use config::ClientConfig;
pub use device::HeartbeatHandle;
pub use error::{ApiError, Error, Result};
pub use models::{
    AuthSession, DeviceInfo, DevicePairing, DeviceRegistration, HeartbeatPayload,
    RegisterRequest, TokenUpdate,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore, TokenPersistence};
pub use transport::RequestDescriptor;
