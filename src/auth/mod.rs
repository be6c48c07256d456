//! Credential handling: the held token set, single-flight refresh, and the
//! account session operations.

pub mod credentials;
pub(crate) mod refresh;
mod session;

pub use credentials::Credentials;
