//! Single-flight token refresh.
//!
//! At most one `POST /auth/refresh` is in flight per client. The first caller
//! that needs a refresh spawns it and parks a shared handle in the
//! coordinator; every caller arriving while it runs awaits that same handle
//! and sees the same outcome. The handle is cleared when the refresh
//! finishes, success or not, so a later 401 can start a fresh attempt.
//!
//! The refresh runs as its own Tokio task, so it completes and updates the
//! credentials even if every caller waiting on it is dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{debug, info, warn};

use crate::client::ClientInner;
use crate::config::endpoints;
use crate::error::{Error, Result};
use crate::models::{RefreshRequest, TokenUpdate};
use crate::transport::RequestDescriptor;

type RefreshOutcome = std::result::Result<(), Arc<Error>>;
type InFlight = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Holds the handle of the refresh currently in flight, if any.
#[derive(Default)]
pub(crate) struct RefreshCoordinator {
    in_flight: Mutex<Option<InFlight>>,
}

impl RefreshCoordinator {
    fn slot(&self) -> MutexGuard<'_, Option<InFlight>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_refreshing(&self) -> bool {
        self.slot().is_some()
    }

    fn finish(&self) {
        self.slot().take();
    }
}

impl ClientInner {
    /// Refresh the token pair, joining any refresh already in flight.
    ///
    /// `stale_access` is the access token the caller's failed request carried.
    /// If the held token already differs from it, a refresh completed since
    /// the request went out and the caller can retry without another one.
    pub(crate) async fn refresh_tokens(self: &Arc<Self>, stale_access: Option<String>) -> Result<()> {
        let pending = {
            let mut slot = self.refresh.slot();
            match slot.as_ref() {
                Some(pending) => {
                    debug!("Joining in-flight token refresh");
                    pending.clone()
                }
                None => {
                    if let Some(stale) = &stale_access
                        && self
                            .credentials
                            .access_token()
                            .is_some_and(|current| &current != stale)
                    {
                        debug!("Access token rotated since the request was sent; not refreshing");
                        return Ok(());
                    }

                    let refresh_token = self
                        .credentials
                        .refresh_token()
                        .ok_or(Error::NotAuthenticated)?;
                    let pending = self.spawn_refresh(refresh_token);
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await.map_err(Error::RefreshFailed)
    }

    fn spawn_refresh(self: &Arc<Self>, refresh_token: String) -> InFlight {
        let inner = Arc::clone(self);
        let task = tokio::spawn(async move {
            info!("Refreshing access token");
            let outcome = inner.exchange_refresh_token(&refresh_token).await;
            match &outcome {
                Ok(()) => info!("Token refreshed successfully"),
                Err(e) => warn!(error = %e, "Token refresh failed"),
            }
            inner.refresh.finish();
            outcome.map_err(Arc::new)
        });

        async move {
            task.await
                .unwrap_or_else(|e| Err(Arc::new(Error::Task(e.to_string()))))
        }
        .boxed()
        .shared()
    }

    /// Exchange the refresh token and install the new pair.
    ///
    /// Existing tokens are left untouched on failure.
    async fn exchange_refresh_token(self: &Arc<Self>, refresh_token: &str) -> Result<()> {
        let request = RequestDescriptor::post(endpoints::REFRESH)
            .json(&RefreshRequest { refresh_token })
            .no_auth()
            .skip_token_refresh();

        let payload = Box::pin(self.dispatch(request)).await?;
        let update: TokenUpdate = serde_json::from_value(payload)?;
        self.apply_token_update(&update);
        Ok(())
    }
}
