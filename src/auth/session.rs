//! Account login, registration and logout.

use tracing::{info, warn};

use crate::client::StaysignClient;
use crate::config::endpoints;
use crate::error::Result;
use crate::models::{AuthSession, LoginRequest, RegisterRequest};
use crate::transport::RequestDescriptor;

impl StaysignClient {
    /// Create an account and sign in with it.
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthSession> {
        let req = RequestDescriptor::post(endpoints::REGISTER)
            .json(request)
            .no_auth()
            .skip_token_refresh();
        let session: AuthSession = self.request(req).await?;
        self.inner.apply_token_update(&session.tokens);
        info!("Registered and signed in");
        Ok(session)
    }

    /// Sign in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let req = RequestDescriptor::post(endpoints::LOGIN)
            .json(&LoginRequest { email, password })
            .no_auth()
            .skip_token_refresh();
        let session: AuthSession = self.request(req).await?;
        self.inner.apply_token_update(&session.tokens);
        info!("Signed in");
        Ok(session)
    }

    /// Refresh the token pair now, sharing any refresh already in flight.
    pub async fn refresh_session(&self) -> Result<()> {
        self.inner.refresh_tokens(None).await
    }

    /// Sign out. The server call is best effort; the user token pair is
    /// dropped locally either way. A device token is kept.
    pub async fn logout(&self) {
        if self.is_authenticated() {
            let req = RequestDescriptor::post(endpoints::LOGOUT).skip_token_refresh();
            if let Err(e) = self.request_value(req).await {
                warn!(error = %e, "Logout request failed; clearing tokens locally");
            }
        }
        self.inner.update_credentials(|state| state.clear_user());
        info!("Signed out");
    }
}
