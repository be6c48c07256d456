//! The authenticated request dispatcher.

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::credentials::Attached;
use crate::client::ClientInner;
use crate::error::{ApiError, Result};
use crate::transport::request::RequestDescriptor;
use crate::transport::{envelope, headers};

impl ClientInner {
    /// Send one logical call and return the unwrapped success payload.
    ///
    /// A 401 with a refresh token held triggers a shared refresh and exactly
    /// one retry, marked `skip_token_refresh` so it cannot refresh again.
    /// Every other failure is classified and returned.
    pub(crate) async fn dispatch(self: &Arc<Self>, mut request: RequestDescriptor) -> Result<Value> {
        if let Some(err) = request.build_error.take() {
            return Err(err);
        }

        loop {
            let (attached, bearer) = self
                .credentials
                .select(request.use_device_token, request.requires_auth);
            let url = self.config.url(&request.endpoint);
            let hdrs = headers::api_headers(bearer.as_deref(), request.body.is_some(), &request.headers);

            debug!(
                method = %request.method,
                endpoint = request.endpoint.as_str(),
                credential = attached.kind(),
                retry = request.skip_token_refresh,
                "Dispatching request"
            );

            let mut builder = self
                .http
                .request(request.method.clone(), url.as_str())
                .headers(hdrs);
            if let Some(body) = &request.body {
                builder = builder.body(serde_json::to_vec(body)?);
            }

            let response = builder.send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;

            if status.is_success() {
                let payload = envelope::decode_success(&bytes)?;
                return Ok(envelope::unwrap_data(payload));
            }

            if status == StatusCode::UNAUTHORIZED
                && !request.skip_token_refresh
                && self.credentials.has_refresh_token()
            {
                info!(
                    endpoint = request.endpoint.as_str(),
                    "Got 401 - refreshing token and retrying"
                );
                let stale = match attached {
                    Attached::Access(token) => Some(token),
                    Attached::Device | Attached::Anonymous => None,
                };
                self.refresh_tokens(stale).await?;
                request.skip_token_refresh = true;
                continue;
            }

            let error = ApiError::from_response(status.as_u16(), envelope::decode_error(&bytes));
            if error.is_unauthorized() {
                warn!(
                    endpoint = request.endpoint.as_str(),
                    credential = attached.kind(),
                    "Authentication failed and cannot be refreshed"
                );
                self.callbacks.auth_error(&error);
            } else {
                debug!(
                    endpoint = request.endpoint.as_str(),
                    status = error.status,
                    "Request failed"
                );
            }
            return Err(error.into());
        }
    }
}
