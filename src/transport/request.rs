//! Per-call request description.

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;

/// One API call: endpoint, verb, body and auth options.
///
/// Built per call and consumed by the dispatcher.
///
/// ```rust
/// use staysign::RequestDescriptor;
///
/// let request = RequestDescriptor::post("/properties")
///     .json(&serde_json::json!({ "name": "Beach House" }))
///     .header("x-locale", "en-GB");
/// ```
#[derive(Debug)]
pub struct RequestDescriptor {
    pub(crate) endpoint: String,
    pub(crate) method: Method,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Value>,
    pub(crate) use_device_token: bool,
    pub(crate) requires_auth: bool,
    pub(crate) skip_token_refresh: bool,
    // Surfaced when dispatched, like reqwest's builder.
    pub(crate) build_error: Option<crate::Error>,
}

impl RequestDescriptor {
    /// New request with auth required and refresh enabled.
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            headers: HeaderMap::new(),
            body: None,
            use_device_token: false,
            requires_auth: true,
            skip_token_refresh: false,
            build_error: None,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PUT, endpoint)
    }

    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PATCH, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    /// Serialize `body` as the JSON request body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.body = Some(value),
            Err(e) => self.build_error = Some(e.into()),
        }
        self
    }

    /// Add an extra request header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => {
                self.build_error = Some(crate::Error::Config(format!(
                    "Invalid header '{name}'"
                )));
            }
        }
        self
    }

    /// Authenticate with the device token when one is held.
    pub fn device_auth(mut self) -> Self {
        self.use_device_token = true;
        self
    }

    /// Send without any credential, regardless of held tokens.
    pub fn no_auth(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    /// Never trigger a token refresh for this request, even on 401.
    pub fn skip_token_refresh(mut self) -> Self {
        self.skip_token_refresh = true;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn method(&self) -> &Method {
        &self.method
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let req = RequestDescriptor::get("/properties");
        assert!(req.requires_auth);
        assert!(!req.use_device_token);
        assert!(!req.skip_token_refresh);
        assert!(req.body.is_none());
        assert_eq!(req.method(), &Method::GET);
    }

    #[test]
    fn test_builder_flags() {
        let req = RequestDescriptor::post("/auth/refresh")
            .json(&json!({ "refresh_token": "R1" }))
            .no_auth()
            .skip_token_refresh();

        assert!(!req.requires_auth);
        assert!(req.skip_token_refresh);
        assert_eq!(req.body, Some(json!({ "refresh_token": "R1" })));
    }

    #[test]
    fn test_invalid_header_is_deferred() {
        let req = RequestDescriptor::get("/x").header("bad header", "v");
        assert!(matches!(req.build_error, Some(crate::Error::Config(_))));
    }
}
