//! Header construction for API requests.

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use uuid::Uuid;

/// Per-request correlation id header.
pub const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Build the headers for one request.
///
/// `bearer` is the credential chosen by the dispatcher, if any. The JSON
/// content type is only set when a body is sent. Caller-supplied `extra`
/// headers are applied last and may override the defaults.
pub fn api_headers(bearer: Option<&str>, has_body: bool, extra: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    if has_body {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    if let Some(token) = bearer {
        // A token with control characters cannot be sent; go out without it
        // and let the server answer 401.
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
            headers.insert(AUTHORIZATION, value);
        }
    }

    headers.insert(
        REQUEST_ID,
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("00000000-0000-0000-0000-000000000000")),
    );

    for (name, value) in extra {
        headers.insert(name.clone(), value.clone());
    }

    headers
}
