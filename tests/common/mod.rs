#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::{Value, json};
use staysign::{SessionCallbacks, StaysignClient, StaysignClientBuilder};
use wiremock::MockServer;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builder pointed at the mock server.
pub fn builder(server: &MockServer) -> StaysignClientBuilder {
    init_tracing();
    StaysignClient::builder().base_url(server.uri())
}

/// Refresh endpoint response body.
pub fn token_body(token: &str, refresh: &str) -> Value {
    json!({
        "token": token,
        "refresh_token": refresh,
        "expires_at": "2030-01-01T00:00:00Z"
    })
}

/// Shared invocation counter for callbacks.
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counters for the three session callbacks.
#[derive(Clone, Default)]
pub struct Events {
    pub tokens_changed: Counter,
    pub auth_error: Counter,
    pub session_invalid: Counter,
}

impl Events {
    pub fn callbacks(&self) -> SessionCallbacks {
        let tokens = self.tokens_changed.clone();
        let auth = self.auth_error.clone();
        let invalid = self.session_invalid.clone();
        SessionCallbacks::new()
            .on_tokens_changed(move |_| tokens.hit())
            .on_auth_error(move |_| auth.hit())
            .on_device_session_invalid(move || invalid.hit())
    }
}

/// Number of requests the server saw for `path`.
pub async fn hits(server: &MockServer, path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == path)
        .count()
}

/// Poll `cond` until it holds or two seconds pass.
pub async fn eventually<F: Fn() -> bool>(cond: F) -> bool {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}
