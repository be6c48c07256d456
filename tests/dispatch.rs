//! Request surface: credential selection, envelope handling, errors.

mod common;

use serde::Deserialize;
use serde_json::{Value, json};
use staysign::{Error, RequestDescriptor};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{Events, builder};

#[derive(Debug, Deserialize, PartialEq)]
struct Property {
    id: String,
}

#[tokio::test]
async fn test_data_envelope_is_unwrapped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/properties/p1"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": "p1" } })))
        .expect(1)
        .mount(&server)
        .await;

    let client = builder(&server).tokens("T1", "R1").build().unwrap();
    let property: Property = client.get("/properties/p1").await.unwrap();
    assert_eq!(property, Property { id: "p1".into() });
}

#[tokio::test]
async fn test_body_without_envelope_is_returned_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "views": 12, "items": [1, 2] })))
        .mount(&server)
        .await;

    let client = builder(&server).tokens("T1", "R1").build().unwrap();
    let value: Value = client.get("/stats").await.unwrap();
    assert_eq!(value, json!({ "views": 12, "items": [1, 2] }));
}

#[tokio::test]
async fn test_empty_success_body_is_null() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/properties/p1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = builder(&server).tokens("T1", "R1").build().unwrap();
    let value: Value = client.delete("/properties/p1").await.unwrap();
    assert_eq!(value, Value::Null);

    let unit: () = client.delete("/properties/p1").await.unwrap();
    assert_eq!(unit, ());
}

#[tokio::test]
async fn test_invalid_json_success_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = builder(&server).build().unwrap();
    let err = client.get::<Value>("/broken").await.unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

#[tokio::test]
async fn test_json_body_and_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/properties"))
        .and(header("authorization", "Bearer T1"))
        .and(header("content-type", "application/json"))
        .and(header("x-tenant", "acme"))
        .and(body_json(json!({ "name": "Beach House" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": { "id": "p9" } })))
        .expect(1)
        .mount(&server)
        .await;

    let client = builder(&server).tokens("T1", "R1").build().unwrap();
    let req = RequestDescriptor::post("/properties")
        .json(&json!({ "name": "Beach House" }))
        .header("x-tenant", "acme");
    let property: Property = client.request(req).await.unwrap();
    assert_eq!(property.id, "p9");

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("x-request-id").is_some());
}

#[tokio::test]
async fn test_put_and_patch() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/screens/s1"))
        .and(body_json(json!({ "layout": "grid" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": "s1" } })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/screens/s1"))
        .and(body_json(json!({ "title": "Welcome" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "s1" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = builder(&server).tokens("T1", "R1").build().unwrap();
    let a: Property = client.put("/screens/s1", &json!({ "layout": "grid" })).await.unwrap();
    let b: Property = client.patch("/screens/s1", &json!({ "title": "Welcome" })).await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_no_auth_sends_no_credential() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/public/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let client = builder(&server)
        .tokens("T1", "R1")
        .device_token("D1")
        .build()
        .unwrap();
    client
        .request_value(RequestDescriptor::get("/public/status").no_auth())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_anonymous_request_without_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/public/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let client = builder(&server).build().unwrap();
    let value: Value = client.get("/public/status").await.unwrap();
    assert_eq!(value, json!({ "ok": true }));

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_device_auth_uses_device_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/devices/me/content"))
        .and(header("authorization", "Bearer D1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = builder(&server)
        .tokens("T1", "R1")
        .device_token("D1")
        .build()
        .unwrap();
    let value = client
        .request_value(RequestDescriptor::get("/devices/me/content").device_auth())
        .await
        .unwrap();
    assert_eq!(value, json!([]));
}

#[tokio::test]
async fn test_error_message_extraction() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/message"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({ "message": "Invalid dates" })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/error"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({ "error": "Conflict" })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/plain"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let client = builder(&server).build().unwrap();

    let err = client.get::<Value>("/message").await.unwrap_err();
    let api = err.as_api().unwrap();
    assert_eq!(api.status, 422);
    assert_eq!(api.message, "Invalid dates");
    assert_eq!(api.body, json!({ "message": "Invalid dates" }));

    let err = client.get::<Value>("/error").await.unwrap_err();
    assert_eq!(err.as_api().unwrap().message, "Conflict");

    let err = client.get::<Value>("/plain").await.unwrap_err();
    let api = err.as_api().unwrap();
    assert_eq!(api.status, 502);
    assert_eq!(api.message, "Request failed with status 502");
    assert_eq!(api.body, json!("Bad Gateway"));
}

#[tokio::test]
async fn test_non_401_errors_do_not_fire_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forbidden"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "message": "nope" })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let events = Events::default();
    let client = builder(&server)
        .tokens("T1", "R1")
        .callbacks(events.callbacks())
        .build()
        .unwrap();

    let err = client.get::<Value>("/forbidden").await.unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert_eq!(events.auth_error.get(), 0);
}

#[tokio::test]
async fn test_unserializable_header_is_config_error() {
    let server = MockServer::start().await;
    let client = builder(&server).build().unwrap();

    let err = client
        .request_value(RequestDescriptor::get("/x").header("bad header", "v"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_connection_failure_is_network_error() {
    // Nothing listens on the server's port once it is dropped
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };

    common::init_tracing();
    let client = staysign::StaysignClient::builder().base_url(uri).build().unwrap();
    let err = client.get::<Value>("/x").await.unwrap_err();
    assert!(matches!(err, Error::Network(_)));
}

#[tokio::test]
async fn test_absolute_endpoint_stays_on_base_host() {
    let server = MockServer::start().await;
    let foreign = MockServer::start().await;

    let client = builder(&server).tokens("SECRET", "R1").build().unwrap();
    let endpoint = format!("{}/x", foreign.uri());
    let err = client
        .request_value(RequestDescriptor::get(endpoint).skip_token_refresh())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert!(foreign.received_requests().await.unwrap().is_empty());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
