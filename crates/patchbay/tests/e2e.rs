// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests driving the gateway over a real socket.
//!
//! Each test builds the full relay stack (preference store, classifier,
//! wiremock upstream) behind a gateway bound to an ephemeral port, then
//! talks to it with a plain HTTP client exactly as a browser or agent
//! process would. Tests touching the process-wide interceptor slot are
//! serialized.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use patchbay_config::model::{ConversationConfig, UpstreamConfig};
use patchbay_context::WindowExtractor;
use patchbay_core::{
    ClassifierAdapter, PreferenceAdapter, PreferenceRecord, RoutePreference,
};
use patchbay_gateway::{build_router, run_server, GatewayState, ServerConfig};
use patchbay_relay::{interceptor, Interceptor, RelayController, Upstream};
use patchbay_test_utils::{MemoryPreferenceStore, MockClassifier};
use serial_test::serial;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Full relay stack with its collaborators still reachable for assertions.
struct Stack {
    upstream: MockServer,
    classifier: Arc<MockClassifier>,
    preferences: Arc<MemoryPreferenceStore>,
    controller: Arc<RelayController>,
}

async fn build_stack(record: PreferenceRecord, classifier: MockClassifier) -> Stack {
    let upstream = MockServer::start().await;
    let preferences = Arc::new(MemoryPreferenceStore::with_record(record));
    let classifier = Arc::new(classifier);

    let dispatcher = Upstream::from_config(&UpstreamConfig {
        origin: upstream.uri(),
        ..UpstreamConfig::default()
    })
    .unwrap();

    let controller = Arc::new(RelayController::new(
        Arc::clone(&preferences) as Arc<dyn PreferenceAdapter>,
        None,
        Arc::clone(&classifier) as Arc<dyn ClassifierAdapter>,
        dispatcher,
        WindowExtractor::new(&ConversationConfig::default()),
    ));

    Stack {
        upstream,
        classifier,
        preferences,
        controller,
    }
}

/// Serves the gateway router on an ephemeral port, returning the bound
/// address. The server task runs until the test process exits.
async fn spawn_gateway(origin: &str, preferences: Arc<dyn PreferenceAdapter>) -> SocketAddr {
    let state = GatewayState {
        preferences,
        upstream: Arc::new(
            Upstream::from_config(&UpstreamConfig {
                origin: origin.to_string(),
                ..UpstreamConfig::default()
            })
            .unwrap(),
        ),
        max_body_bytes: 1024 * 1024,
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Installs an interceptor into the process-wide slot and uninstalls it on
/// drop, so a panicking test cannot poison the slot for the next one.
struct InstalledInterceptor;

impl InstalledInterceptor {
    fn install(interceptor: Interceptor) -> Self {
        interceptor::install(interceptor).unwrap();
        Self
    }
}

impl Drop for InstalledInterceptor {
    fn drop(&mut self) {
        interceptor::uninstall();
    }
}

fn routing_record(catalog: Vec<RoutePreference>, default_model: &str) -> PreferenceRecord {
    PreferenceRecord {
        routing_enabled: Some(true),
        preferences: Some(catalog),
        default_model: Some(default_model.to_string()),
    }
}

fn code_route() -> RoutePreference {
    RoutePreference {
        name: "code_generation".to_string(),
        usage: "writing or refactoring code".to_string(),
        target_model: "qwen2.5-coder".to_string(),
    }
}

// ---- Gateway lifecycle ----

#[tokio::test]
async fn the_gateway_binds_and_shuts_down_cleanly() {
    let upstream = MockServer::start().await;
    let state = GatewayState {
        preferences: Arc::new(MemoryPreferenceStore::new()),
        upstream: Arc::new(
            Upstream::from_config(&UpstreamConfig {
                origin: upstream.uri(),
                ..UpstreamConfig::default()
            })
            .unwrap(),
        ),
        max_body_bytes: 1024,
    };
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    };

    let token = CancellationToken::new();
    let server_token = token.clone();
    let server = tokio::spawn(async move { run_server(&config, state, server_token).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    token.cancel();

    let result = server.await.unwrap();
    assert!(result.is_ok(), "server should shut down cleanly: {result:?}");
}

// ---- Relay pipeline over the socket ----

#[tokio::test]
#[serial]
async fn a_chat_request_is_routed_end_to_end_over_the_socket() {
    let record = routing_record(vec![code_route()], "llama3");
    let stack = build_stack(
        record,
        MockClassifier::with_replies(vec![r#"{"route": "code_generation"}"#.to_string()]),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("data: done\n\n"))
        .mount(&stack.upstream)
        .await;

    let _guard = InstalledInterceptor::install(Interceptor::new(
        "/v1/chat/completions",
        Arc::clone(&stack.controller),
    ));
    let addr = spawn_gateway(
        &stack.upstream.uri(),
        Arc::clone(&stack.preferences) as Arc<dyn PreferenceAdapter>,
    )
    .await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/v1/chat/completions"))
        .header("content-type", "application/json")
        .body(r#"{"model": "llama3", "messages": [{"role": "user", "content": "write a binary search in rust"}]}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "data: done\n\n");

    // The dispatched body reached the upstream with the routed model.
    let requests = stack.upstream.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let dispatched = String::from_utf8_lossy(&requests[0].body);
    assert!(
        dispatched.contains(r#""model":"qwen2.5-coder""#),
        "dispatched body: {dispatched}"
    );

    assert_eq!(stack.classifier.prompts().await.len(), 1);
}

#[tokio::test]
#[serial]
async fn an_unavailable_classifier_still_relays_with_the_default_model() {
    let record = routing_record(vec![code_route()], "fallback-model");
    let stack = build_stack(record, MockClassifier::unavailable()).await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("data: done\n\n"))
        .mount(&stack.upstream)
        .await;

    let _guard = InstalledInterceptor::install(Interceptor::new(
        "/v1/chat/completions",
        Arc::clone(&stack.controller),
    ));
    let addr = spawn_gateway(
        &stack.upstream.uri(),
        Arc::clone(&stack.preferences) as Arc<dyn PreferenceAdapter>,
    )
    .await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/v1/chat/completions"))
        .header("content-type", "application/json")
        .body(r#"{"model": "llama3", "messages": [{"role": "user", "content": "hi"}]}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "data: done\n\n");

    let requests = stack.upstream.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let dispatched = String::from_utf8_lossy(&requests[0].body);
    assert!(
        dispatched.contains(r#""model":"fallback-model""#),
        "dispatched body: {dispatched}"
    );
}

#[tokio::test]
#[serial]
async fn requests_forward_verbatim_while_no_interceptor_is_installed() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data": []}"#))
        .mount(&upstream)
        .await;

    let addr = spawn_gateway(
        &upstream.uri(),
        Arc::new(MemoryPreferenceStore::new()) as Arc<dyn PreferenceAdapter>,
    )
    .await;

    let response = reqwest::get(format!("http://{addr}/v1/models")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), r#"{"data": []}"#);
}

// ---- Admin surface over the socket ----

#[tokio::test]
async fn the_admin_surface_reads_and_writes_preferences() {
    let upstream = MockServer::start().await;
    let addr = spawn_gateway(
        &upstream.uri(),
        Arc::new(MemoryPreferenceStore::new()) as Arc<dyn PreferenceAdapter>,
    )
    .await;

    let client = reqwest::Client::new();
    let posted = client
        .post(format!("http://{addr}/patchbay/preferences"))
        .header("content-type", "application/json")
        .body(r#"{"routingEnabled": true, "defaultModel": "llama3"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(posted.status(), 200);

    let fetched: serde_json::Value = client
        .get(format!("http://{addr}/patchbay/preferences"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(fetched["routingEnabled"], serde_json::json!(true));
    assert_eq!(fetched["defaultModel"], serde_json::json!("llama3"));
}

#[tokio::test]
#[serial]
async fn the_health_endpoint_answers_over_the_socket() {
    let upstream = MockServer::start().await;
    let addr = spawn_gateway(
        &upstream.uri(),
        Arc::new(MemoryPreferenceStore::new()) as Arc<dyn PreferenceAdapter>,
    )
    .await;

    let health: serde_json::Value = reqwest::get(format!("http://{addr}/patchbay/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(health["status"], serde_json::json!("ok"));
    assert_eq!(health["in_flight"], serde_json::json!(0));
}
