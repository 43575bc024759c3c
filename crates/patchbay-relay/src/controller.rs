// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The controller realm: snapshot, classify, rewrite, dispatch, relay.
//!
//! Every external call in this path is attempted exactly once. Failures
//! degrade (passthrough body, indeterminate verdict, unrouted dispatch) or
//! terminate the session early; nothing is retried, so interception adds a
//! bounded amount of latency to every call.

use std::sync::Arc;

use dashmap::DashMap;
use futures::StreamExt;
use patchbay_context::WindowExtractor;
use patchbay_core::{
    ClassifierAdapter, ConversationAdapter, ConversationMessage, PatchbayError,
    PreferenceAdapter, PreferenceKey, RoutingSnapshot,
};
use patchbay_router::{decide, parse_route_verdict, render_route_prompt, RouteDecision};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::bridge::ControllerEnd;
use crate::session::{RelaySession, RelayState};
use crate::upstream::Upstream;
use crate::wire::ChatRequestBody;

/// Routes and relays intercepted chat calls.
///
/// One controller serves the whole process; each intercepted request runs
/// as an independent session task. Sessions share no mutable state beyond
/// the observability registry; each reads its own RoutingSnapshot.
pub struct RelayController {
    preferences: Arc<dyn PreferenceAdapter>,
    conversation: Option<Arc<dyn ConversationAdapter>>,
    classifier: Arc<dyn ClassifierAdapter>,
    upstream: Upstream,
    window: WindowExtractor,
    sessions: DashMap<Uuid, RelayState>,
}

impl RelayController {
    pub fn new(
        preferences: Arc<dyn PreferenceAdapter>,
        conversation: Option<Arc<dyn ConversationAdapter>>,
        classifier: Arc<dyn ClassifierAdapter>,
        upstream: Upstream,
        window: WindowExtractor,
    ) -> Self {
        Self {
            preferences,
            conversation,
            classifier,
            upstream,
            window,
            sessions: DashMap::new(),
        }
    }

    pub fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    /// Sessions currently in the controller realm, for health reporting.
    pub fn in_flight(&self) -> usize {
        self.sessions.len()
    }

    /// Runs one session to completion on its own task: waits for the
    /// snapshot, handles it, and always closes the bridge afterwards.
    pub async fn run(&self, mut end: ControllerEnd) {
        let request = match end.recv_fetch().await {
            Some(request) => request,
            None => {
                warn!("bridge dropped before a snapshot arrived");
                return;
            }
        };

        let mut session = RelaySession::new(request);
        self.sessions.insert(session.id(), session.state());
        debug!(
            session_id = %session.id(),
            path = session.request().path(),
            "relay session opened"
        );

        if let Err(e) = self.handle(&mut session, &end).await {
            warn!(session_id = %session.id(), error = %e, "relay session ended early");
        }

        self.close(&mut session, &end).await;
        self.sessions.remove(&session.id());
    }

    /// The full per-session flow. Errors terminate this session only; the
    /// caller closes the stream either way.
    pub async fn handle(
        &self,
        session: &mut RelaySession,
        end: &ControllerEnd,
    ) -> Result<(), PatchbayError> {
        let parsed = session.request().body.as_deref().map(ChatRequestBody::parse);
        let mut body = match parsed {
            Some(Ok(body)) => body,
            Some(Err(e)) => {
                debug!(
                    session_id = %session.id(),
                    error = %e,
                    "body is not a chat payload, relaying unmodified"
                );
                let original = session.request().body.clone();
                return self.relay(session, end, original).await;
            }
            None => {
                debug!(session_id = %session.id(), "no body to rewrite, relaying unmodified");
                return self.relay(session, end, None).await;
            }
        };

        let snapshot = self.snapshot().await;
        let decision = if snapshot.routing_enabled {
            self.classify(&body, &snapshot).await
        } else {
            RouteDecision::disabled(&snapshot)
        };

        info!(
            session_id = %session.id(),
            reason = %decision.reason,
            route = decision.route.as_deref().unwrap_or("-"),
            model = decision.model.as_deref().unwrap_or(&body.model),
            "route decided"
        );

        if let Some(model) = &decision.model {
            body.model = model.clone();
        }

        let bytes = body.to_bytes()?;
        self.relay(session, end, Some(bytes)).await
    }

    /// Reads the routing snapshot; an unreadable store degrades to
    /// unconfigured rather than failing the session.
    async fn snapshot(&self) -> RoutingSnapshot {
        match self.preferences.get(&PreferenceKey::ALL).await {
            Ok(record) => RoutingSnapshot::from_record(record),
            Err(e) => {
                warn!(error = %e, "preference store unreadable, dispatching unrouted");
                RoutingSnapshot::unconfigured()
            }
        }
    }

    /// Windows the conversation, classifies it once, and resolves the
    /// decision. Every failure degrades to an indeterminate verdict.
    async fn classify(&self, body: &ChatRequestBody, snapshot: &RoutingSnapshot) -> RouteDecision {
        let conversation = self.conversation_snapshot(body).await;
        let window = self.window.window(&conversation);
        let prompt = render_route_prompt(&snapshot.catalog, &window);

        let verdict = match self.classifier.classify(&prompt).await {
            Ok(reply) => parse_route_verdict(&reply),
            Err(e) => {
                warn!(error = %e, "classifier unavailable, verdict indeterminate");
                None
            }
        };

        decide(verdict.as_deref(), snapshot)
    }

    /// The conversation for this session, obtained exactly once: the
    /// collaborator's scrape when it yields anything, the request body's
    /// own messages otherwise.
    async fn conversation_snapshot(&self, body: &ChatRequestBody) -> Vec<ConversationMessage> {
        let scraped = match &self.conversation {
            Some(adapter) => match adapter.scrape().await {
                Ok(messages) => messages,
                Err(e) => {
                    warn!(error = %e, "conversation scrape failed, falling back to request body");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        if scraped.is_empty() {
            body.conversation()
        } else {
            scraped
        }
    }

    /// Dispatches upstream and forwards every body chunk across the bridge
    /// in arrival order.
    async fn relay(
        &self,
        session: &mut RelaySession,
        end: &ControllerEnd,
        body: Option<Vec<u8>>,
    ) -> Result<(), PatchbayError> {
        self.advance(session, RelayState::Dispatched);
        let response = self.upstream.dispatch(session.request(), body).await?;

        let mut stream = response.bytes_stream();
        while let Some(next) = stream.next().await {
            let chunk = next.map_err(|e| PatchbayError::UpstreamDispatch {
                message: format!("upstream body stream failed: {e}"),
                source: Some(Box::new(e)),
            })?;
            if session.state() == RelayState::Dispatched {
                self.advance(session, RelayState::Streaming);
            }
            end.send_chunk(chunk.to_vec()).await?;
        }
        Ok(())
    }

    /// Closes the session exactly once: state to `Closed`, one completion
    /// signal across the bridge.
    async fn close(&self, session: &mut RelaySession, end: &ControllerEnd) {
        if session.is_closed() {
            return;
        }
        self.advance(session, RelayState::Closed);
        end.send_done().await;
        debug!(session_id = %session.id(), "relay session closed");
    }

    fn advance(&self, session: &mut RelaySession, next: RelayState) {
        session.advance(next);
        if let Some(mut entry) = self.sessions.get_mut(&session.id()) {
            *entry = session.state();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use patchbay_core::{Role, RoutePreference};
    use patchbay_test_utils::RelayHarness;
    use wiremock::matchers::{body_bytes, method};
    use wiremock::{Mock, ResponseTemplate};

    fn catalog() -> Vec<RoutePreference> {
        vec![
            RoutePreference {
                name: "code_generation".to_string(),
                usage: "writing new code".to_string(),
                target_model: "gpt-4".to_string(),
            },
            RoutePreference {
                name: "summarization".to_string(),
                usage: "condensing long text".to_string(),
                target_model: "phi3-mini".to_string(),
            },
        ]
    }

    async fn mount_upstream_ok(harness: &RelayHarness) {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"data: done\n\n".to_vec()))
            .mount(&harness.upstream)
            .await;
    }

    async fn dispatched_body(harness: &RelayHarness) -> String {
        let requests = harness.upstream.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        String::from_utf8_lossy(&requests[0].body).to_string()
    }

    #[tokio::test]
    async fn routing_disabled_with_a_default_still_overwrites_the_model() {
        let harness = RelayHarness::builder()
            .with_routing_enabled(false)
            .with_default_model("llama3-large")
            .build()
            .await
            .unwrap();
        mount_upstream_ok(&harness).await;

        let payload = br#"{"model":"llama3-small","messages":[{"role":"user","content":"hi"}]}"#;
        let response = harness.handle(harness.chat_request(payload)).await.unwrap();
        response.collect_body().await.unwrap();

        let body = dispatched_body(&harness).await;
        assert!(body.contains(r#""model":"llama3-large""#), "{body}");
        assert!(harness.classifier.prompts().await.is_empty());
    }

    #[tokio::test]
    async fn routing_disabled_without_a_default_leaves_the_model_alone() {
        let harness = RelayHarness::builder()
            .with_routing_enabled(false)
            .build()
            .await
            .unwrap();
        mount_upstream_ok(&harness).await;

        let payload = br#"{"model":"llama3-small","messages":[{"role":"user","content":"hi"}]}"#;
        let response = harness.handle(harness.chat_request(payload)).await.unwrap();
        response.collect_body().await.unwrap();

        let body = dispatched_body(&harness).await;
        assert!(body.contains(r#""model":"llama3-small""#), "{body}");
    }

    #[tokio::test]
    async fn a_catalog_match_routes_to_the_preferred_model() {
        let harness = RelayHarness::builder()
            .with_routing_enabled(true)
            .with_catalog(catalog())
            .with_classifier_replies(vec![r#"{"route": "code_generation"}"#.to_string()])
            .build()
            .await
            .unwrap();
        mount_upstream_ok(&harness).await;

        let payload = br#"{"model":"llama3","messages":[{"role":"user","content":"write a lexer"}]}"#;
        let response = harness.handle(harness.chat_request(payload)).await.unwrap();
        response.collect_body().await.unwrap();

        let body = dispatched_body(&harness).await;
        assert!(body.contains(r#""model":"gpt-4""#), "{body}");
        assert_eq!(harness.classifier.prompts().await.len(), 1);
    }

    #[tokio::test]
    async fn an_unmatched_route_falls_back_to_the_default_model() {
        let harness = RelayHarness::builder()
            .with_routing_enabled(true)
            .with_catalog(catalog())
            .with_default_model("fallback-model")
            .with_classifier_replies(vec![r#"{"route": "image_generation"}"#.to_string()])
            .build()
            .await
            .unwrap();
        mount_upstream_ok(&harness).await;

        let payload = br#"{"model":"llama3","messages":[{"role":"user","content":"draw a cat"}]}"#;
        let response = harness.handle(harness.chat_request(payload)).await.unwrap();
        response.collect_body().await.unwrap();

        let body = dispatched_body(&harness).await;
        assert!(body.contains(r#""model":"fallback-model""#), "{body}");
    }

    #[tokio::test]
    async fn an_unparseable_reply_without_a_default_leaves_the_model_alone() {
        let harness = RelayHarness::builder()
            .with_routing_enabled(true)
            .with_catalog(catalog())
            .with_classifier_replies(vec!["the route is code_generation".to_string()])
            .build()
            .await
            .unwrap();
        mount_upstream_ok(&harness).await;

        let payload = br#"{"model":"llama3","messages":[{"role":"user","content":"write a lexer"}]}"#;
        let response = harness.handle(harness.chat_request(payload)).await.unwrap();
        response.collect_body().await.unwrap();

        let body = dispatched_body(&harness).await;
        assert!(body.contains(r#""model":"llama3""#), "{body}");
    }

    #[tokio::test]
    async fn an_unavailable_classifier_degrades_to_the_default_model() {
        let harness = RelayHarness::builder()
            .with_routing_enabled(true)
            .with_catalog(catalog())
            .with_default_model("safe-model")
            .with_unavailable_classifier()
            .build()
            .await
            .unwrap();
        mount_upstream_ok(&harness).await;

        let payload = br#"{"model":"llama3","messages":[{"role":"user","content":"hello"}]}"#;
        let response = harness.handle(harness.chat_request(payload)).await.unwrap();
        response.collect_body().await.unwrap();

        let body = dispatched_body(&harness).await;
        assert!(body.contains(r#""model":"safe-model""#), "{body}");
        // The single attempt was made before degrading.
        assert_eq!(harness.classifier.prompts().await.len(), 1);
    }

    #[tokio::test]
    async fn a_failing_preference_store_dispatches_the_original_model() {
        let harness = RelayHarness::builder()
            .with_failing_store()
            .build()
            .await
            .unwrap();
        mount_upstream_ok(&harness).await;

        let payload = br#"{"model":"llama3","messages":[{"role":"user","content":"hi"}]}"#;
        let response = harness.handle(harness.chat_request(payload)).await.unwrap();
        response.collect_body().await.unwrap();

        let body = dispatched_body(&harness).await;
        assert!(body.contains(r#""model":"llama3""#), "{body}");
        assert!(harness.classifier.prompts().await.is_empty());
    }

    #[tokio::test]
    async fn a_non_chat_body_is_relayed_unmodified() {
        let harness = RelayHarness::builder()
            .with_routing_enabled(true)
            .with_catalog(catalog())
            .with_default_model("never-applied")
            .build()
            .await
            .unwrap();
        let payload = b"not a json payload";
        Mock::given(method("POST"))
            .and(body_bytes(payload.to_vec()))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"data: done\n\n".to_vec()))
            .expect(1)
            .mount(&harness.upstream)
            .await;

        let response = harness.handle(harness.chat_request(payload)).await.unwrap();

        assert_eq!(response.header("content-type"), Some("text/event-stream"));
        assert_eq!(response.collect_body().await.unwrap(), b"data: done\n\n");
        assert!(harness.classifier.prompts().await.is_empty());
    }

    #[tokio::test]
    async fn the_scraped_conversation_feeds_the_classification_prompt() {
        let harness = RelayHarness::builder()
            .with_routing_enabled(true)
            .with_catalog(catalog())
            .with_conversation(vec![patchbay_core::ConversationMessage::new(
                Role::User,
                "tell me about rust traits",
            )])
            .build()
            .await
            .unwrap();
        mount_upstream_ok(&harness).await;

        let payload = br#"{"model":"llama3","messages":[{"role":"user","content":"from the body"}]}"#;
        let response = harness.handle(harness.chat_request(payload)).await.unwrap();
        response.collect_body().await.unwrap();

        let prompts = harness.classifier.prompts().await;
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("tell me about rust traits"));
        assert!(!prompts[0].contains("from the body"));
    }

    #[tokio::test]
    async fn an_absent_conversation_source_classifies_from_the_request_body() {
        let harness = RelayHarness::builder()
            .with_routing_enabled(true)
            .with_catalog(catalog())
            .without_conversation_source()
            .build()
            .await
            .unwrap();
        mount_upstream_ok(&harness).await;

        let payload =
            br#"{"model":"llama3","messages":[{"role":"user","content":"explain this borrow error"}]}"#;
        let response = harness.handle(harness.chat_request(payload)).await.unwrap();
        response.collect_body().await.unwrap();

        let prompts = harness.classifier.prompts().await;
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("explain this borrow error"));
    }

    #[tokio::test]
    async fn a_failing_scrape_falls_back_to_the_request_body() {
        let harness = RelayHarness::builder()
            .with_routing_enabled(true)
            .with_catalog(catalog())
            .with_failing_conversation()
            .build()
            .await
            .unwrap();
        mount_upstream_ok(&harness).await;

        let payload =
            br#"{"model":"llama3","messages":[{"role":"user","content":"summarize the meeting"}]}"#;
        let response = harness.handle(harness.chat_request(payload)).await.unwrap();
        response.collect_body().await.unwrap();

        let prompts = harness.classifier.prompts().await;
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("summarize the meeting"));
    }

    #[tokio::test]
    async fn sessions_drain_from_the_registry_after_the_relay_completes() {
        let harness = RelayHarness::builder().build().await.unwrap();
        mount_upstream_ok(&harness).await;

        let payload = br#"{"model":"llama3","messages":[{"role":"user","content":"hi"}]}"#;
        let response = harness.handle(harness.chat_request(payload)).await.unwrap();
        response.collect_body().await.unwrap();

        // Registry removal happens on the session task after the last chunk.
        for _ in 0..100 {
            if harness.in_flight() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(harness.in_flight(), 0);
    }
}
