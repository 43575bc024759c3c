// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end relay testing.
//!
//! `RelayHarness` assembles a complete relay stack with mock
//! collaborators and a wiremock upstream. Provides `handle()` to drive
//! the full interception pipeline in tests.

use std::sync::Arc;

use wiremock::MockServer;

use patchbay_config::model::{ConversationConfig, UpstreamConfig};
use patchbay_context::WindowExtractor;
use patchbay_core::types::{
    ConversationMessage, CredentialsMode, InterceptedRequest, PreferenceRecord, RoutePreference,
};
use patchbay_core::{ClassifierAdapter, ConversationAdapter, PatchbayError, PreferenceAdapter};
use patchbay_relay::{Interceptor, RelayController, RelayResponse, Upstream};

use crate::memory_store::MemoryPreferenceStore;
use crate::mock_classifier::MockClassifier;
use crate::mock_conversation::MockConversationSource;

/// Builder for creating relay test environments with configurable options.
pub struct RelayHarnessBuilder {
    monitored_path: String,
    record: PreferenceRecord,
    classifier_replies: Vec<String>,
    classifier_unavailable: bool,
    conversation: Vec<ConversationMessage>,
    conversation_absent: bool,
    conversation_failing: bool,
    store_failing: bool,
    window: ConversationConfig,
}

impl RelayHarnessBuilder {
    fn new() -> Self {
        Self {
            monitored_path: "/v1/chat/completions".to_string(),
            record: PreferenceRecord::default(),
            classifier_replies: Vec::new(),
            classifier_unavailable: false,
            conversation: Vec::new(),
            conversation_absent: false,
            conversation_failing: false,
            store_failing: false,
            window: ConversationConfig::default(),
        }
    }

    /// Set the path the interceptor claims.
    pub fn with_monitored_path(mut self, path: impl Into<String>) -> Self {
        self.monitored_path = path.into();
        self
    }

    /// Set the stored routing toggle.
    pub fn with_routing_enabled(mut self, enabled: bool) -> Self {
        self.record.routing_enabled = Some(enabled);
        self
    }

    /// Set the stored route catalog.
    pub fn with_catalog(mut self, catalog: Vec<RoutePreference>) -> Self {
        self.record.preferences = Some(catalog);
        self
    }

    /// Set the stored default model.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.record.default_model = Some(model.into());
        self
    }

    /// Set mock classifier replies.
    pub fn with_classifier_replies(mut self, replies: Vec<String>) -> Self {
        self.classifier_replies = replies;
        self
    }

    /// Make every classifier call fail as unavailable.
    pub fn with_unavailable_classifier(mut self) -> Self {
        self.classifier_unavailable = true;
        self
    }

    /// Set the transcript offered by the conversation source.
    pub fn with_conversation(mut self, messages: Vec<ConversationMessage>) -> Self {
        self.conversation = messages;
        self
    }

    /// Wire no conversation source at all.
    pub fn without_conversation_source(mut self) -> Self {
        self.conversation_absent = true;
        self
    }

    /// Make every conversation scrape fail.
    pub fn with_failing_conversation(mut self) -> Self {
        self.conversation_failing = true;
        self
    }

    /// Make every preference read and write fail.
    pub fn with_failing_store(mut self) -> Self {
        self.store_failing = true;
        self
    }

    /// Set the window bounds used for prompt assembly.
    pub fn with_window(mut self, window: ConversationConfig) -> Self {
        self.window = window;
        self
    }

    /// Build the test harness, starting the mock upstream.
    pub async fn build(self) -> Result<RelayHarness, PatchbayError> {
        let upstream_server = MockServer::start().await;

        let preferences = Arc::new(if self.store_failing {
            MemoryPreferenceStore::failing()
        } else {
            MemoryPreferenceStore::with_record(self.record)
        });

        let classifier = Arc::new(if self.classifier_unavailable {
            MockClassifier::unavailable()
        } else if self.classifier_replies.is_empty() {
            MockClassifier::new()
        } else {
            MockClassifier::with_replies(self.classifier_replies)
        });

        let conversation = Arc::new(if self.conversation_failing {
            MockConversationSource::failing()
        } else {
            MockConversationSource::with_messages(self.conversation)
        });
        let conversation_adapter: Option<Arc<dyn ConversationAdapter>> =
            if self.conversation_absent {
                None
            } else {
                Some(Arc::clone(&conversation) as Arc<dyn ConversationAdapter>)
            };

        let upstream_config = UpstreamConfig {
            origin: upstream_server.uri(),
            ..UpstreamConfig::default()
        };
        let upstream = Upstream::from_config(&upstream_config)?;
        let window = WindowExtractor::new(&self.window);

        let controller = Arc::new(RelayController::new(
            Arc::clone(&preferences) as Arc<dyn PreferenceAdapter>,
            conversation_adapter,
            Arc::clone(&classifier) as Arc<dyn ClassifierAdapter>,
            upstream,
            window,
        ));
        let interceptor = Interceptor::new(self.monitored_path, Arc::clone(&controller));

        Ok(RelayHarness {
            upstream: upstream_server,
            classifier,
            preferences,
            conversation,
            controller,
            interceptor,
        })
    }
}

/// A complete relay test environment.
///
/// All collaborators are mocks and the upstream is a wiremock server, so
/// tests mount expectations on `upstream` and drive requests through
/// `handle()` exactly as the embedding application would.
pub struct RelayHarness {
    /// The mock upstream the relay dispatches to.
    pub upstream: MockServer,
    /// The mock classifier, with captured prompts.
    pub classifier: Arc<MockClassifier>,
    /// The in-memory preference store.
    pub preferences: Arc<MemoryPreferenceStore>,
    /// The mock conversation source.
    pub conversation: Arc<MockConversationSource>,
    /// The relay controller under test.
    pub controller: Arc<RelayController>,
    interceptor: Interceptor,
}

impl RelayHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> RelayHarnessBuilder {
        RelayHarnessBuilder::new()
    }

    /// Run one request through the full interception pipeline.
    pub async fn handle(
        &self,
        request: InterceptedRequest,
    ) -> Result<RelayResponse, PatchbayError> {
        self.interceptor.handle(request).await
    }

    /// Sessions currently in flight on the controller.
    pub fn in_flight(&self) -> usize {
        self.interceptor.in_flight()
    }

    /// Consume the harness, returning its interceptor for tests that
    /// exercise the process-wide install slot.
    pub fn into_interceptor(self) -> Interceptor {
        self.interceptor
    }

    /// A chat completion request aimed at the monitored path.
    pub fn chat_request(&self, body: &[u8]) -> InterceptedRequest {
        InterceptedRequest {
            url: self.interceptor.monitored_path().to_string(),
            method: "POST".to_string(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            credentials: CredentialsMode::Include,
            body: Some(body.to_vec()),
        }
    }
}
