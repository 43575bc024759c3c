// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session identity and relay lifecycle state.

use patchbay_core::InterceptedRequest;
use tracing::{debug, warn};
use uuid::Uuid;

/// Lifecycle of one relay session.
///
/// `Dispatched` begins when the upstream call is sent, `Streaming` on the
/// first received chunk, `Closed` on natural end of body or on any error at
/// an earlier state. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    Dispatched,
    Streaming,
    Closed,
}

impl std::fmt::Display for RelayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayState::Idle => write!(f, "idle"),
            RelayState::Dispatched => write!(f, "dispatched"),
            RelayState::Streaming => write!(f, "streaming"),
            RelayState::Closed => write!(f, "closed"),
        }
    }
}

impl RelayState {
    fn admits(self, next: RelayState) -> bool {
        matches!(
            (self, next),
            (RelayState::Idle, RelayState::Dispatched)
                | (RelayState::Dispatched, RelayState::Streaming)
                | (
                    RelayState::Idle | RelayState::Dispatched | RelayState::Streaming,
                    RelayState::Closed
                )
        )
    }
}

/// One intercepted request in flight through the controller realm.
pub struct RelaySession {
    id: Uuid,
    state: RelayState,
    request: InterceptedRequest,
}

impl RelaySession {
    pub fn new(request: InterceptedRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: RelayState::Idle,
            request,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    /// The snapshot taken at interception time.
    pub fn request(&self) -> &InterceptedRequest {
        &self.request
    }

    pub fn is_closed(&self) -> bool {
        self.state == RelayState::Closed
    }

    /// Moves to `next` if the transition is legal. Illegal transitions are
    /// logged and ignored, never panicked on.
    pub fn advance(&mut self, next: RelayState) {
        if self.state.admits(next) {
            debug!(session_id = %self.id, from = %self.state, to = %next, "relay state change");
            self.state = next;
        } else {
            warn!(
                session_id = %self.id,
                from = %self.state,
                to = %next,
                "ignoring invalid relay state transition"
            );
        }
    }
}
