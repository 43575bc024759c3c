// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Paired channel endpoints connecting the interceptor and controller realms.
//!
//! Each intercepted request gets its own bridge: a command channel carrying
//! the session snapshot from the interceptor to the controller, and an event
//! channel carrying body chunks and the completion signal back. Nothing else
//! crosses the boundary, in particular no response envelope and no
//! cancellation signal.

use patchbay_core::{InterceptedRequest, PatchbayError};
use tokio::sync::mpsc;

use crate::body::RelayedBody;

/// Capacity of each bridge direction. A slow consumer makes the relay loop
/// await channel space rather than buffer without bound.
pub const BRIDGE_CAPACITY: usize = 16;

/// Controller-bound messages.
#[derive(Debug)]
pub enum RelayCommand {
    /// The session snapshot taken at interception time.
    Fetch(InterceptedRequest),
}

/// Interceptor-bound messages.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// One upstream body chunk, in upstream arrival order.
    Chunk(Vec<u8>),
    /// The relay has closed. The first one is authoritative; consumers
    /// ignore anything after it.
    Done,
}

/// Interceptor-side endpoint of a bridge.
pub struct InterceptorEnd {
    commands: mpsc::Sender<RelayCommand>,
    events: mpsc::Receiver<RelayEvent>,
}

/// Controller-side endpoint of a bridge.
pub struct ControllerEnd {
    commands: mpsc::Receiver<RelayCommand>,
    events: mpsc::Sender<RelayEvent>,
}

/// Opens a fresh bridge for one intercepted request.
pub fn open() -> (InterceptorEnd, ControllerEnd) {
    let (command_tx, command_rx) = mpsc::channel(BRIDGE_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel(BRIDGE_CAPACITY);
    (
        InterceptorEnd {
            commands: command_tx,
            events: event_rx,
        },
        ControllerEnd {
            commands: command_rx,
            events: event_tx,
        },
    )
}

impl InterceptorEnd {
    /// Hands the session snapshot to the controller realm.
    pub async fn fetch(&self, snapshot: InterceptedRequest) -> Result<(), PatchbayError> {
        self.commands
            .send(RelayCommand::Fetch(snapshot))
            .await
            .map_err(|_| {
                PatchbayError::Bridge("controller endpoint closed before fetch".to_string())
            })
    }

    /// Consumes this endpoint into the response body stream.
    pub fn into_body(self) -> RelayedBody {
        RelayedBody::new(self.events)
    }
}

impl ControllerEnd {
    /// Waits for the session snapshot. Returns `None` when the interceptor
    /// side went away without sending one.
    pub async fn recv_fetch(&mut self) -> Option<InterceptedRequest> {
        match self.commands.recv().await {
            Some(RelayCommand::Fetch(snapshot)) => Some(snapshot),
            None => None,
        }
    }

    /// Forwards one upstream chunk. Fails when the consumer dropped the
    /// body, which is the signal to stop relaying.
    pub async fn send_chunk(&self, chunk: Vec<u8>) -> Result<(), PatchbayError> {
        self.events
            .send(RelayEvent::Chunk(chunk))
            .await
            .map_err(|_| PatchbayError::Bridge("response body dropped mid-relay".to_string()))
    }

    /// Sends the completion signal. A dropped consumer is not an error
    /// here; there is nobody left to inform.
    pub async fn send_done(&self) {
        let _ = self.events.send(RelayEvent::Done).await;
    }
}
