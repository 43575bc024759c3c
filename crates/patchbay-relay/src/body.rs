// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response materialization for intercepted calls.
//!
//! A relayed response's body is fed by bridge events; its status line and
//! headers are synthesized because the bridge carries no envelope.
//! Passthrough responses keep the real upstream envelope.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use patchbay_core::PatchbayError;
use tokio::sync::mpsc;

use crate::bridge::RelayEvent;

/// Body stream of a relayed response, fed by [`RelayEvent`]s.
///
/// Ends at the first `Done` event or when the controller side goes away.
/// Events queued after the first `Done` are never observed.
pub struct RelayedBody {
    events: mpsc::Receiver<RelayEvent>,
    done: bool,
}

impl RelayedBody {
    pub(crate) fn new(events: mpsc::Receiver<RelayEvent>) -> Self {
        Self {
            events,
            done: false,
        }
    }
}

impl Stream for RelayedBody {
    type Item = Result<Vec<u8>, PatchbayError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        match this.events.poll_recv(cx) {
            Poll::Ready(Some(RelayEvent::Chunk(chunk))) => Poll::Ready(Some(Ok(chunk))),
            Poll::Ready(Some(RelayEvent::Done) | None) => {
                this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// What the interceptor hands back for one intercepted call.
pub struct RelayResponse {
    pub status: u16,
    /// Header pairs; synthesized for relayed responses, copied from the
    /// upstream envelope for passthrough.
    pub headers: Vec<(String, String)>,
    pub body: Pin<Box<dyn Stream<Item = Result<Vec<u8>, PatchbayError>> + Send>>,
}

impl RelayResponse {
    /// A relayed response: a synthesized `200` / `text/event-stream`
    /// envelope around a bridge-fed body.
    pub fn streamed(body: RelayedBody) -> Self {
        Self {
            status: 200,
            headers: vec![(
                "content-type".to_string(),
                "text/event-stream".to_string(),
            )],
            body: Box::pin(body),
        }
    }

    /// A passthrough response keeping the real upstream envelope.
    pub fn passthrough(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes_stream().map(|next| {
            next.map(|chunk| chunk.to_vec())
                .map_err(|e| PatchbayError::UpstreamDispatch {
                    message: format!("upstream body stream failed: {e}"),
                    source: Some(Box::new(e)),
                })
        });
        Self {
            status,
            headers,
            body: Box::pin(body),
        }
    }

    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Drains the body into one buffer. Test and tooling convenience; the
    /// gateway streams instead.
    pub async fn collect_body(self) -> Result<Vec<u8>, PatchbayError> {
        let mut body = self.body;
        let mut buffer = Vec::new();
        while let Some(chunk) = body.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge;
    use futures::StreamExt;

    #[tokio::test]
    async fn chunks_arrive_in_order_then_the_stream_ends() {
        let (interceptor, controller) = bridge::open();
        controller.send_chunk(b"c1".to_vec()).await.unwrap();
        controller.send_chunk(b"c2".to_vec()).await.unwrap();
        controller.send_chunk(b"c3".to_vec()).await.unwrap();
        controller.send_done().await;

        let mut body = interceptor.into_body();
        assert_eq!(body.next().await.unwrap().unwrap(), b"c1");
        assert_eq!(body.next().await.unwrap().unwrap(), b"c2");
        assert_eq!(body.next().await.unwrap().unwrap(), b"c3");
        assert!(body.next().await.is_none());
    }

    #[tokio::test]
    async fn only_the_first_done_counts() {
        let (interceptor, controller) = bridge::open();
        controller.send_chunk(b"c1".to_vec()).await.unwrap();
        controller.send_done().await;
        controller.send_done().await;
        controller.send_chunk(b"late".to_vec()).await.unwrap();

        let mut body = interceptor.into_body();
        assert_eq!(body.next().await.unwrap().unwrap(), b"c1");
        assert!(body.next().await.is_none());
        // The late chunk behind the completion signal is never surfaced.
        assert!(body.next().await.is_none());
    }

    #[tokio::test]
    async fn dropped_controller_ends_the_stream() {
        let (interceptor, controller) = bridge::open();
        controller.send_chunk(b"c1".to_vec()).await.unwrap();
        drop(controller);

        let mut body = interceptor.into_body();
        assert_eq!(body.next().await.unwrap().unwrap(), b"c1");
        assert!(body.next().await.is_none());
    }

    #[tokio::test]
    async fn streamed_response_synthesizes_the_envelope() {
        let (interceptor, controller) = bridge::open();
        controller.send_chunk(b"data: hi\n\n".to_vec()).await.unwrap();
        controller.send_done().await;

        let response = RelayResponse::streamed(interceptor.into_body());
        assert_eq!(response.status, 200);
        assert_eq!(response.header("Content-Type"), Some("text/event-stream"));
        assert_eq!(response.collect_body().await.unwrap(), b"data: hi\n\n");
    }
}
