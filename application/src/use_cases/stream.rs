//! Stream controller
//!
//! The orchestrator writes [`CouncilEvent`]s into an [`EventSink`]; the
//! transport reads them back, in order, from a [`TurnStream`]. Both ends
//! share the turn's [`CancellationToken`]:
//!
//! - dropping or cancelling the [`TurnStream`] cancels the turn
//! - once the turn is cancelled, the sink refuses further events and the
//!   stream stops yielding, even if events are still buffered

use council_domain::CouncilEvent;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::debug;

/// The consumer is gone or the turn was cancelled
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Event stream closed")]
pub struct StreamClosed;

/// Create a connected sink/stream pair sharing `cancel`
pub fn event_channel(buffer: usize, cancel: CancellationToken) -> (EventSink, TurnStream) {
    let (sender, receiver) = mpsc::channel(buffer.max(1));
    let sink = EventSink {
        sender,
        cancel: cancel.clone(),
    };
    let stream = TurnStream {
        receiver,
        guard: Some(cancel.clone().drop_guard()),
        cancel,
        finished: false,
    };
    (sink, stream)
}

/// Producer side of a turn's event stream
#[derive(Debug)]
pub struct EventSink {
    sender: mpsc::Sender<CouncilEvent>,
    cancel: CancellationToken,
}

impl EventSink {
    /// The turn-scoped cancellation token
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Deliver one event, waiting for buffer space
    ///
    /// Fails without sending once the turn is cancelled. A closed receiver
    /// cancels the turn.
    pub async fn emit(&self, event: CouncilEvent) -> Result<(), StreamClosed> {
        if self.cancel.is_cancelled() {
            return Err(StreamClosed);
        }
        debug!("Emitting {}", event.event_type());
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(StreamClosed),
            sent = self.sender.send(event) => sent.map_err(|_| {
                debug!("Event receiver dropped, cancelling turn");
                self.cancel.cancel();
                StreamClosed
            }),
        }
    }
}

/// Consumer side of a turn's event stream
///
/// Yields events in production order and ends after the terminal
/// `complete` or `error` event.
#[derive(Debug)]
pub struct TurnStream {
    receiver: mpsc::Receiver<CouncilEvent>,
    cancel: CancellationToken,
    guard: Option<DropGuard>,
    finished: bool,
}

impl TurnStream {
    /// Cancel the turn; no further events are yielded
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A handle that cancels this turn from elsewhere (e.g. a Ctrl-C handler)
    pub fn canceller(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Stream for TurnStream {
    type Item = CouncilEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished || self.cancel.is_cancelled() {
            return Poll::Ready(None);
        }
        match self.receiver.poll_recv(cx) {
            Poll::Ready(Some(event)) => {
                if event.is_terminal() {
                    self.finished = true;
                    // The turn is over; dropping the stream must not cancel it now
                    if let Some(guard) = self.guard.take() {
                        guard.disarm();
                    }
                }
                Poll::Ready(Some(event))
            }
            Poll::Ready(None) => {
                self.finished = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (sink, mut stream) = event_channel(8, CancellationToken::new());

        sink.emit(CouncilEvent::Stage1Start).await.unwrap();
        sink.emit(CouncilEvent::Stage2Start).await.unwrap();
        sink.emit(CouncilEvent::Complete).await.unwrap();
        drop(sink);

        let types: Vec<_> = stream
            .by_ref()
            .map(|e| e.event_type())
            .collect()
            .await;
        assert_eq!(types, vec!["stage1_start", "stage2_start", "complete"]);
    }

    #[tokio::test]
    async fn test_nothing_after_terminal_event() {
        let (sink, mut stream) = event_channel(8, CancellationToken::new());

        sink.emit(CouncilEvent::error("boom")).await.unwrap();
        sink.emit(CouncilEvent::Complete).await.unwrap();

        assert_eq!(stream.next().await, Some(CouncilEvent::error("boom")));
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn test_cancel_stops_buffered_events() {
        let cancel = CancellationToken::new();
        let (sink, mut stream) = event_channel(8, cancel.clone());

        sink.emit(CouncilEvent::Stage1Start).await.unwrap();
        stream.cancel();

        assert!(cancel.is_cancelled());
        assert_eq!(stream.next().await, None);
        assert_eq!(sink.emit(CouncilEvent::Stage2Start).await, Err(StreamClosed));
    }

    #[tokio::test]
    async fn test_dropping_stream_cancels_turn() {
        let cancel = CancellationToken::new();
        let (sink, stream) = event_channel(8, cancel.clone());

        drop(stream);

        assert!(cancel.is_cancelled());
        assert_eq!(sink.emit(CouncilEvent::Stage1Start).await, Err(StreamClosed));
    }

    #[tokio::test]
    async fn test_dropping_after_complete_does_not_cancel() {
        let cancel = CancellationToken::new();
        let (sink, mut stream) = event_channel(8, cancel.clone());

        sink.emit(CouncilEvent::Complete).await.unwrap();
        assert_eq!(stream.next().await, Some(CouncilEvent::Complete));
        drop(stream);

        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_closed_receiver_cancels() {
        let cancel = CancellationToken::new();
        let (sink, stream) = event_channel(8, cancel.clone());

        let TurnStream {
            receiver, guard, ..
        } = stream;
        if let Some(guard) = guard {
            guard.disarm();
        }
        drop(receiver);

        assert_eq!(sink.emit(CouncilEvent::Stage1Start).await, Err(StreamClosed));
        assert!(cancel.is_cancelled());
    }
}
