//! Single-consumer streams connected by rendezvous channels.
//!
//! Every pipeline stage hands values to the next one through a zero-capacity channel: a
//! send only completes once the consumer is ready to receive it, so a slow consumer
//! throttles its whole upstream chain. Every blocking operation also waits on a shared
//! [`CancellationToken`] so that a whole pipeline can be unwound from the outside.

use crossbeam_channel::{bounded, select, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
    thread,
    time::Duration,
};

/// A signal shared by every stage of a pipeline. Once cancelled it stays cancelled.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

struct TokenInner {
    // Never used to send: dropping it disconnects every clone of `signal`.
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
}

impl CancellationToken {
    pub fn new() -> Self {
        let (trigger, signal) = bounded(0);
        Self {
            inner: Arc::new(TokenInner {
                trigger: Mutex::new(Some(trigger)),
                signal,
            }),
        }
    }

    pub fn cancel(&self) {
        self.inner
            .trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.inner.signal.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Sleep for `duration` or until cancelled. Returns `true` if the token was cancelled.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        matches!(
            self.inner.signal.recv_timeout(duration),
            Err(RecvTimeoutError::Disconnected)
        )
    }

    /// Cancel the token after `duration` from a detached watchdog thread.
    pub fn cancel_after(&self, duration: Duration) {
        let token = self.clone();
        let spawned = thread::Builder::new()
            .name("cancel-after".to_owned())
            .spawn(move || {
                if !token.wait_timeout(duration) {
                    log::warn!("Timed out after {:?}, cancelling.", duration);
                    token.cancel();
                }
            });
        if let Err(error) = spawned {
            log::error!("Could not start timeout watchdog, cancelling now: {}", error);
            self.cancel();
        }
    }

    pub(crate) fn signal(&self) -> &Receiver<()> {
        &self.inner.signal
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for CancellationToken {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        formatter
            .debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Why a value could not be handed to the consumer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Closed {
    #[error("the consumer has dropped the stream")]
    Disconnected,

    #[error("the pipeline was cancelled")]
    Cancelled,
}

/// Producing half of a [`Stream`]. Clones feed the same stream; it ends once every clone
/// has been dropped.
pub struct Sink<T> {
    sender: Sender<T>,
    cancel: CancellationToken,
    closed: Arc<AtomicBool>,
}

impl<T> Sink<T> {
    /// Block until the consumer takes `value`.
    pub fn send(&self, value: T) -> Result<(), Closed> {
        if self.cancel.is_cancelled() {
            return Err(Closed::Cancelled);
        }
        select! {
            send(self.sender, value) -> result => result.map_err(|_| {
                self.closed.store(true, Ordering::Release);
                Closed::Disconnected
            }),
            recv(self.cancel.signal()) -> _ => Err(Closed::Cancelled),
        }
    }

    /// Whether every further send is bound to fail, because the consumer dropped the
    /// stream or the pipeline was cancelled.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.cancel.is_cancelled()
    }
}

impl<T> Clone for Sink<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            cancel: self.cancel.clone(),
            closed: Arc::clone(&self.closed),
        }
    }
}

/// Consuming half of a rendezvous channel.
///
/// A `Stream` has exactly one consumer: it cannot be cloned, and handing it to a stage
/// moves it. Once it has returned `None` it never yields again. Dropping it makes the
/// producer's next send fail, which stops the producing thread.
pub struct Stream<T> {
    receiver: Receiver<T>,
    cancel: CancellationToken,
    closed: Arc<AtomicBool>,
    done: bool,
}

impl<T> Stream<T> {
    /// The underlying channel, for stages which select over several streams.
    pub(crate) fn receiver(&self) -> &Receiver<T> {
        &self.receiver
    }
}

impl<T> Iterator for Stream<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.done || self.cancel.is_cancelled() {
            self.done = true;
            return None;
        }
        let next = select! {
            recv(self.receiver) -> value => value.ok(),
            recv(self.cancel.signal()) -> _ => None,
        };
        self.done = next.is_none();
        next
    }
}

impl<T> Drop for Stream<T> {
    fn drop(&mut self) {
        // Set before `receiver` disconnects, so a failed send always finds it set.
        self.closed.store(true, Ordering::Release);
    }
}

impl<T> Debug for Stream<T> {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        formatter
            .debug_struct("Stream")
            .field("done", &self.done)
            .finish()
    }
}

/// Create a connected rendezvous pair bound to `cancel`.
pub fn channel<T>(cancel: &CancellationToken) -> (Sink<T>, Stream<T>) {
    let (sender, receiver) = bounded(0);
    let closed = Arc::new(AtomicBool::new(false));
    (
        Sink {
            sender,
            cancel: cancel.clone(),
            closed: Arc::clone(&closed),
        },
        Stream {
            receiver,
            cancel: cancel.clone(),
            closed,
            done: false,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Instant;

    #[test]
    fn test_closed_stream_stays_closed() {
        let cancel = CancellationToken::new();
        let (sink, mut stream) = channel::<u64>(&cancel);
        drop(sink);
        assert_eq!(stream.next(), None);
        assert_eq!(stream.next(), None);
    }

    #[test]
    fn test_send_fails_once_stream_is_dropped() {
        let cancel = CancellationToken::new();
        let (sink, stream) = channel::<u64>(&cancel);
        assert!(!sink.is_closed());
        drop(stream);
        assert!(sink.is_closed());
        assert!(sink.clone().is_closed());
        assert_eq!(sink.send(1), Err(Closed::Disconnected));
    }

    #[test]
    fn test_dropping_stream_unblocks_pending_send() {
        let cancel = CancellationToken::new();
        let (sink, stream) = channel::<u64>(&cancel);
        let sender = thread::spawn(move || (sink.send(1), sink.is_closed()));

        thread::sleep(Duration::from_millis(50));
        drop(stream);
        assert_eq!(sender.join().unwrap(), (Err(Closed::Disconnected), true));
    }

    #[test]
    fn test_dropping_one_sink_keeps_stream_open() {
        let cancel = CancellationToken::new();
        let (sink, mut stream) = channel::<u64>(&cancel);
        let other_sink = sink.clone();
        drop(sink);
        // Still held by the consumer, so the remaining sink may send.
        assert!(!other_sink.is_closed());
        drop(other_sink);
        assert_eq!(stream.next(), None);
    }

    #[test]
    fn test_cancelled_sink_is_closed() {
        let cancel = CancellationToken::new();
        let (sink, _stream) = channel::<u64>(&cancel);
        cancel.cancel();
        assert!(sink.is_closed());
    }

    #[test]
    fn test_cancel_unblocks_sender_and_receiver() {
        let cancel = CancellationToken::new();
        let (sink, mut stream) = channel::<u64>(&cancel);
        let (_idle_sink, mut idle_stream) = channel::<u64>(&cancel);

        let sender = {
            let cancel = cancel.clone();
            thread::spawn(move || {
                // Nobody reads `stream` until after cancellation.
                let result = sink.send(1);
                assert!(cancel.is_cancelled());
                result
            })
        };

        thread::sleep(Duration::from_millis(50));
        cancel.cancel();
        assert_eq!(sender.join().unwrap(), Err(Closed::Cancelled));
        assert_eq!(idle_stream.next(), None);
        assert_eq!(stream.next(), None);
    }

    #[test]
    fn test_wait_timeout() {
        let cancel = CancellationToken::new();
        assert!(!cancel.wait_timeout(Duration::from_millis(10)));

        cancel.cancel_after(Duration::from_millis(20));
        let started = Instant::now();
        assert!(cancel.wait_timeout(Duration::from_secs(60)));
        assert!(started.elapsed() < Duration::from_secs(60));
        assert!(cancel.is_cancelled());
    }
}
