//! Trailing-edge debouncer for coalescing bursts of file system signals.
//!
//! An external writer often touches a sentinel file several times in quick
//! succession (truncate, then write, then close). The debouncer holds the most
//! recent value and only emits it once the input has been quiet for the full
//! interval.
//!
//! # Architecture
//!
//! The debouncer owns a background task with a single pending slot:
//!
//! 1. A new value replaces whatever is pending
//! 2. The deadline is reset to `now + interval`
//! 3. When the deadline passes with no new input, the value is emitted
//!
//! A continuous stream of input with gaps shorter than the interval therefore
//! never emits until the stream stops.
//!
//! Dropping the debouncer cancels the task. Unlike a flush-on-close design,
//! a pending value is discarded: stopping a watcher must not produce a late
//! alert.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tokio::sync::mpsc;
//! use cursor_helper::utils::debounce::Debouncer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (output_tx, mut output_rx) = mpsc::channel(16);
//!     let debouncer = Debouncer::new(Duration::from_millis(100), output_tx);
//!
//!     debouncer.send("write 1").await.unwrap();
//!     debouncer.send("write 2").await.unwrap();
//!     debouncer.send("write 3").await.unwrap();
//!
//!     // Only "write 3" comes out, 100ms after it went in.
//!     assert_eq!(output_rx.recv().await, Some("write 3"));
//! }
//! ```

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Default debounce interval in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Capacity of the input channel between producers and the debounce task.
const INPUT_CAPACITY: usize = 1000;

/// Error type for debouncer operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DebouncerError {
    /// The debouncer's background task is gone.
    #[error("debouncer channel closed")]
    ChannelClosed,
}

/// A value waiting for its quiet period to elapse.
#[derive(Debug)]
struct PendingEvent<V> {
    value: V,
    deadline: Instant,
}

/// A single-slot, trailing-edge debouncer.
///
/// # Thread Safety
///
/// [`try_send`](Self::try_send) never blocks and may be called from any
/// thread, including the `notify` callback thread. The debouncer itself must
/// be created inside a Tokio runtime.
#[derive(Debug)]
pub struct Debouncer<V>
where
    V: Send + 'static,
{
    input_tx: mpsc::Sender<V>,
    interval: Duration,
    task_handle: JoinHandle<()>,
}

impl<V> Debouncer<V>
where
    V: Send + 'static,
{
    /// Creates a debouncer that emits on `output_tx` after `interval` of quiet.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn new(interval: Duration, output_tx: mpsc::Sender<V>) -> Self {
        let (input_tx, input_rx) = mpsc::channel(INPUT_CAPACITY);

        let task_handle = tokio::spawn(async move {
            run_debounce_loop(interval, input_rx, output_tx).await;
        });

        Self {
            input_tx,
            interval,
            task_handle,
        }
    }

    /// Creates a debouncer with [`DEFAULT_DEBOUNCE_MS`].
    #[must_use]
    pub fn with_default_interval(output_tx: mpsc::Sender<V>) -> Self {
        Self::new(Duration::from_millis(DEFAULT_DEBOUNCE_MS), output_tx)
    }

    /// Returns the quiet period this debouncer waits for.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Feeds a value, replacing any pending one and restarting the timer.
    ///
    /// # Errors
    ///
    /// Returns [`DebouncerError::ChannelClosed`] if the background task has
    /// terminated.
    pub async fn send(&self, value: V) -> Result<(), DebouncerError> {
        self.input_tx
            .send(value)
            .await
            .map_err(|_| DebouncerError::ChannelClosed)
    }

    /// Feeds a value without waiting.
    ///
    /// Returns `false` if the input channel is full or closed.
    pub fn try_send(&self, value: V) -> bool {
        self.input_tx.try_send(value).is_ok()
    }

    /// Returns a cloneable handle that feeds this debouncer.
    ///
    /// The handle does not keep the debouncer alive: once the debouncer is
    /// dropped, [`DebounceInput::try_send`] returns `false`.
    #[must_use]
    pub fn input(&self) -> DebounceInput<V> {
        DebounceInput {
            tx: self.input_tx.clone(),
        }
    }
}

/// Producer side of a [`Debouncer`], safe to move into foreign callbacks.
#[derive(Debug)]
pub struct DebounceInput<V> {
    tx: mpsc::Sender<V>,
}

impl<V> Clone for DebounceInput<V> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<V> DebounceInput<V> {
    /// Feeds a value without waiting.
    ///
    /// Returns `false` if the input channel is full or the debouncer is gone.
    pub fn try_send(&self, value: V) -> bool {
        self.tx.try_send(value).is_ok()
    }
}

impl<V> Drop for Debouncer<V>
where
    V: Send + 'static,
{
    fn drop(&mut self) {
        self.task_handle.abort();
    }
}

/// Runs the debounce loop until the input channel closes or the task is aborted.
async fn run_debounce_loop<V>(
    interval: Duration,
    mut input_rx: mpsc::Receiver<V>,
    output_tx: mpsc::Sender<V>,
) {
    let mut pending: Option<PendingEvent<V>> = None;

    debug!(interval_ms = interval.as_millis(), "Starting debounce loop");

    loop {
        let next_deadline = pending.as_ref().map(|p| p.deadline);

        tokio::select! {
            event = input_rx.recv() => {
                match event {
                    Some(value) => {
                        let restarted = pending.is_some();
                        pending = Some(PendingEvent {
                            value,
                            deadline: Instant::now() + interval,
                        });
                        trace!(restarted, "Received event, deadline reset");
                    }
                    None => {
                        if pending.take().is_some() {
                            debug!("Input closed, discarding pending event");
                        }
                        break;
                    }
                }
            }

            _ = async {
                match next_deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            } => {
                if let Some(event) = pending.take() {
                    trace!("Emitting debounced event");
                    if output_tx.send(event.value).await.is_err() {
                        warn!("Failed to emit debounced event, receiver dropped");
                    }
                }
            }
        }
    }

    debug!("Debounce loop terminated");
}
