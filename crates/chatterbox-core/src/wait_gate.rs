//! Re-armable broadcast signal for long-polling.
//!
//! A [`WaitGate`] holds exactly one live signal. Waiters subscribe to the
//! live signal; a producer broadcasts it and then arms a fresh one, so every
//! waiter subscribed before the broadcast resumes and every waiter that
//! subscribes afterwards waits for the next broadcast.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use chatterbox_core::{WaitGate, WaitOutcome};
//!
//! # tokio_test::block_on(async {
//! let gate = WaitGate::new(Duration::from_secs(60));
//! let waiter = gate.subscribe();
//!
//! gate.notify();
//! assert_eq!(waiter.wait(Duration::from_secs(1)).await, WaitOutcome::Woken);
//! # });
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The subscribed signal was broadcast.
    Woken,
    /// The timeout elapsed first.
    TimedOut,
}

impl WaitOutcome {
    /// Label used in logs and metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Woken => "woken",
            Self::TimedOut => "timed_out",
        }
    }
}

/// One-shot broadcast: fires at most once.
#[derive(Debug)]
struct Signal {
    fired: AtomicBool,
    sender: broadcast::Sender<()>,
}

impl Signal {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            fired: AtomicBool::new(false),
            sender,
        }
    }

    fn fire(&self) {
        if self
            .fired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            // No receivers is fine.
            let _ = self.sender.send(());
        }
    }
}

/// Coordinates long-poll waiters with message producers.
#[derive(Debug)]
pub struct WaitGate {
    current: Mutex<Arc<Signal>>,
    default_timeout: Duration,
}

impl WaitGate {
    /// Creates a gate with one armed signal.
    #[must_use]
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            current: Mutex::new(Arc::new(Signal::new())),
            default_timeout,
        }
    }

    /// Returns the timeout used by [`wait`](Self::wait).
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Captures the live signal.
    ///
    /// Subscribe before checking for data so that a broadcast between the
    /// check and the wait is not lost.
    #[must_use]
    pub fn subscribe(&self) -> GateWaiter {
        let signal = Arc::clone(&self.current.lock());
        let receiver = signal.sender.subscribe();
        GateWaiter { signal, receiver }
    }

    /// Subscribes and waits with the default timeout.
    pub async fn wait(&self) -> WaitOutcome {
        self.subscribe().wait(self.default_timeout).await
    }

    /// Fires the live signal, waking its subscribers.
    pub fn broadcast(&self) {
        self.current.lock().fire();
    }

    /// Replaces the live signal with a fresh one.
    pub fn arm(&self) {
        *self.current.lock() = Arc::new(Signal::new());
    }

    /// Broadcasts then arms, atomically with respect to [`subscribe`](Self::subscribe).
    pub fn notify(&self) {
        let mut current = self.current.lock();
        current.fire();
        *current = Arc::new(Signal::new());
    }
}

impl Default for WaitGate {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

/// A subscription to one signal instance.
#[derive(Debug)]
pub struct GateWaiter {
    signal: Arc<Signal>,
    receiver: broadcast::Receiver<()>,
}

impl GateWaiter {
    /// Returns true if the subscribed signal already fired.
    #[must_use]
    pub fn is_woken(&self) -> bool {
        self.signal.fired.load(Ordering::SeqCst)
    }

    /// Waits until the subscribed signal fires or `timeout` elapses.
    pub async fn wait(mut self, timeout: Duration) -> WaitOutcome {
        if self.is_woken() {
            return WaitOutcome::Woken;
        }
        match tokio::time::timeout(timeout, self.receiver.recv()).await {
            Ok(_) => WaitOutcome::Woken,
            Err(_) => WaitOutcome::TimedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_subscribed_waiter_is_woken() {
        let gate = Arc::new(WaitGate::new(Duration::from_secs(60)));
        let waiter = gate.subscribe();

        let task = tokio::spawn(waiter.wait(Duration::from_secs(60)));
        tokio::task::yield_now().await;
        gate.notify();

        assert_eq!(task.await.unwrap(), WaitOutcome::Woken);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_after_arm_is_not_woken_by_old_broadcast() {
        let gate = WaitGate::new(Duration::from_secs(60));
        gate.notify();

        let late = gate.subscribe();
        assert!(!late.is_woken());
        assert_eq!(
            late.wait(Duration::from_secs(5)).await,
            WaitOutcome::TimedOut
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_broadcast_before_wait_is_not_lost() {
        let gate = WaitGate::new(Duration::from_secs(60));
        let waiter = gate.subscribe();
        gate.notify();

        assert!(waiter.is_woken());
        assert_eq!(
            waiter.wait(Duration::from_millis(1)).await,
            WaitOutcome::Woken
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_broadcast_wakes_all_subscribers() {
        let gate = WaitGate::new(Duration::from_secs(60));
        let waiters: Vec<_> = (0..5).map(|_| gate.subscribe()).collect();
        let tasks: Vec<_> = waiters
            .into_iter()
            .map(|w| tokio::spawn(w.wait(Duration::from_secs(60))))
            .collect();
        tokio::task::yield_now().await;

        gate.broadcast();
        for task in tasks {
            assert_eq!(task.await.unwrap(), WaitOutcome::Woken);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_wait_times_out() {
        let gate = WaitGate::new(Duration::from_secs(60));
        let started = tokio::time::Instant::now();
        assert_eq!(gate.wait().await, WaitOutcome::TimedOut);
        assert!(started.elapsed() >= Duration::from_secs(60));
    }

    #[test]
    fn test_repeated_broadcast_is_harmless() {
        let gate = WaitGate::default();
        gate.broadcast();
        gate.broadcast();
        gate.arm();
        assert!(!gate.subscribe().is_woken());
    }
}
