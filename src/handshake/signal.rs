//! Single-fire completion signal between a handshake listener and the waiting caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// How a bounded wait on a [`HandshakeWaiter`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitOutcome {
    /// The signal fired before the deadline.
    Signaled,
    /// The deadline elapsed first.
    TimedOut,
    /// The signal was dropped without firing.
    Interrupted,
}

/// Sending half. Fires at most once; only the first claimant may fire it.
#[derive(Debug)]
pub(crate) struct HandshakeSignal {
    claimed: AtomicBool,
    sender: Mutex<Option<oneshot::Sender<()>>>,
}

/// Receiving half, owned by the caller of `connect`.
#[derive(Debug)]
pub(crate) struct HandshakeWaiter {
    receiver: oneshot::Receiver<()>,
    cancellation: CancellationToken,
}

pub(crate) fn handshake_signal() -> (HandshakeSignal, HandshakeWaiter) {
    let (sender, receiver) = oneshot::channel();
    let signal = HandshakeSignal {
        claimed: AtomicBool::new(false),
        sender: Mutex::new(Some(sender)),
    };
    let waiter = HandshakeWaiter {
        receiver,
        cancellation: CancellationToken::new(),
    };
    (signal, waiter)
}

impl HandshakeSignal {
    /// Claim the right to complete the handshake.
    ///
    /// Returns `true` exactly once over the lifetime of the signal.
    pub(crate) fn claim(&self) -> bool {
        !self.claimed.swap(true, Ordering::AcqRel)
    }

    /// Returns `true` once any callback has claimed the signal.
    pub(crate) fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }

    /// Wake the waiter. A second call is a no-op.
    pub(crate) fn fire(&self) {
        if let Some(sender) = self.sender.lock().take() {
            // The waiter may already have given up.
            let _ = sender.send(());
        }
    }
}

impl HandshakeWaiter {
    /// Token cancelled when the wait times out; handed to the transport engine.
    pub(crate) fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Wait for the signal for at most `timeout`.
    ///
    /// The cancellation token is cancelled if the deadline elapses or if this
    /// future is dropped before the signal arrives.
    pub(crate) async fn wait(self, timeout: Duration) -> WaitOutcome {
        let guard = self.cancellation.drop_guard();
        match tokio::time::timeout(timeout, self.receiver).await {
            Ok(Ok(())) => {
                guard.disarm();
                WaitOutcome::Signaled
            }
            Ok(Err(_)) => {
                guard.disarm();
                WaitOutcome::Interrupted
            }
            Err(_) => WaitOutcome::TimedOut,
        }
    }
}
