//! Background TTL sweep for idle, lazily-closed handles.
//!
//! Cancellation here borrows the cooperative-signal idea of a cancel token
//! observed only at a sleep boundary, but a bare `AtomicBool` can't
//! interrupt a sleeping thread promptly — the reaper needs to wake
//! the instant `shutdown` fires, not at the next poll. An `mpsc` channel
//! gives the same cooperative-cancellation shape with a `recv_timeout`
//! that doubles as the sleep itself: a send (or a dropped sender) wakes
//! the thread immediately, a timeout means "keep sweeping".

use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::CoreError;

use super::ProviderState;

pub(super) struct ReaperHandle {
    cancel_tx: Sender<()>,
    join: JoinHandle<()>,
}

impl ReaperHandle {
    /// `true` once the sweep thread has returned on its own (no idle
    /// entries left, or it observed shutdown) — a stale handle that hasn't
    /// been replaced yet, not a thread leak.
    pub(super) fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub(super) fn stop(self) {
        let _ = self.cancel_tx.send(());
        let _ = self.join.join();
    }
}

/// Spawn the sweep thread. Only called while holding the provider's reaper
/// slot lock, so there's never more than one sweep thread per provider.
pub(super) fn spawn(
    state: Arc<Mutex<ProviderState>>,
    delay: Duration,
    error_tx: Sender<CoreError>,
) -> ReaperHandle {
    let interval = (delay / 10).max(Duration::from_millis(1));
    let (cancel_tx, cancel_rx) = std::sync::mpsc::channel();
    let join = thread::Builder::new()
        .name("bulk-arena-reaper".into())
        .spawn(move || run(state, delay, interval, cancel_rx, error_tx))
        .expect("failed to spawn reaper thread");
    ReaperHandle { cancel_tx, join }
}

fn run(
    state: Arc<Mutex<ProviderState>>,
    delay: Duration,
    interval: Duration,
    cancel_rx: Receiver<()>,
    error_tx: Sender<CoreError>,
) {
    if !sleep_unless_cancelled(&cancel_rx, delay.saturating_sub(interval)) {
        return;
    }
    loop {
        if !sweep(&state, delay, &error_tx) {
            tracing::trace!("reaper found no idle handles left, stopping");
            return;
        }
        if !sleep_unless_cancelled(&cancel_rx, interval) {
            return;
        }
    }
}

/// Returns `false` if cancellation was observed (a message arrived, or the
/// sender side was dropped), `true` if the interval simply elapsed.
fn sleep_unless_cancelled(cancel_rx: &Receiver<()>, dur: Duration) -> bool {
    matches!(cancel_rx.recv_timeout(dur), Err(RecvTimeoutError::Timeout))
}

/// One scan of the entry table. Runs under the same lock `request`/`release`
/// use, so a sweep and a caller's request/release never interleave.
/// Returns `true` if any idle (but not-yet-expired) entries remain, meaning
/// the caller should keep sweeping.
///
/// Entries past their TTL are removed and closed here, under the same lock
/// acquisition as the scan that found them; a close failure is not silently
/// dropped — it's sent on `error_tx` for whoever holds the provider's error
/// channel to observe, since there's no synchronous caller to return it to.
fn sweep(state: &Arc<Mutex<ProviderState>>, delay: Duration, error_tx: &Sender<CoreError>) -> bool {
    let mut state = state.lock();
    if state.shutdown {
        return false;
    }
    let now = Instant::now();
    let mut any_idle_remaining = false;
    let mut expired = Vec::new();
    for (path, entry) in state.entries.iter() {
        if !entry.is_idle() {
            continue;
        }
        let idle_since = entry.idle_since.expect("idle entry always has idle_since");
        if now.duration_since(idle_since) < delay {
            any_idle_remaining = true;
        } else {
            expired.push(path.clone());
        }
    }
    for path in expired {
        if let Some(entry) = state.entries.remove(&path) {
            tracing::debug!(path = %path.display(), "reaper closing handle past its idle TTL");
            if let Err(err) = super::close_file(entry.file, &path) {
                tracing::warn!(path = %path.display(), error = %err, "reaper failed to close idle handle");
                let _ = error_tx.send(err);
            }
        }
    }
    any_idle_remaining
}
