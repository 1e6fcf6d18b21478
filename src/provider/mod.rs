//! `FileChannelProvider`: a small cache of open file handles shared by
//! everything reading or writing table data, with a coarse lock and a
//! background reaper.
//!
//! The provider holds at most one open handle per path and hands out
//! cheap duplicates (`File::try_clone`) of it on request; duplicated
//! handles share the same underlying open-file description (and so the
//! same seek cursor) as the original, which is what lets `request`
//! rewind to byte zero and have every outstanding duplicate observe it.
//! It reads and writes no file format itself — callers own that.

mod entry;
mod reaper;

use std::collections::HashMap;
use std::fs::File;
use std::io::Seek;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::OpenOptions;
use crate::error::{CoreError, Result};
use crate::supplier::{self, ValueSupplier};

use entry::Entry;
use reaper::ReaperHandle;

/// How a [`FileChannelProvider`] treats a handle once its reference count
/// drops to zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClosingStrategy {
    /// Idle handles stay open indefinitely; only `force_close` or
    /// `shutdown` will close them.
    KeepOpen,
    /// An idle handle is closed the instant its last reference is released.
    CloseImmediately,
    /// An idle handle is closed once it has stayed idle for `delay`,
    /// checked by a background reaper roughly every `delay / 10`.
    LazyClose { delay: Duration },
}

impl ClosingStrategy {
    /// Map the provider's `delay_ms` constructor parameter onto a strategy:
    /// negative means keep-open, zero means close-immediately, positive
    /// means lazy-close with that many milliseconds of TTL (floored at 10ms
    /// so the reaper's `delay / 10` sweep interval never degenerates to 0).
    pub fn from_delay_ms(delay_ms: i64) -> Self {
        if delay_ms < 0 {
            ClosingStrategy::KeepOpen
        } else if delay_ms == 0 {
            ClosingStrategy::CloseImmediately
        } else {
            let clamped = (delay_ms as u64).max(10);
            ClosingStrategy::LazyClose {
                delay: Duration::from_millis(clamped),
            }
        }
    }
}

struct ProviderState {
    entries: HashMap<PathBuf, Entry>,
    shutdown: bool,
}

/// A bounded cache of open file handles, keyed by path, with a configurable
/// closing strategy for idle entries.
///
/// Every public method here takes the same coarse lock, including across
/// the syscalls it makes while holding it — deliberately, so two concurrent
/// requests for the same path can never race each other into opening it
/// twice.
pub struct FileChannelProvider {
    state: Arc<Mutex<ProviderState>>,
    open_options: OpenOptions,
    strategy: ClosingStrategy,
    reaper: Mutex<Option<ReaperHandle>>,
    error_tx: Sender<CoreError>,
    error_rx: Mutex<Option<Receiver<CoreError>>>,
}

impl FileChannelProvider {
    /// Build a provider. `delay_ms` selects the closing strategy per
    /// [`ClosingStrategy::from_delay_ms`]; `open_options` is applied
    /// verbatim to every handle this provider opens.
    pub fn new(delay_ms: i64, open_options: OpenOptions) -> Self {
        let (error_tx, error_rx) = mpsc::channel();
        Self {
            state: Arc::new(Mutex::new(ProviderState {
                entries: HashMap::new(),
                shutdown: false,
            })),
            open_options,
            strategy: ClosingStrategy::from_delay_ms(delay_ms),
            reaper: Mutex::new(None),
            error_tx,
            error_rx: Mutex::new(Some(error_rx)),
        }
    }

    pub fn strategy(&self) -> ClosingStrategy {
        self.strategy
    }

    /// Take the channel the background reaper uses to escalate errors it
    /// can't otherwise return to a caller. Returns `None` if already taken.
    pub fn take_error_channel(&self) -> Option<Receiver<CoreError>> {
        self.error_rx.lock().take()
    }

    /// Request a handle to `path`, opening it if this is the first request
    /// for it. `None` in, `None` out — a null path passes straight through
    /// so callers that conditionally skip a path don't need a branch at
    /// every call site.
    ///
    /// # Errors
    /// `CoreError::Shutdown` if `shutdown` has already been called;
    /// `CoreError::Io` if the underlying open, seek, or duplicate fails.
    pub fn request(&self, path: Option<&Path>) -> Result<Option<File>> {
        let Some(path) = path else {
            return Ok(None);
        };
        let mut state = self.state.lock();
        if state.shutdown {
            return Err(CoreError::Shutdown);
        }

        if let Some(dup) = reuse_existing(&mut state, path)? {
            return Ok(Some(dup));
        }

        let std_opts = self.open_options.to_std()?;
        let file = std_opts.open(path).map_err(|e| CoreError::io(path, e))?;
        let dup = file.try_clone().map_err(|e| CoreError::io(path, e))?;
        tracing::debug!(path = %path.display(), "opened new file handle");
        state.entries.insert(path.to_path_buf(), Entry::new(file));
        Ok(Some(dup))
    }

    /// Like `request`, but when `path` has no cached entry yet, materializes
    /// its contents through `supplier` instead of a plain OS open — the
    /// *value supplier* collaborator, for sources a straightforward open
    /// can't reach, such as a file another process holds locked.
    ///
    /// Once materialized, the entry behaves exactly like one opened by
    /// `request`: later calls to either method reuse it and rewind it to
    /// byte zero.
    ///
    /// # Errors
    /// `CoreError::Shutdown` if `shutdown` has already been called;
    /// `CoreError::Io` if the supplier, the scratch-file open, or a
    /// duplicate/seek fails.
    pub fn request_via_supplier(
        &self,
        path: Option<&Path>,
        supplier: &mut ValueSupplier,
    ) -> Result<Option<File>> {
        let Some(path) = path else {
            return Ok(None);
        };
        let mut state = self.state.lock();
        if state.shutdown {
            return Err(CoreError::Shutdown);
        }

        if let Some(dup) = reuse_existing(&mut state, path)? {
            return Ok(Some(dup));
        }

        let mut scratch_opts = std::fs::OpenOptions::new();
        scratch_opts.read(true).write(true).create(true).truncate(true);
        let mut file = scratch_opts.open(path).map_err(|e| CoreError::io(path, e))?;
        supplier::fill(supplier, &mut file, path)?;
        file.seek(std::io::SeekFrom::Start(0))
            .map_err(|e| CoreError::io(path, e))?;
        let dup = file.try_clone().map_err(|e| CoreError::io(path, e))?;
        tracing::debug!(path = %path.display(), "materialized file handle via value supplier");
        state.entries.insert(path.to_path_buf(), Entry::new(file));
        Ok(Some(dup))
    }

    /// Release a handle previously obtained from `request`, decrementing
    /// its reference count and applying the configured closing strategy
    /// once it reaches zero.
    ///
    /// A no-op for a `None` path, an unknown path, or after `shutdown`.
    pub fn release(&self, path: Option<&Path>) -> Result<()> {
        let Some(path) = path else {
            return Ok(());
        };
        let mut state = self.state.lock();
        if state.shutdown {
            return Ok(());
        }

        let just_emptied = match state.entries.get_mut(path) {
            Some(entry) if entry.ref_count > 0 => {
                entry.ref_count -= 1;
                if entry.ref_count == 0 {
                    entry.idle_since = Some(Instant::now());
                    true
                } else {
                    false
                }
            }
            _ => return Ok(()),
        };
        if !just_emptied {
            return Ok(());
        }

        match self.strategy {
            ClosingStrategy::KeepOpen => {}
            ClosingStrategy::CloseImmediately => {
                if let Some(entry) = state.entries.remove(path) {
                    tracing::debug!(path = %path.display(), "closing handle immediately");
                    close_file(entry.file, path)?;
                }
            }
            ClosingStrategy::LazyClose { delay } => {
                drop(state);
                self.ensure_reaper_running(delay);
                return Ok(());
            }
        }
        Ok(())
    }

    /// Close `path`'s handle right away if it is currently idle; a no-op
    /// otherwise (including for an in-use, unknown, or already-shut-down
    /// path).
    pub fn force_close(&self, path: &Path) -> Result<()> {
        let mut state = self.state.lock();
        if state.shutdown {
            return Ok(());
        }
        let should_remove = matches!(state.entries.get(path), Some(e) if e.is_idle());
        if should_remove {
            if let Some(entry) = state.entries.remove(path) {
                tracing::debug!(path = %path.display(), "force-closed idle handle");
                close_file(entry.file, path)?;
            }
        }
        Ok(())
    }

    /// Close every remaining handle and stop accepting new requests.
    /// Idempotent: a second call is a no-op.
    pub fn shutdown(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.shutdown {
            return Ok(());
        }
        state.shutdown = true;
        let entries = std::mem::take(&mut state.entries);
        drop(state);

        for (path, entry) in entries {
            tracing::debug!(path = %path.display(), "closing handle on shutdown");
            if let Err(err) = close_file(entry.file, &path) {
                tracing::warn!(path = %path.display(), error = %err, "failed to close handle during shutdown");
            }
        }
        self.stop_reaper();
        Ok(())
    }

    fn ensure_reaper_running(&self, delay: Duration) {
        let mut guard = self.reaper.lock();
        if let Some(handle) = guard.as_ref() {
            if !handle.is_finished() {
                return;
            }
        }
        let handle = reaper::spawn(Arc::clone(&self.state), delay, self.error_tx.clone());
        *guard = Some(handle);
    }

    fn stop_reaper(&self) {
        if let Some(handle) = self.reaper.lock().take() {
            handle.stop();
        }
    }
}

/// If `path` already has a cached entry, bump its ref count, clear its idle
/// marker, rewind it to byte zero, and hand back a duplicate — shared by
/// `request` and `request_via_supplier` so both treat a warm cache hit
/// identically regardless of how the entry first got created.
fn reuse_existing(state: &mut ProviderState, path: &Path) -> Result<Option<File>> {
    let Some(existing) = state.entries.get_mut(path) else {
        return Ok(None);
    };
    existing.ref_count += 1;
    existing.idle_since = None;
    existing
        .file
        .seek(std::io::SeekFrom::Start(0))
        .map_err(|e| CoreError::io(path, e))?;
    let dup = existing.file.try_clone().map_err(|e| CoreError::io(path, e))?;
    tracing::trace!(path = %path.display(), ref_count = existing.ref_count, "reusing file handle");
    Ok(Some(dup))
}

/// Close `file`, surfacing a failed `close(2)` as `CoreError::Io` instead of
/// letting `File`'s `Drop` swallow it — the only way any caller (including
/// the reaper) can observe that a close actually failed.
///
/// `std::fs::File` exposes no fallible close on stable, so on unix this
/// takes the raw fd and calls `libc::close` directly; everywhere else there
/// is no portable way to do better than `File`'s own `Drop`.
#[cfg(unix)]
fn close_file(file: File, path: &Path) -> Result<()> {
    use std::os::unix::io::IntoRawFd;
    let fd = file.into_raw_fd();
    // SAFETY: `fd` came from `IntoRawFd::into_raw_fd`, which hands over
    // unique ownership of the descriptor; nothing else can reference it.
    let ret = unsafe { libc::close(fd) };
    if ret != 0 {
        return Err(CoreError::io(path, std::io::Error::last_os_error()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn close_file(file: File, _path: &Path) -> Result<()> {
    drop(file);
    Ok(())
}

impl Drop for FileChannelProvider {
    fn drop(&mut self) {
        // Best-effort: a caller that drops the provider without calling
        // `shutdown` still gets its handles closed (via each `File`'s own
        // `Drop`) once the last `Arc<Mutex<ProviderState>>` reference goes
        // away, and the reaper thread (if any) exits on its own once its
        // `cancel_tx` counterpart here is dropped.
        let _ = self.shutdown();
    }
}
