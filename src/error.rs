//! Crate-wide error type for the bulk-load arena layer.
//!
//! Five kinds, matching the error-handling design: `BadArgument` and `Misuse`
//! are programmer errors reported synchronously and fatally; `Shutdown` is
//! terminal; `Unsupported` and `Io` surface an underlying OS failure with
//! enough context (a path, where available) to diagnose.

use std::path::PathBuf;

/// Errors produced by the arena, sizer, rounder, and file-channel provider.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A caller-supplied argument violated a documented precondition.
    #[error("bad argument: {0}")]
    BadArgument(String),

    /// Operation attempted on a file-channel provider that has shut down.
    #[error("provider is shut down")]
    Shutdown,

    /// An open-option the underlying OS does not understand was requested.
    #[error("unsupported open option: {0}")]
    Unsupported(String),

    /// An open/close/seek/read/write syscall failed.
    ///
    /// `path` is populated by [`CoreError::io`] whenever the failing
    /// operation had one to report; a bare `?`-propagated `std::io::Error`
    /// (via the `#[from]` conversion below) carries no path and defaults to
    /// an empty one.
    #[error("io failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[from]
        source: std::io::Error,
    },

    /// `append` was called after `drain`, or a drained arena was otherwise
    /// used past its one-shot boundary.
    #[error("misuse: {0}")]
    Misuse(String),
}

impl CoreError {
    /// Wrap an I/O error with the path that was being operated on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn bad_argument(msg: impl Into<String>) -> Self {
        CoreError::BadArgument(msg.into())
    }

    pub fn misuse(msg: impl Into<String>) -> Self {
        CoreError::Misuse(msg.into())
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, CoreError>;
