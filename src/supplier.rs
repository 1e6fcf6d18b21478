//! The value-supplier collaborator interface.
//!
//! A value supplier is an alternative to a plain OS file for sourcing bytes
//! into a [`crate::provider::FileChannelProvider`] entry — for a source the
//! provider can't simply `open(2)`, such as a file held locked by another
//! process. It receives a byte sink and writes into it; any error it returns
//! is surfaced to the caller as `CoreError::Io`, the same as a failed open.

use std::io::Write;

use crate::error::{CoreError, Result};

/// A callable that writes a value's bytes into `sink`, used in place of a
/// direct file open when the source isn't a plain file.
pub type ValueSupplier = Box<dyn FnMut(&mut dyn Write) -> std::io::Result<()> + Send>;

/// Run `supplier` against `sink`, translating any I/O error it raises into
/// `CoreError::Io` tagged with `path` (the same context a failed OS open
/// would have carried).
pub(crate) fn fill(
    supplier: &mut ValueSupplier,
    sink: &mut dyn Write,
    path: &std::path::Path,
) -> Result<()> {
    supplier(sink).map_err(|e| CoreError::io(path, e))
}
