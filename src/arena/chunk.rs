//! Backing storage shared by the byte-oriented arenas.

/// A contiguous, append-only byte buffer: one link in an arena's chunk chain.
///
/// Represented here as an owned `Vec<u8>` slot in the arena's chunk vector
/// rather than a hand-rolled forward-linked list: Rust's ownership model
/// already gives us the "release chunks as drain advances" behavior for free
/// by `take`-ing each `Option` slot once it's exhausted, without unsafe
/// pointer chasing. See `DESIGN.md` for the rationale.
#[derive(Debug)]
pub(crate) struct ByteChunk {
    buf: Vec<u8>,
    filled: usize,
}

impl ByteChunk {
    pub(crate) fn with_capacity(cap: usize) -> Self {
        Self {
            buf: vec![0u8; cap],
            filled: 0,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.filled
    }

    pub(crate) fn filled(&self) -> usize {
        self.filled
    }

    /// Copy as much of `data` as fits into the remaining space, returning the
    /// number of bytes written.
    pub(crate) fn write(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.remaining());
        self.buf[self.filled..self.filled + n].copy_from_slice(&data[..n]);
        self.filled += n;
        n
    }

    /// Read bytes starting at `offset` into `out`, returning the number of
    /// bytes copied (bounded by both `out` and the filled region).
    pub(crate) fn read(&self, offset: usize, out: &mut [u8]) -> usize {
        let available = self.filled.saturating_sub(offset);
        let n = out.len().min(available);
        out[..n].copy_from_slice(&self.buf[offset..offset + n]);
        n
    }
}
