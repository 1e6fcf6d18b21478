//! `VariableArena`: an append-only sequence of variable-length byte blobs,
//! each length-prefixed.

use crate::arena::chunk::ByteChunk;
use crate::bounder::{self, GrowthBounder};
use crate::codec;
use crate::error::{CoreError, Result};
use crate::rounder::{HeaderAlignRounder, Rounder};
use crate::sizer::{ArenaKind, Sizer};

/// An append-only sequence of variable-length byte blobs.
///
/// Each blob is serialised as an `n`-byte big-endian length prefix (`n` fixed
/// at construction, 1–8) followed by the payload. Unlike [`FixedArena`](
/// crate::arena::FixedArena), a blob may span multiple chunks.
pub struct VariableArena {
    prefix_width: u8,
    sizer: Sizer,
    rounder: HeaderAlignRounder,
    bounder: Option<GrowthBounder>,
    chunks: Vec<Option<ByteChunk>>,
    size: u64,
    drained: bool,
}

impl VariableArena {
    /// Build a `VariableArena` whose length prefix is `prefix_width` bytes
    /// (1–8), with a default sizer and no growth bounder.
    pub fn new(prefix_width: u8) -> Result<Self> {
        Self::with_sizer(prefix_width, Sizer::default_for(ArenaKind::Generic)?)
    }

    /// Build a `VariableArena` with a caller-supplied sizer.
    pub fn with_sizer(prefix_width: u8, sizer: Sizer) -> Result<Self> {
        if !(1..=8).contains(&prefix_width) {
            return Err(CoreError::bad_argument(format!(
                "prefix width must be in [1, 8], got {prefix_width}"
            )));
        }
        Ok(Self {
            prefix_width,
            sizer,
            rounder: HeaderAlignRounder::default(),
            bounder: None,
            chunks: Vec::new(),
            size: 0,
            drained: false,
        })
    }

    pub fn set_growth_bounder(&mut self, bounder: GrowthBounder) {
        self.bounder = Some(bounder);
    }

    /// Length-prefix width in bytes.
    pub fn prefix_width(&self) -> u8 {
        self.prefix_width
    }

    /// Append `blob`, encoding its length as an `n`-byte prefix.
    ///
    /// # Errors
    /// `CoreError::BadArgument` if `blob.len()` doesn't fit in the prefix
    /// width; `CoreError::Misuse` if called after `drain`.
    pub fn append(&mut self, blob: &[u8]) -> Result<()> {
        if self.drained {
            return Err(CoreError::misuse("append called after drain"));
        }
        let max = codec::max_value(self.prefix_width);
        if blob.len() as u64 > max {
            return Err(CoreError::bad_argument(format!(
                "blob of length {} exceeds the maximum {} bytes a {}-byte prefix can encode",
                blob.len(),
                max,
                self.prefix_width
            )));
        }
        let prefix = codec::to_bytes(blob.len() as u64, self.prefix_width)?;
        self.write_across_chunks(&prefix)?;
        self.write_across_chunks(blob)?;
        self.size += 1;
        Ok(())
    }

    /// Append a blob that already carries its own `n`-byte length prefix,
    /// without re-encoding it.
    ///
    /// # Errors
    /// `CoreError::BadArgument` if `buf` is shorter than the prefix width;
    /// `CoreError::Misuse` if called after `drain`.
    pub fn append_sized(&mut self, buf: &[u8]) -> Result<()> {
        if self.drained {
            return Err(CoreError::misuse("append_sized called after drain"));
        }
        if buf.len() < self.prefix_width as usize {
            return Err(CoreError::bad_argument(
                "buffer shorter than the declared prefix width",
            ));
        }
        self.write_across_chunks(buf)?;
        self.size += 1;
        Ok(())
    }

    fn write_across_chunks(&mut self, mut data: &[u8]) -> Result<()> {
        while !data.is_empty() {
            let needs_new_chunk = match self.chunks.last() {
                Some(Some(chunk)) => chunk.remaining() == 0,
                _ => true,
            };
            if needs_new_chunk {
                let raw = self.sizer.next_size()?;
                let clipped = bounder::clip(raw, self.bounder.as_mut());
                let chunk_bytes = self.rounder.round(clipped as f64).max(1) as usize;
                self.chunks.push(Some(ByteChunk::with_capacity(chunk_bytes)));
            }
            let chunk = self.chunks.last_mut().unwrap().as_mut().unwrap();
            let written = chunk.write(data);
            debug_assert!(written > 0);
            data = &data[written..];
        }
        Ok(())
    }

    /// Number of blobs appended so far.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Consume the arena, returning a one-shot iterator over its blobs.
    pub fn drain(mut self) -> VariableDrain {
        let chunks = std::mem::take(&mut self.chunks);
        self.drained = true;
        VariableDrain {
            chunks,
            prefix_width: self.prefix_width,
            chunk_idx: 0,
            pos: 0,
        }
    }
}

/// One-shot, destructive iterator over a [`VariableArena`]'s blobs.
pub struct VariableDrain {
    chunks: Vec<Option<ByteChunk>>,
    prefix_width: u8,
    chunk_idx: usize,
    pos: usize,
}

impl VariableDrain {
    /// Read exactly `n` bytes, advancing across chunk boundaries and
    /// releasing each chunk as soon as its last byte has been consumed.
    /// Returns `None` if fewer than `n` bytes remain.
    fn read_n(&mut self, n: usize) -> Option<Vec<u8>> {
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            if self.chunk_idx >= self.chunks.len() {
                return None;
            }
            let exhausted = match &self.chunks[self.chunk_idx] {
                Some(chunk) => self.pos >= chunk.filled(),
                None => true,
            };
            if exhausted {
                self.chunks[self.chunk_idx] = None;
                self.chunk_idx += 1;
                self.pos = 0;
                continue;
            }
            let chunk = self.chunks[self.chunk_idx].as_ref().unwrap();
            let need = n - out.len();
            let available = chunk.filled() - self.pos;
            let take = need.min(available);
            let mut buf = vec![0u8; take];
            chunk.read(self.pos, &mut buf);
            out.extend_from_slice(&buf);
            self.pos += take;
        }
        Some(out)
    }
}

impl Iterator for VariableDrain {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        let prefix = self.read_n(self.prefix_width as usize)?;
        let len = codec::from_bytes(&prefix, self.prefix_width).ok()? as usize;
        self.read_n(len)
    }
}
