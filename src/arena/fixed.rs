//! `FixedArena`: an append-only sequence of equal-length byte blobs (spec
//! §4.3.2).

use crate::arena::chunk::ByteChunk;
use crate::bounder::{self, GrowthBounder};
use crate::error::{CoreError, Result};
use crate::rounder::{MultipleOfLenRounder, Rounder};
use crate::sizer::{ArenaKind, Sizer};

/// An append-only sequence of fixed-length (`width` bytes) byte blobs.
///
/// Chunk sizes are always a positive multiple of `width`, so no blob ever
/// crosses a chunk boundary.
pub struct FixedArena {
    width: usize,
    sizer: Sizer,
    rounder: MultipleOfLenRounder,
    bounder: Option<GrowthBounder>,
    chunks: Vec<Option<ByteChunk>>,
    size: u64,
    drained: bool,
}

impl FixedArena {
    /// Build a `FixedArena` for blobs of exactly `width` bytes, with a
    /// default sizer and no growth bounder.
    pub fn new(width: usize) -> Result<Self> {
        Self::with_sizer(width, Sizer::default_for(ArenaKind::Fixed)?)
    }

    /// Build a `FixedArena` with a caller-supplied sizer.
    pub fn with_sizer(width: usize, sizer: Sizer) -> Result<Self> {
        if width == 0 {
            return Err(CoreError::bad_argument("fixed blob width must be > 0"));
        }
        if width > i32::MAX as usize {
            return Err(CoreError::bad_argument("fixed blob width too large"));
        }
        Ok(Self {
            width,
            sizer,
            rounder: MultipleOfLenRounder::new(width as i32),
            bounder: None,
            chunks: Vec::new(),
            size: 0,
            drained: false,
        })
    }

    pub fn set_growth_bounder(&mut self, bounder: GrowthBounder) {
        self.bounder = Some(bounder);
    }

    /// Blob width every append must match.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Append one `width`-byte blob.
    ///
    /// # Errors
    /// `CoreError::BadArgument` if `blob.len() != width`;
    /// `CoreError::Misuse` if called after `drain`.
    pub fn append(&mut self, blob: &[u8]) -> Result<()> {
        if self.drained {
            return Err(CoreError::misuse("append called after drain"));
        }
        if blob.len() != self.width {
            return Err(CoreError::bad_argument(format!(
                "blob length {} does not match fixed width {}",
                blob.len(),
                self.width
            )));
        }

        let needs_new_chunk = match self.chunks.last() {
            Some(Some(chunk)) => chunk.remaining() < self.width,
            _ => true,
        };

        if needs_new_chunk {
            let raw = self.sizer.next_size()?;
            let clipped = bounder::clip(raw, self.bounder.as_mut());
            let byte_budget = clipped.saturating_mul(self.width as u64).max(self.width as u64);
            let chunk_bytes = self.rounder.round(byte_budget as f64).max(self.width as i32) as usize;
            debug_assert_eq!(chunk_bytes % self.width, 0);
            self.chunks.push(Some(ByteChunk::with_capacity(chunk_bytes)));
        }

        let chunk = self.chunks.last_mut().unwrap().as_mut().unwrap();
        let written = chunk.write(blob);
        debug_assert_eq!(written, self.width);
        self.size += 1;
        Ok(())
    }

    /// Number of blobs appended so far.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Consume the arena, returning a one-shot iterator over its blobs.
    pub fn drain(mut self) -> FixedDrain {
        let chunks = std::mem::take(&mut self.chunks);
        self.drained = true;
        FixedDrain {
            chunks,
            width: self.width,
            chunk_idx: 0,
            pos: 0,
        }
    }
}

/// One-shot, destructive iterator over a [`FixedArena`]'s blobs.
pub struct FixedDrain {
    chunks: Vec<Option<ByteChunk>>,
    width: usize,
    chunk_idx: usize,
    pos: usize,
}

impl Iterator for FixedDrain {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        loop {
            if self.chunk_idx >= self.chunks.len() {
                return None;
            }
            let exhausted = match &self.chunks[self.chunk_idx] {
                Some(chunk) => self.pos + self.width > chunk.filled(),
                None => true,
            };
            if exhausted {
                self.chunks[self.chunk_idx] = None;
                self.chunk_idx += 1;
                self.pos = 0;
                continue;
            }
            let chunk = self.chunks[self.chunk_idx].as_ref().unwrap();
            let mut out = vec![0u8; self.width];
            chunk.read(self.pos, &mut out);
            self.pos += self.width;
            return Some(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizer::Sizer;

    fn small_arena(width: usize) -> FixedArena {
        FixedArena::with_sizer(width, Sizer::semi_expert(4, 64, 17).unwrap()).unwrap()
    }

    #[test]
    fn scenario_three_blobs_width_three() {
        let mut arena = small_arena(3);
        arena.append(&[0x01, 0x02, 0x03]).unwrap();
        arena.append(&[0x04, 0x05, 0x06]).unwrap();
        assert_eq!(arena.size(), 2);
        arena.append(&[0x07, 0x08, 0x09]).unwrap();
        assert_eq!(arena.size(), 3);

        let got: Vec<Vec<u8>> = arena.drain().collect();
        assert_eq!(
            got,
            vec![
                vec![0x01, 0x02, 0x03],
                vec![0x04, 0x05, 0x06],
                vec![0x07, 0x08, 0x09],
            ]
        );
    }

    #[test]
    fn rejects_mismatched_width() {
        let mut arena = small_arena(4);
        assert!(arena.append(&[1, 2, 3]).is_err());
    }

    #[test]
    fn append_after_drain_errors() {
        // `drain(self)` consuming the arena makes a real double-use a
        // compile error; the runtime flag it sets exists for callers behind
        // a trait object or other indirection where that can't be enforced
        // statically, so check it directly here.
        let mut arena = small_arena(2);
        arena.append(&[1, 2]).unwrap();
        arena.drained = true;
        assert!(arena.append(&[3, 4]).is_err());
    }

    #[test]
    fn every_drained_blob_has_declared_width() {
        let mut arena = small_arena(5);
        for i in 0..30u8 {
            arena.append(&[i, i, i, i, i]).unwrap();
        }
        for blob in arena.drain() {
            assert_eq!(blob.len(), 5);
        }
    }

    #[test]
    fn chunk_sizes_are_always_multiples_of_width() {
        let mut arena = small_arena(7);
        for i in 0..100u8 {
            arena.append(&[i; 7]).unwrap();
        }
        for chunk in arena.chunks.iter().flatten() {
            assert_eq!(chunk.capacity() % 7, 0);
        }
    }
}
