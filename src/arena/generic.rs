//! `GenericArena`: an append-only sequence of opaque, fixed-width element
//! handles.

use crate::bounder::{self, GrowthBounder};
use crate::error::{CoreError, Result};
use crate::rounder::{ElementSizeRounder, HeaderAlignRounder, Rounder, HANDLE_SIZE};
use crate::sizer::{ArenaKind, Sizer};

/// An append-only, chunk-linked sequence of opaque element handles.
///
/// Chunks are held in an ordered `Vec<Option<Vec<T>>>`; only the last
/// occupied slot is ever partially filled. `drain()` consumes the arena and
/// returns a one-shot iterator that clears each slot as it's exhausted.
pub struct GenericArena<T> {
    sizer: Sizer,
    rounder: ElementSizeRounder<HeaderAlignRounder>,
    bounder: Option<GrowthBounder>,
    chunks: Vec<Option<Vec<T>>>,
    size: u64,
    drained: bool,
}

impl<T> GenericArena<T> {
    /// Build a `GenericArena` with a default sizer (see
    /// `Sizer::default_for`) and no growth bounder.
    pub fn new() -> Result<Self> {
        Self::with_sizer(Sizer::default_for(ArenaKind::Generic)?)
    }

    /// Build a `GenericArena` with a caller-supplied sizer.
    pub fn with_sizer(sizer: Sizer) -> Result<Self> {
        Ok(Self {
            sizer,
            rounder: ElementSizeRounder::new(HeaderAlignRounder::default(), HANDLE_SIZE),
            bounder: None,
            chunks: Vec::new(),
            size: 0,
            drained: false,
        })
    }

    /// Attach a growth bounder clipping future chunk-size requests.
    pub fn set_growth_bounder(&mut self, bounder: GrowthBounder) {
        self.bounder = Some(bounder);
    }

    /// Append one element, allocating a new chunk if the current one is full.
    pub fn append(&mut self, element: T) -> Result<()> {
        if self.drained {
            return Err(CoreError::misuse("append called after drain"));
        }

        let needs_new_chunk = match self.chunks.last() {
            Some(Some(chunk)) => chunk.len() == chunk.capacity(),
            _ => true,
        };

        if needs_new_chunk {
            let raw = self.sizer.next_size()?;
            let clipped = bounder::clip(raw, self.bounder.as_mut());
            let elements = self.rounder.round(clipped as f64).max(1) as usize;
            self.chunks.push(Some(Vec::with_capacity(elements)));
        }

        let chunk = self.chunks.last_mut().unwrap().as_mut().unwrap();
        chunk.push(element);
        self.size += 1;
        Ok(())
    }

    /// Number of elements appended so far.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Consume the arena, returning a one-shot iterator over its elements.
    ///
    /// Subsequent calls to `append` on this arena (impossible after this
    /// call moves `self`, but kept as a documented invariant for callers
    /// holding a `&mut` through a trait object) return `CoreError::Misuse`.
    pub fn drain(mut self) -> GenericDrain<T> {
        let chunks = std::mem::take(&mut self.chunks)
            .into_iter()
            .map(|c| c.map(|v| v.into_iter()))
            .collect();
        self.drained = true;
        GenericDrain {
            chunks,
            chunk_idx: 0,
        }
    }
}

/// One-shot, destructive iterator over a [`GenericArena`]'s elements.
///
/// Walks the chunk vector front to back; once a chunk's last element is
/// yielded its slot is set to `None`, dropping (and so releasing) that
/// chunk's backing `Vec` immediately rather than at the end of iteration.
pub struct GenericDrain<T> {
    chunks: Vec<Option<std::vec::IntoIter<T>>>,
    chunk_idx: usize,
}

impl<T> Iterator for GenericDrain<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        while self.chunk_idx < self.chunks.len() {
            let done = match &mut self.chunks[self.chunk_idx] {
                Some(iter) => match iter.next() {
                    Some(v) => return Some(v),
                    None => true,
                },
                None => true,
            };
            if done {
                self.chunks[self.chunk_idx] = None;
                self.chunk_idx += 1;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizer::Sizer;

    #[test]
    fn size_tracks_successful_appends() {
        let mut arena = GenericArena::with_sizer(Sizer::semi_expert(4, 64, 17).unwrap()).unwrap();
        for i in 0..20u64 {
            arena.append(i).unwrap();
        }
        assert_eq!(arena.size(), 20);
    }

    #[test]
    fn drain_yields_elements_in_insertion_order() {
        let mut arena = GenericArena::with_sizer(Sizer::semi_expert(4, 64, 17).unwrap()).unwrap();
        for i in 0..50u64 {
            arena.append(i).unwrap();
        }
        let got: Vec<u64> = arena.drain().collect();
        let want: Vec<u64> = (0..50).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn append_after_drain_errors() {
        // `drain(self)` consuming the arena makes a real double-use a
        // compile error; the runtime flag it sets exists for callers behind
        // a trait object or other indirection where that can't be enforced
        // statically, so check it directly here.
        let mut arena = GenericArena::<u64>::new().unwrap();
        arena.append(1).unwrap();
        arena.drained = true;
        assert!(arena.append(2).is_err());
    }

    #[test]
    fn growth_bounder_clips_chunk_size() {
        let mut arena = GenericArena::with_sizer(Sizer::semi_expert(4, 64, 17).unwrap()).unwrap();
        arena.set_growth_bounder(Box::new(|| 1));
        arena.append(1u64).unwrap();
        arena.append(2u64).unwrap();
        assert_eq!(arena.size(), 2);
    }
}
