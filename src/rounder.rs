//! Quantisation strategies that snap a raw chunk size (as a real number,
//! coming out of [`crate::sizer::Sizer`]) to an allocator-friendly integer.

use std::fmt;

/// Clamp used by every strategy: a rounder never returns a size larger than
/// this, regardless of how large the requested value was.
const MAX_ROUNDED: i64 = i32::MAX as i64;

/// A strategy that turns a raw, real-valued chunk size into a positive
/// integer size actually used for allocation.
pub trait Rounder: fmt::Debug {
    /// Round `x` to a positive `i32`. Implementations must never return a
    /// value `< 1`.
    fn round(&self, x: f64) -> i32;
}

/// Rounds up to the smallest `n` such that a fixed-size `header` plus `n` is
/// a multiple of 8 — used when a chunk also carries a small header in
/// addition to its payload.
#[derive(Debug, Clone, Copy)]
pub struct HeaderAlignRounder {
    header: i32,
}

impl HeaderAlignRounder {
    /// The header size the rest of the crate uses: a chunk's forward-link
    /// pointer plus a small amount of bookkeeping, matching the
    /// "align-12-plus-n-to-8" strategy.
    pub const DEFAULT_HEADER: i32 = 12;

    pub fn new(header: i32) -> Self {
        Self { header }
    }
}

impl Default for HeaderAlignRounder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HEADER)
    }
}

impl Rounder for HeaderAlignRounder {
    fn round(&self, x: f64) -> i32 {
        let want = x.ceil().max(1.0) as i64;
        let header = self.header as i64;
        // Smallest n >= want such that (header + n) % 8 == 0.
        let total = header + want;
        let remainder = total.rem_euclid(8);
        let padded_total = if remainder == 0 {
            total
        } else {
            total + (8 - remainder)
        };
        let n = (padded_total - header).clamp(1, MAX_ROUNDED);
        n as i32
    }
}

/// Rounds up to the nearest positive multiple of a fixed `len` — used in
/// `FixedArena` so every slot fits entirely within one chunk.
#[derive(Debug, Clone, Copy)]
pub struct MultipleOfLenRounder {
    len: i64,
}

impl MultipleOfLenRounder {
    pub fn new(len: i32) -> Self {
        assert!(len > 0, "len must be positive");
        Self { len: len as i64 }
    }
}

impl Rounder for MultipleOfLenRounder {
    fn round(&self, x: f64) -> i32 {
        let want = x.ceil().max(1.0) as i64;
        let multiples = (want + self.len - 1) / self.len;
        let multiples = multiples.max(1);
        (multiples * self.len).clamp(1, MAX_ROUNDED) as i32
    }
}

/// Wraps another [`Rounder`], converting an element-count budget into a byte
/// budget (by multiplying by `elem_size`), rounding that, then converting the
/// rounded byte count back into an element count (by dividing). Used when the
/// underlying rounding strategy — e.g. [`HeaderAlignRounder`] — naturally
/// operates in bytes but the arena counts elements.
#[derive(Debug)]
pub struct ElementSizeRounder<R: Rounder> {
    inner: R,
    elem_size: i32,
}

impl<R: Rounder> ElementSizeRounder<R> {
    pub fn new(inner: R, elem_size: i32) -> Self {
        assert!(elem_size > 0, "elem_size must be positive");
        Self { inner, elem_size }
    }
}

impl<R: Rounder> Rounder for ElementSizeRounder<R> {
    fn round(&self, x: f64) -> i32 {
        let byte_budget = x * self.elem_size as f64;
        let rounded_bytes = self.inner.round(byte_budget);
        ((rounded_bytes as i64 + self.elem_size as i64 - 1) / self.elem_size as i64)
            .max(1)
            .clamp(1, MAX_ROUNDED) as i32
    }
}

/// Machine pointer width in bytes, used as the default element size for
/// [`ElementSizeRounder`] over [`GenericArena`](crate::arena::GenericArena)
/// slots. Derived from the target rather than hard-coded, so the
/// handle-size constant tracks the target pointer width instead of
/// assuming one.
pub const HANDLE_SIZE: i32 = std::mem::size_of::<usize>() as i32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_align_rounds_to_multiple_of_eight_minus_header() {
        let r = HeaderAlignRounder::default();
        for want in [1, 4, 7, 8, 9, 100] {
            let n = r.round(want as f64);
            assert!(n >= want);
            assert_eq!((HeaderAlignRounder::DEFAULT_HEADER + n) % 8, 0);
        }
    }

    #[test]
    fn multiple_of_len_never_splits_a_slot() {
        let r = MultipleOfLenRounder::new(3);
        for want in [1, 2, 3, 4, 10, 1000] {
            let n = r.round(want as f64);
            assert!(n >= want);
            assert_eq!(n % 3, 0);
        }
    }

    #[test]
    fn multiple_of_len_at_least_len_for_small_requests() {
        let r = MultipleOfLenRounder::new(64);
        assert_eq!(r.round(0.0), 64);
        assert_eq!(r.round(1.0), 64);
    }

    #[test]
    fn rounders_never_return_non_positive() {
        let r = HeaderAlignRounder::default();
        assert!(r.round(0.0) >= 1);
        assert!(r.round(-5.0) >= 1);
    }

    #[test]
    fn element_size_rounder_round_trips_through_bytes() {
        let inner = MultipleOfLenRounder::new(64);
        let r = ElementSizeRounder::new(inner, HANDLE_SIZE);
        let elements = r.round(10.0);
        assert!(elements >= 10);
    }
}
