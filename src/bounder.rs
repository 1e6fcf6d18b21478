//! The growth bounder collaborator interface.
//!
//! A growth bounder is an external oracle an arena consults when picking the
//! size of its next chunk: "how many more elements do you expect me to
//! receive?" The sentinel [`UNKNOWN_BOUND`] means "no idea — don't clip."

/// Sentinel returned by a bounder that has no useful upper bound to offer.
pub const UNKNOWN_BOUND: u32 = u32::MAX;

/// A zero-argument callable returning a positive upper bound on further
/// appends. Boxed so arenas can hold one without a generic type parameter.
pub type GrowthBounder = Box<dyn FnMut() -> u32 + Send>;

/// Clip a sizer-requested chunk size against an optional bounder's current
/// bound, treating [`UNKNOWN_BOUND`] as "no clipping."
pub(crate) fn clip(requested: u64, bounder: Option<&mut GrowthBounder>) -> u64 {
    match bounder {
        Some(b) => {
            let bound = b();
            if bound == UNKNOWN_BOUND {
                requested
            } else {
                requested.min(bound as u64)
            }
        }
        None => requested,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_bound_does_not_clip() {
        let mut b: GrowthBounder = Box::new(|| UNKNOWN_BOUND);
        assert_eq!(clip(1_000, Some(&mut b)), 1_000);
    }

    #[test]
    fn finite_bound_clips_down() {
        let mut b: GrowthBounder = Box::new(|| 5);
        assert_eq!(clip(1_000, Some(&mut b)), 5);
        assert_eq!(clip(3, Some(&mut b)), 3);
    }

    #[test]
    fn no_bounder_is_a_no_op() {
        assert_eq!(clip(42, None), 42);
    }
}
