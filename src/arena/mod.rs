//! Append-only, chunk-linked containers for staging large sequences of
//! values during bulk import, compaction, and reindexing.
//!
//! All three arenas share the same two-state lifecycle: `Open` while the
//! caller appends, `Drained` once `drain()` has been taken. `drain()`
//! consumes the arena by value, which makes a second call to `append` a
//! compile error in ordinary use; a `drained` flag backs that up with a
//! runtime `CoreError::Misuse` for any caller that still reaches `append`
//! through a dangling `&mut` (e.g. behind a trait object).

mod chunk;
mod fixed;
mod generic;
mod variable;

pub use fixed::{FixedArena, FixedDrain};
pub use generic::{GenericArena, GenericDrain};
pub use variable::{VariableArena, VariableDrain};
