//! bulk-arena — the bulk-load arena layer for a columnar table store.
//!
//! Three append-only, chunk-linked arenas ([`GenericArena`], [`FixedArena`],
//! [`VariableArena`]) stage large runs of values during bulk import,
//! compaction, and reindexing. Chunk sizes come from a [`Sizer`] (a pure
//! numeric growth-then-freeze sequence generator) passed through a
//! [`Rounder`](rounder::Rounder) that quantizes to a storage-friendly
//! boundary. A [`FileChannelProvider`] caches the open file handles those
//! arenas (and their callers) read and write through, with a configurable
//! strategy for closing ones that fall idle.
#![warn(clippy::all)]

pub mod arena;
pub mod bounder;
pub mod codec;
pub mod config;
pub mod error;
pub mod provider;
pub mod rounder;
pub mod sizer;
pub mod supplier;

pub use arena::{FixedArena, FixedDrain, GenericArena, GenericDrain, VariableArena, VariableDrain};
pub use bounder::{GrowthBounder, UNKNOWN_BOUND};
pub use config::{OpenOptions, ProviderConfig, SizerConfig};
pub use error::{CoreError, Result};
pub use provider::{ClosingStrategy, FileChannelProvider};
pub use rounder::{ElementSizeRounder, HeaderAlignRounder, MultipleOfLenRounder, Rounder};
pub use sizer::{ArenaKind, Sizer};
pub use supplier::ValueSupplier;
