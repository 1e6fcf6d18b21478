//! Serde-deserializable construction parameters.
//!
//! The core has no config file loader or CLI of its own (see spec
//! Non-goals), but every constructor parameter it exposes is plain,
//! `serde`-derived data so an embedding application can load it from
//! whatever config format it already uses — the same shape
//! `lumen-rt`'s own data types (e.g. `services::cache::CacheEntry`) are built
//! in, just applied to configuration instead of runtime values.

use crate::error::Result;
use crate::sizer::{ArenaKind, Sizer};

/// Construction parameters for a [`Sizer`]. Any field left `None` falls back
/// to what `Sizer::default_for` would choose. Setting `alpha` selects the
/// fully-explicit `Sizer::expert` constructor instead of `semi_expert`.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SizerConfig {
    pub t: Option<u64>,
    pub c: Option<u64>,
    pub nu: Option<u32>,
    pub alpha: Option<f64>,
}

impl SizerConfig {
    /// Build the `Sizer` this config describes, filling in defaults for
    /// `kind` wherever a field was left unset.
    pub fn build(&self, kind: ArenaKind) -> Result<Sizer> {
        let nu = self.nu.unwrap_or_else(|| kind.default_overhead());
        let t = self.t.unwrap_or(crate::sizer::DEFAULT_T);
        let c = match self.c {
            Some(c) => c,
            None => crate::sizer::available_memory_estimate() / 2,
        };
        match self.alpha {
            Some(alpha) => Sizer::expert(alpha, t, c, nu),
            None => Sizer::semi_expert(t, c, nu),
        }
    }
}

/// The abstract open-option bag passed verbatim to the underlying OS open
/// call by [`crate::provider::FileChannelProvider`].
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct OpenOptions {
    pub read: bool,
    pub write: bool,
    pub append: bool,
    pub truncate: bool,
    pub create: bool,
    /// Request synchronous (O_SYNC-style) writes. Only honored on Linux;
    /// requesting it elsewhere is an `Unsupported` open option, since this
    /// crate has no portable way to express it without a libc dependency.
    pub sync: bool,
}

impl OpenOptions {
    /// Build the read/write-only convenience set most callers want.
    pub fn read_only() -> Self {
        Self {
            read: true,
            ..Default::default()
        }
    }

    pub(crate) fn to_std(&self) -> Result<std::fs::OpenOptions> {
        let mut opts = std::fs::OpenOptions::new();
        opts.read(self.read)
            .write(self.write)
            .append(self.append)
            .truncate(self.truncate)
            .create(self.create);

        if self.sync {
            apply_sync(&mut opts)?;
        }

        Ok(opts)
    }
}

#[cfg(target_os = "linux")]
fn apply_sync(opts: &mut std::fs::OpenOptions) -> Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    // O_SYNC on Linux (asm-generic/fcntl.h); stable across architectures
    // that don't redefine O_DIRECT/O_SYNC bit layout (x86_64, aarch64).
    const O_SYNC: i32 = 0o4010000;
    opts.custom_flags(O_SYNC);
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn apply_sync(_opts: &mut std::fs::OpenOptions) -> Result<()> {
    Err(crate::error::CoreError::Unsupported("sync".to_string()))
}

/// Construction parameters for [`crate::provider::FileChannelProvider`].
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ProviderConfig {
    /// See `ClosingStrategy::from_delay_ms` for how this maps to a strategy.
    pub delay_ms: i64,
    pub open_options: OpenOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_sets_only_read() {
        let opts = OpenOptions::read_only();
        assert!(opts.read);
        assert!(!opts.write);
    }

    #[test]
    fn build_with_no_fields_set_matches_default_for() {
        let sizer = SizerConfig::default().build(ArenaKind::Generic).unwrap();
        assert_eq!(sizer.alpha(), Sizer::default_for(ArenaKind::Generic).unwrap().alpha());
    }

    #[test]
    fn build_with_alpha_set_uses_the_expert_constructor() {
        let cfg = SizerConfig {
            t: Some(4),
            c: Some(64),
            nu: Some(17),
            alpha: Some(2.0),
        };
        let sizer = cfg.build(ArenaKind::Generic).unwrap();
        assert_eq!(sizer.alpha(), 2.0);
    }

    #[test]
    fn build_without_alpha_uses_semi_expert() {
        let cfg = SizerConfig {
            t: Some(50),
            c: Some(60),
            nu: Some(17),
            alpha: None,
        };
        let sizer = cfg.build(ArenaKind::Fixed).unwrap();
        assert_eq!(sizer.alpha(), 1.0);
    }

    #[test]
    fn deserializes_from_a_minimal_document() {
        let cfg: ProviderConfig =
            serde_json::from_str(r#"{"delay_ms": 50, "open_options": {"read": true}}"#).unwrap();
        assert_eq!(cfg.delay_ms, 50);
        assert!(cfg.open_options.read);
    }
}
