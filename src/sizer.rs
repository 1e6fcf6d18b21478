//! Chunk-size sequence generator.
//!
//! A [`Sizer`] is a pure numeric engine: given an estimated lower bound on the
//! first chunk's size, an estimated total capacity, and a per-chunk overhead,
//! it hands out a sequence of chunk sizes that grow (or shrink) by a fixed
//! factor for a bounded number of steps and then stay constant. Arenas use it
//! to decide how big to make each new backing chunk without knowing in
//! advance how many elements will ultimately be appended.

use crate::error::{CoreError, Result};

/// Which arena flavor a [`Sizer`] is being built for, used only to pick the
/// default per-chunk overhead `ν` when the caller doesn't supply one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaKind {
    /// `GenericArena` / `VariableArena`: a forward-link pointer per chunk.
    Generic,
    /// `FixedArena`: a forward-link pointer plus a per-chunk slot-count header.
    Fixed,
}

impl ArenaKind {
    pub(crate) fn default_overhead(self) -> u32 {
        match self {
            ArenaKind::Generic => 17,
            ArenaKind::Fixed => 28,
        }
    }
}

pub(crate) const DEFAULT_T: u64 = 4;
const MIN_OVERHEAD: u32 = 4;
const MIN_ALPHA: f64 = 0.05;
const MAX_GROWTH_STEPS: u32 = 4096;

/// A chunk-size generator. See the module docs for the algorithm.
#[derive(Debug, Clone)]
pub struct Sizer {
    alpha: f64,
    m: u32,
    #[allow(dead_code)]
    nu: u32,
    t: f64,
    call_count: u32,
}

impl Sizer {
    /// Build a `Sizer` with every parameter left to its default: `ν` chosen
    /// from `kind`, `t = 4`, and `c` estimated as half of currently available
    /// free memory (best-effort; falls back to a conservative constant when
    /// the OS doesn't expose that information).
    pub fn default_for(kind: ArenaKind) -> Result<Self> {
        let nu = kind.default_overhead();
        let c = available_memory_estimate() / 2;
        Self::semi_expert(DEFAULT_T, c, nu)
    }

    /// Build a `Sizer` from a lower bound `t`, an estimated capacity `c`, and
    /// an overhead `ν`, choosing `α` and `m` automatically.
    ///
    /// - If `t < ν`, the initial chunk is already cheaper than its own
    ///   overhead would be to amortize further, so growth is exponential
    ///   (`α = 2`).
    /// - If `c` is within `ν` of `t`, a second chunk isn't worth its own
    ///   overhead either; chunks are constant-size (`α = 1`, `m = 1`).
    /// - Otherwise `α` shrinks geometrically below 1 until the feasibility
    ///   bound holds, clamping `t` if `α` would otherwise drop below 0.05.
    pub fn semi_expert(t: u64, c: u64, nu: u32) -> Result<Self> {
        validate_nu(nu)?;
        validate_t_c(t, c)?;

        let t = t as f64;
        let c = c as f64;

        if t < nu as f64 {
            let m = growth_steps(t, c, 2.0);
            return Ok(Self::new(2.0, m, nu, t));
        }

        if c <= t + nu as f64 {
            return Ok(Self::new(1.0, 1, nu, t.max(1.0)));
        }

        let mut alpha = 0.5_f64;
        loop {
            if feasible(alpha, t, c, nu) {
                let m = shrink_steps(t, nu, alpha);
                return Ok(Self::new(alpha, m, nu, t));
            }
            alpha /= 2.0;
            if alpha < MIN_ALPHA {
                let clamped_t = feasibility_bound(MIN_ALPHA, c, nu);
                let m = shrink_steps(clamped_t, nu, MIN_ALPHA);
                return Ok(Self::new(MIN_ALPHA, m, nu, clamped_t));
            }
        }
    }

    /// Build a `Sizer` from fully explicit parameters. `α`, `t`, `c`, and `ν`
    /// are validated by the same feasibility test `semi_expert` uses
    /// internally (for `α < 1`); out-of-range inputs are rejected rather than
    /// silently clamped.
    pub fn expert(alpha: f64, t: u64, c: u64, nu: u32) -> Result<Self> {
        validate_nu(nu)?;
        validate_t_c(t, c)?;
        if !(alpha > 0.0) || !alpha.is_finite() {
            return Err(CoreError::bad_argument(format!(
                "growth factor must be positive and finite, got {alpha}"
            )));
        }

        let t = t as f64;
        let c = c as f64;

        if alpha < 1.0 && !feasible(alpha, t, c, nu) {
            return Err(CoreError::bad_argument(format!(
                "alpha={alpha} is not feasible for t={t}, c={c}, nu={nu}"
            )));
        }

        let m = if alpha == 1.0 {
            1
        } else if alpha > 1.0 {
            growth_steps(t, c, alpha)
        } else {
            shrink_steps(t, nu, alpha)
        };

        Ok(Self::new(alpha, m, nu, t))
    }

    fn new(alpha: f64, m: u32, nu: u32, t: f64) -> Self {
        Self {
            alpha,
            m: m.max(1),
            nu,
            t,
            call_count: 0,
        }
    }

    /// Return the next chunk size and advance internal state.
    ///
    /// Invariant: `next_size(i+1)` is either equal to `next_size(i)` or
    /// `next_size(i) * α`; after `m` calls the returned size never changes
    /// again.
    pub fn next_size(&mut self) -> Result<u64> {
        if !self.t.is_finite() || self.t <= 0.0 {
            return Err(CoreError::bad_argument(format!(
                "sizer produced a non-positive or non-finite size: {}",
                self.t
            )));
        }
        let result = self.t.round() as u64;
        self.call_count += 1;
        if self.call_count < self.m {
            self.t *= self.alpha;
        }
        Ok(result.max(1))
    }

    /// Growth factor this sizer was constructed with.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Number of growing/shrinking steps before the size freezes.
    pub fn growth_steps_remaining(&self) -> u32 {
        self.m
    }
}

fn validate_nu(nu: u32) -> Result<()> {
    if nu < MIN_OVERHEAD {
        return Err(CoreError::bad_argument(format!(
            "per-chunk overhead nu must be >= {MIN_OVERHEAD}, got {nu}"
        )));
    }
    Ok(())
}

fn validate_t_c(t: u64, c: u64) -> Result<()> {
    if t > 0 && c > 0 && t > c {
        return Err(CoreError::bad_argument(format!(
            "lower bound t={t} exceeds estimated capacity c={c}"
        )));
    }
    Ok(())
}

/// `t <= (1-α)·(ν/(2·ln²α) + c)`, the feasibility bound for `0 < α < 1`.
fn feasible(alpha: f64, t: f64, c: u64, nu: u32) -> bool {
    t <= feasibility_bound(alpha, c, nu)
}

fn feasibility_bound(alpha: f64, c: u64, nu: u32) -> f64 {
    let ln_alpha = alpha.ln();
    (1.0 - alpha) * (nu as f64 / (2.0 * ln_alpha * ln_alpha) + c as f64)
}

/// Largest `m >= 1` such that the fully-filled growing prefix
/// `t + t·α + ... + t·α^(m-1)` does not exceed `c`, for `α > 1`.
fn growth_steps(t: f64, c: f64, alpha: f64) -> u32 {
    let mut m = 1u32;
    let mut sum = t;
    let mut term = t;
    while m < MAX_GROWTH_STEPS {
        let next_term = term * alpha;
        if sum + next_term > c {
            break;
        }
        sum += next_term;
        term = next_term;
        m += 1;
    }
    m
}

/// Largest `m >= 1` such that the chunk size is still above the per-chunk
/// overhead after `m - 1` shrink steps, for `α < 1`.
fn shrink_steps(t: f64, nu: u32, alpha: f64) -> u32 {
    let mut m = 1u32;
    let mut size = t;
    while m < MAX_GROWTH_STEPS {
        let next = size * alpha;
        if next <= nu as f64 {
            break;
        }
        size = next;
        m += 1;
    }
    m
}

/// Best-effort estimate of currently available free memory, in bytes.
///
/// Reads `MemAvailable` from `/proc/meminfo` on Linux; everywhere else (and
/// if the file is unreadable) falls back to a conservative 64 MiB so that
/// `Sizer::default_for` always produces a usable, if unambitious, capacity
/// estimate rather than failing.
pub(crate) fn available_memory_estimate() -> u64 {
    const FALLBACK: u64 = 64 * 1024 * 1024;

    #[cfg(target_os = "linux")]
    {
        if let Ok(contents) = std::fs::read_to_string("/proc/meminfo") {
            for line in contents.lines() {
                if let Some(rest) = line.strip_prefix("MemAvailable:") {
                    let kb: u64 = rest
                        .trim()
                        .trim_end_matches(" kB")
                        .parse()
                        .unwrap_or(FALLBACK / 1024);
                    return kb.saturating_mul(1024);
                }
            }
        }
    }
    FALLBACK
}
