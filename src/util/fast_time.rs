//! Monotonic timestamps read straight from `clock_gettime`
//!
//! Used to time individual backend calls, where the per-call overhead of the
//! clock matters at high operation rates.

use std::time::Duration;

/// Monotonic timestamp in nanoseconds (`CLOCK_MONOTONIC`)
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FastInstant {
    nanos: u64,
}

impl FastInstant {
    #[inline(always)]
    pub fn now() -> Self {
        Self {
            nanos: read_clock(libc::CLOCK_MONOTONIC),
        }
    }

    /// Duration since `earlier`, zero if `earlier` is later
    #[inline(always)]
    pub fn duration_since(&self, earlier: FastInstant) -> Duration {
        Duration::from_nanos(self.nanos.saturating_sub(earlier.nanos))
    }

    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        Self::now().duration_since(*self)
    }

    /// Whole microseconds elapsed
    #[inline(always)]
    pub fn elapsed_micros(&self) -> u64 {
        Self::now().nanos.saturating_sub(self.nanos) / 1_000
    }
}

#[inline(always)]
fn read_clock(clock: libc::clockid_t) -> u64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: `ts` is a valid, writable timespec and `clock` is a clock id
    // supported on every target libc exposes it for.
    unsafe {
        libc::clock_gettime(clock, &mut ts);
    }
    (ts.tv_sec as u64) * 1_000_000_000 + (ts.tv_nsec as u64)
}
