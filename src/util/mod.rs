//! Shared utilities: timing, rate limiting, thread coordination

pub mod fast_time;
pub mod latch;
pub mod rate_limit;
pub mod time;
