//! Infrastructure Adapters
//!
//! Implementations of `TimeSource`.

mod time;

pub use time::{ManualTimeSource, SystemTimeSource};
