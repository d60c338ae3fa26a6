//! Performance profiling utilities
//!
//! Timing code is only compiled when the `perf_stats` feature is enabled.
//! Zero overhead when disabled.

// Re-export the profile macro
pub use isoscene_macros::profile;
