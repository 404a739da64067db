//! Frame profiling.
//!
//! Provides per-frame CPU/GPU timing without coupling to a window loop.
//! Intended usage:
//! - one `FrameProfiler` per renderer
//! - `begin()` at frame start, `end()` once the frame has been submitted

mod profiler;

pub use profiler::{FrameProfiler, FrameStats};
