use std::time::{Duration, Instant};

/// Per-frame measurements, published at the end of every frame.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FrameStats {
    /// Monotonic frame counter (first frame is 0).
    pub frame_index: u64,

    /// Draw commands replayed.
    pub commands: u32,

    /// Host time from `begin_frame` to the end of `end_frame`.
    pub cpu_time: Duration,

    /// Device time of the most recently completed frame, if the backend
    /// reports one. Usually lags `cpu_time` by one or more frames.
    pub gpu_time: Option<Duration>,

    /// State changes passed to the backend.
    pub binds_emitted: u64,

    /// State changes elided by the state cache.
    pub binds_skipped: u64,

    /// Resources released by the deferred-release drain.
    pub released: u32,
}

impl FrameStats {
    /// CPU time in milliseconds, as shown by profiling overlays.
    pub fn cpu_time_ms(&self) -> f32 {
        self.cpu_time.as_secs_f32() * 1000.0
    }

    /// GPU time in milliseconds; `0.0` when unknown.
    pub fn gpu_time_ms(&self) -> f32 {
        self.gpu_time.map_or(0.0, |t| t.as_secs_f32() * 1000.0)
    }
}

/// Frame timer producing [`FrameStats`].
///
/// `begin()` stamps the host clock; `end()` closes the frame and advances the
/// frame counter. One profiler per renderer, so multiple renderers never share
/// timing state.
#[derive(Debug, Clone, Default)]
pub struct FrameProfiler {
    started: Option<Instant>,
    frame_index: u64,
    last: FrameStats,
}

impl FrameProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the start of a frame.
    pub fn begin(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Closes the frame started by [`FrameProfiler::begin`].
    ///
    /// The caller fills in the counters; timing and the frame index are set
    /// here. Without a matching `begin`, CPU time is zero.
    pub fn end(&mut self, mut stats: FrameStats, gpu_time: Option<Duration>) -> FrameStats {
        stats.cpu_time = self
            .started
            .take()
            .map_or(Duration::ZERO, |t| t.elapsed());
        stats.gpu_time = gpu_time;
        stats.frame_index = self.frame_index;

        self.frame_index = self.frame_index.wrapping_add(1);
        self.last = stats;
        stats
    }

    /// Stats of the last completed frame.
    #[inline]
    pub fn last(&self) -> &FrameStats {
        &self.last
    }

    /// Number of completed frames.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frame_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_index_advances_per_end() {
        let mut profiler = FrameProfiler::new();
        for expected in 0..3 {
            profiler.begin();
            let stats = profiler.end(FrameStats::default(), None);
            assert_eq!(stats.frame_index, expected);
        }
        assert_eq!(profiler.frames(), 3);
    }

    #[test]
    fn end_without_begin_has_zero_cpu_time() {
        let mut profiler = FrameProfiler::new();
        let stats = profiler.end(FrameStats::default(), None);
        assert_eq!(stats.cpu_time, Duration::ZERO);
    }

    #[test]
    fn gpu_time_is_reported_in_ms() {
        let mut profiler = FrameProfiler::new();
        profiler.begin();
        let stats = profiler.end(FrameStats::default(), Some(Duration::from_micros(2500)));
        assert!((stats.gpu_time_ms() - 2.5).abs() < 1e-4);
        assert_eq!(profiler.last().gpu_time, Some(Duration::from_micros(2500)));
    }

    #[test]
    fn unknown_gpu_time_reads_as_zero() {
        assert_eq!(FrameStats::default().gpu_time_ms(), 0.0);
    }
}
