//! Frame timing.
//!
//! [`Time`] is driven by the timestamps the host hands to each frame rather
//! than by reading a clock itself, so headless runs and tests get exactly the
//! cadence they ask for.
//!
//! ```ignore
//! let mut time = Time::new();
//! time.advance_to(Duration::from_millis(16));
//! println!("frame {} took {:.2} ms", time.frame(), time.delta_ms());
//! ```

use std::time::Duration;

/// Frame deltas longer than this are clamped, so a window that was hidden
/// for a minute does not produce one giant step.
pub const MAX_DELTA: Duration = Duration::from_millis(250);

/// Time tracking for the frame loop.
#[derive(Debug, Clone)]
pub struct Time {
    /// Timestamp of the first frame, if any frame has run.
    origin: Option<Duration>,
    /// Timestamp of the most recent frame.
    last: Duration,
    /// Milliseconds since the first frame.
    elapsed_ms: f64,
    /// Milliseconds since the previous frame, after clamping.
    delta_ms: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_window_start: Duration,
    fps_update_interval: Duration,
}

impl Time {
    pub fn new() -> Self {
        Self {
            origin: None,
            last: Duration::ZERO,
            elapsed_ms: 0.0,
            delta_ms: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_window_start: Duration::ZERO,
            fps_update_interval: Duration::from_millis(500),
        }
    }

    /// Record a frame at host timestamp `now`.
    ///
    /// The first frame has a zero delta. Timestamps that go backwards are
    /// treated as zero elapsed time.
    ///
    /// Returns `(elapsed_ms, delta_ms)`.
    pub fn advance_to(&mut self, now: Duration) -> (f64, f32) {
        let origin = match self.origin {
            Some(origin) => origin,
            None => {
                self.origin = Some(now);
                self.last = now;
                self.fps_window_start = now;
                now
            }
        };

        let raw = now.saturating_sub(self.last);
        self.delta_ms = raw.min(MAX_DELTA).as_secs_f32() * 1000.0;
        self.last = self.last.max(now);
        self.elapsed_ms = self.last.saturating_sub(origin).as_secs_f64() * 1000.0;
        self.frame_count += 1;

        let window = self.last.saturating_sub(self.fps_window_start);
        if window >= self.fps_update_interval {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / window.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_window_start = self.last;
        }

        (self.elapsed_ms, self.delta_ms)
    }

    /// Milliseconds since the first frame.
    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Milliseconds since the previous frame.
    #[inline]
    pub fn delta_ms(&self) -> f32 {
        self.delta_ms
    }

    /// Frames recorded since start or the last reset.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Forget all frames. The next `advance_to` starts a fresh timeline.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
