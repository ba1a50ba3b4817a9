//! Frame scheduling.
//!
//! The engine never asks the platform for frames directly. A [`Scheduler`]
//! hands out [`FrameHandle`]s for "call me back on the next display frame",
//! and the host later fires a handle into the engine. [`FrameDriver`] is the
//! thin shim in between that guarantees at most one frame is ever pending,
//! so two loops can never race on the same agent pool.

/// Opaque token for one scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Source of frame callbacks.
pub trait Scheduler {
    /// Request one callback on the next frame.
    fn schedule(&mut self) -> FrameHandle;

    /// Withdraw a previously scheduled callback. Cancelling a handle that
    /// already fired or was already cancelled has no effect.
    fn cancel(&mut self, handle: FrameHandle);
}

/// Scheduler that never fires by itself. Tests and headless runs pull the
/// pending handle and fire it when they want a frame.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Option<FrameHandle>,
    scheduled: u64,
    cancelled: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently scheduled handle that has not been cancelled.
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Total `schedule` calls.
    pub fn scheduled_count(&self) -> u64 {
        self.scheduled
    }

    /// Total `cancel` calls that withdrew a live handle.
    pub fn cancelled_count(&self) -> u64 {
        self.cancelled
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self) -> FrameHandle {
        self.next_id += 1;
        self.scheduled += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        handle
    }

    fn cancel(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
            self.cancelled += 1;
        }
    }
}

/// Keeps a single self-rescheduling frame loop alive between `start` and `stop`.
#[derive(Debug)]
pub struct FrameDriver<S> {
    scheduler: S,
    pending: Option<FrameHandle>,
    running: bool,
}

impl<S: Scheduler> FrameDriver<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            pending: None,
            running: false,
        }
    }

    /// Begin the loop. Calling `start` while running does nothing.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        if self.pending.is_none() {
            self.pending = Some(self.scheduler.schedule());
        }
    }

    /// End the loop and cancel the pending frame. Safe to call at any time,
    /// any number of times.
    pub fn stop(&mut self) {
        self.running = false;
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }

    /// Claim a fired handle. Returns `false` for stale or foreign handles,
    /// or when the driver is stopped; the caller must then skip the frame.
    pub fn begin_frame(&mut self, handle: FrameHandle) -> bool {
        if !self.running || self.pending != Some(handle) {
            return false;
        }
        self.pending = None;
        true
    }

    /// Finish a frame claimed with [`begin_frame`](Self::begin_frame) and
    /// schedule the next one if still running.
    pub fn end_frame(&mut self) {
        if self.running && self.pending.is_none() {
            self.pending = Some(self.scheduler.schedule());
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The handle the driver is waiting on.
    #[inline]
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_before_start_is_noop() {
        let mut driver = FrameDriver::new(ManualScheduler::new());
        driver.stop();
        driver.stop();
        assert!(!driver.is_running());
        assert_eq!(driver.scheduler().scheduled_count(), 0);
        assert_eq!(driver.scheduler().cancelled_count(), 0);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut driver = FrameDriver::new(ManualScheduler::new());
        driver.start();
        driver.start();
        assert_eq!(driver.scheduler().scheduled_count(), 1);
        assert_eq!(driver.pending(), driver.scheduler().pending());
    }

    #[test]
    fn test_stop_right_after_start_cancels() {
        let mut driver = FrameDriver::new(ManualScheduler::new());
        driver.start();
        driver.stop();
        assert_eq!(driver.scheduler().cancelled_count(), 1);
        assert_eq!(driver.pending(), None);
        assert_eq!(driver.scheduler().pending(), None);
    }

    #[test]
    fn test_frame_reschedules_once() {
        let mut driver = FrameDriver::new(ManualScheduler::new());
        driver.start();
        let first = driver.pending().unwrap();

        assert!(driver.begin_frame(first));
        driver.end_frame();
        let second = driver.pending().unwrap();
        assert_ne!(first, second);
        assert_eq!(driver.scheduler().scheduled_count(), 2);

        // The old handle is stale now.
        assert!(!driver.begin_frame(first));
    }

    #[test]
    fn test_stopped_driver_rejects_frames() {
        let mut driver = FrameDriver::new(ManualScheduler::new());
        driver.start();
        let handle = driver.pending().unwrap();
        driver.stop();
        assert!(!driver.begin_frame(handle));
        driver.end_frame();
        assert_eq!(driver.pending(), None);
    }

    #[test]
    fn test_stop_during_frame_prevents_reschedule() {
        let mut driver = FrameDriver::new(ManualScheduler::new());
        driver.start();
        let handle = driver.pending().unwrap();
        assert!(driver.begin_frame(handle));
        driver.stop();
        driver.end_frame();
        assert_eq!(driver.pending(), None);
        assert_eq!(driver.scheduler().scheduled_count(), 1);
    }
}
