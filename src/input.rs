//! Pointer and touch tracking.
//!
//! [`InputTracker`] keeps the latest pointer position in logical pixels. It
//! is written only by input events and read by the simulation step, which
//! also asks it to sample the pointer speed once per frame.
//!
//! Touch follows the primary (first) finger. When that finger lifts, variants
//! that recenter on release ease the tracked point back toward the viewport
//! centre, 10% of the remaining distance per frame, until it is within one
//! logical pixel.
//!
//! ```ignore
//! let mut input = InputTracker::new();
//! input.on_move(Vec2::new(120.0, 80.0));
//! let speed = input.sample_speed(16.0);
//! ```

use glam::Vec2;
use winit::event::{TouchPhase, WindowEvent};

use crate::surface::Viewport;

/// Fraction of the remaining distance covered per release tick.
const RELEASE_EASE: f32 = 0.1;
/// Release animation stops once this close to its target.
const RELEASE_SNAP: f32 = 1.0;

/// Snapshot of the pointer as seen by one simulation step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    /// Logical position.
    pub position: Vec2,
    /// Logical pixels per millisecond, measured between the last two samples.
    pub speed: f32,
}

/// Pointer and primary-touch tracker.
#[derive(Debug, Default)]
pub struct InputTracker {
    pointer: PointerState,
    last_sample: Vec2,
    // Point of the last touch, kept while a finger is down or easing back.
    drag: Option<Vec2>,
    release_target: Option<Vec2>,
    recenter_on_release: bool,
    primary_touch: Option<u64>,
}

impl InputTracker {
    /// A tracker with the pointer at the origin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state: position plus the most recently sampled speed.
    #[inline]
    pub fn state(&self) -> PointerState {
        self.pointer
    }

    /// Most recent logical position.
    #[inline]
    pub fn current(&self) -> Vec2 {
        self.pointer.position
    }

    /// Speed measured by the last [`sample_speed`](Self::sample_speed).
    #[inline]
    pub fn speed(&self) -> f32 {
        self.pointer.speed
    }

    /// Whether a touch point is being held or eased back.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Whether the release animation is in progress.
    pub fn is_releasing(&self) -> bool {
        self.release_target.is_some()
    }

    /// Enable or disable easing back to the centre when a touch ends.
    pub fn set_recenter_on_release(&mut self, enabled: bool) {
        self.recenter_on_release = enabled;
        if !enabled {
            self.release_target = None;
            self.drag = None;
        }
    }

    /// Mouse movement. Overwrites the position and cancels any touch release.
    pub fn on_move(&mut self, position: Vec2) {
        if !finite(position) {
            return;
        }
        self.pointer.position = position;
        self.drag = None;
        self.release_target = None;
    }

    pub fn on_touch_start(&mut self, position: Vec2) {
        self.touch_to(position);
    }

    pub fn on_touch_move(&mut self, position: Vec2) {
        self.touch_to(position);
    }

    fn touch_to(&mut self, position: Vec2) {
        if !finite(position) {
            return;
        }
        self.pointer.position = position;
        self.drag = Some(position);
        self.release_target = None;
    }

    /// The primary touch lifted. Starts easing toward `center` when enabled.
    pub fn on_touch_end(&mut self, center: Vec2) {
        if self.recenter_on_release && self.drag.is_some() && finite(center) {
            self.release_target = Some(center);
        } else {
            self.drag = None;
        }
    }

    /// Advance the release animation by one tick.
    ///
    /// Returns `true` while the animation is still running.
    pub fn tick_release(&mut self) -> bool {
        let (Some(target), Some(point)) = (self.release_target, self.drag) else {
            return false;
        };
        let remaining = target - point;
        if remaining.length() < RELEASE_SNAP {
            self.drag = None;
            self.release_target = None;
            return false;
        }
        let next = point + remaining * RELEASE_EASE;
        self.drag = Some(next);
        self.pointer.position = next;
        true
    }

    /// Measure pointer speed since the previous sample, in px/ms.
    ///
    /// Called once per simulation step. A non-positive or non-finite
    /// `dt_ms` yields zero speed.
    pub fn sample_speed(&mut self, dt_ms: f32) -> f32 {
        let moved = self.pointer.position.distance(self.last_sample);
        self.pointer.speed = if dt_ms > 0.0 && dt_ms.is_finite() {
            moved / dt_ms
        } else {
            0.0
        };
        self.last_sample = self.pointer.position;
        self.pointer.speed
    }

    /// Feed a winit window event. Physical coordinates are converted with the
    /// viewport's pixel ratio.
    ///
    /// Returns `true` if the event changed pointer state.
    pub fn handle_window_event(&mut self, event: &WindowEvent, viewport: &Viewport) -> bool {
        let to_logical = |x: f64, y: f64| Vec2::new(x as f32, y as f32) / viewport.pixel_ratio;
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.on_move(to_logical(position.x, position.y));
                true
            }
            WindowEvent::Touch(touch) => {
                let point = to_logical(touch.location.x, touch.location.y);
                match touch.phase {
                    TouchPhase::Started if self.primary_touch.is_none() => {
                        self.primary_touch = Some(touch.id);
                        self.on_touch_start(point);
                        true
                    }
                    TouchPhase::Moved if self.primary_touch == Some(touch.id) => {
                        self.on_touch_move(point);
                        true
                    }
                    TouchPhase::Ended | TouchPhase::Cancelled
                        if self.primary_touch == Some(touch.id) =>
                    {
                        self.primary_touch = None;
                        self.on_touch_end(viewport.center());
                        true
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

fn finite(v: Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;
    use winit::event::{DeviceId, Touch};

    fn touch(id: u64, phase: TouchPhase, x: f64, y: f64) -> WindowEvent {
        WindowEvent::Touch(Touch {
            // SAFETY: the id is only compared, never passed back to the platform.
            device_id: unsafe { DeviceId::dummy() },
            phase,
            location: PhysicalPosition::new(x, y),
            force: None,
            id,
        })
    }

    #[test]
    fn test_move_overwrites() {
        let mut input = InputTracker::new();
        assert_eq!(input.current(), Vec2::ZERO);

        input.on_move(Vec2::new(10.0, 20.0));
        input.on_move(Vec2::new(30.0, 40.0));
        assert_eq!(input.current(), Vec2::new(30.0, 40.0));

        input.on_move(Vec2::new(f32::NAN, 1.0));
        assert_eq!(input.current(), Vec2::new(30.0, 40.0));
    }

    #[test]
    fn test_speed_sampled_per_step() {
        let mut input = InputTracker::new();
        input.on_move(Vec2::new(30.0, 40.0));
        // 50 px over 10 ms.
        assert!((input.sample_speed(10.0) - 5.0).abs() < 1e-6);
        // No movement since the last sample.
        assert_eq!(input.sample_speed(16.0), 0.0);

        input.on_move(Vec2::new(60.0, 80.0));
        assert_eq!(input.sample_speed(0.0), 0.0);
        assert_eq!(input.speed(), 0.0);
    }

    #[test]
    fn test_release_eases_to_center() {
        let mut input = InputTracker::new();
        input.set_recenter_on_release(true);
        input.on_touch_start(Vec2::new(0.0, 0.0));
        input.on_touch_end(Vec2::new(100.0, 0.0));

        assert!(input.tick_release());
        assert!((input.current().x - 10.0).abs() < 1e-4);
        assert!(input.tick_release());
        assert!((input.current().x - 19.0).abs() < 1e-4);

        let mut ticks = 0;
        while input.tick_release() {
            ticks += 1;
            assert!(ticks < 200);
        }
        assert!(!input.is_dragging());
        assert!((input.current().x - 100.0).abs() < RELEASE_SNAP / RELEASE_EASE);
    }

    #[test]
    fn test_release_disabled_clears_drag() {
        let mut input = InputTracker::new();
        input.on_touch_start(Vec2::new(5.0, 5.0));
        input.on_touch_end(Vec2::new(100.0, 100.0));
        assert!(!input.is_dragging());
        assert!(!input.tick_release());
        assert_eq!(input.current(), Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_mouse_cancels_release() {
        let mut input = InputTracker::new();
        input.set_recenter_on_release(true);
        input.on_touch_start(Vec2::new(0.0, 0.0));
        input.on_touch_end(Vec2::new(100.0, 100.0));
        input.on_move(Vec2::new(7.0, 7.0));
        assert!(!input.is_releasing());
        assert!(!input.tick_release());
        assert_eq!(input.current(), Vec2::new(7.0, 7.0));
    }

    #[test]
    fn test_disabling_recenter_ends_drag() {
        let mut input = InputTracker::new();
        input.set_recenter_on_release(true);
        input.on_touch_start(Vec2::new(20.0, 20.0));
        assert!(input.is_dragging());
        input.set_recenter_on_release(false);
        assert!(!input.is_dragging());
        assert_eq!(input.current(), Vec2::new(20.0, 20.0));

        input.on_touch_start(Vec2::new(0.0, 0.0));
        input.on_touch_end(Vec2::new(100.0, 100.0));
        input.set_recenter_on_release(false);
        assert!(!input.is_dragging());
        assert!(!input.is_releasing());
    }

    #[test]
    fn test_window_events_are_logical() {
        let viewport = Viewport::new(400.0, 300.0, 2.0);
        let mut input = InputTracker::new();
        input.set_recenter_on_release(true);

        assert!(input.handle_window_event(&touch(1, TouchPhase::Started, 100.0, 60.0), &viewport));
        assert_eq!(input.current(), Vec2::new(50.0, 30.0));

        // A second finger is ignored.
        assert!(!input.handle_window_event(&touch(2, TouchPhase::Started, 0.0, 0.0), &viewport));
        assert!(!input.handle_window_event(&touch(2, TouchPhase::Moved, 8.0, 8.0), &viewport));
        assert_eq!(input.current(), Vec2::new(50.0, 30.0));

        assert!(input.handle_window_event(&touch(1, TouchPhase::Ended, 100.0, 60.0), &viewport));
        assert!(input.is_releasing());
        input.tick_release();
        let expected = Vec2::new(50.0, 30.0) + (viewport.center() - Vec2::new(50.0, 30.0)) * 0.1;
        assert!((input.current() - expected).length() < 1e-4);
    }
}
