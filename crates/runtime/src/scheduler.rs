use tracing::info;

use crate::device::DeviceClass;
use crate::frame::Frame;

/// Slack below the threshold still read as visible. Intersection ratios
/// reported at a threshold crossing can land a hair under the threshold.
pub const VISIBILITY_EPSILON: f64 = 1e-3;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VisibilityTransition {
    BecameVisible,
    BecameHidden,
}

/// Gates per-frame work on viewport visibility.
///
/// The device class is fixed at construction. Visibility is the only mutable
/// input and is written exclusively through [`FrameScheduler::observe_intersection`]
/// (or [`FrameScheduler::set_visible`] for hosts without an intersection signal).
/// While hidden, [`FrameScheduler::begin_frame`] returns `None` and the frame
/// clock does not move.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    device: DeviceClass,
    visibility_threshold: f64,
    visible: bool,
    last_frame: Option<Frame>,
    suspended_ticks: u64,
}

impl FrameScheduler {
    /// Starts visible: hosts that never report intersection still animate.
    pub fn new(device: DeviceClass, visibility_threshold: f64) -> Self {
        Self {
            device,
            visibility_threshold,
            visible: true,
            last_frame: None,
            suspended_ticks: 0,
        }
    }

    pub fn device(&self) -> DeviceClass {
        self.device
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Feeds the fraction of the visualization's bounding box that is in view.
    pub fn observe_intersection(&mut self, ratio: f64) -> Option<VisibilityTransition> {
        // NaN compares false, so a garbage ratio reads as hidden.
        let visible = ratio + VISIBILITY_EPSILON >= self.visibility_threshold;
        self.set_visible(visible)
    }

    pub fn set_visible(&mut self, visible: bool) -> Option<VisibilityTransition> {
        if visible == self.visible {
            return None;
        }
        self.visible = visible;
        let transition = if visible {
            VisibilityTransition::BecameVisible
        } else {
            VisibilityTransition::BecameHidden
        };
        info!(?transition, suspended_ticks = self.suspended_ticks, "visibility changed");
        Some(transition)
    }

    /// Returns the frame to run, or `None` if this tick is suspended.
    pub fn begin_frame(&mut self, dt_s: f64) -> Option<Frame> {
        if !self.visible {
            self.suspended_ticks += 1;
            return None;
        }
        let frame = match self.last_frame {
            Some(prev) => prev.next(dt_s),
            None => Frame::first(dt_s),
        };
        self.last_frame = Some(frame);
        Some(frame)
    }

    /// Most recent frame that actually ran.
    pub fn last_frame(&self) -> Option<Frame> {
        self.last_frame
    }

    /// Frame used to stamp events raised outside a running tick.
    pub fn current_frame(&self) -> Frame {
        self.last_frame.unwrap_or_else(|| Frame::first(0.0))
    }

    pub fn suspended_ticks(&self) -> u64 {
        self.suspended_ticks
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameScheduler, VisibilityTransition};
    use crate::device::DeviceClass;

    fn scheduler() -> FrameScheduler {
        FrameScheduler::new(DeviceClass::Full, 0.1)
    }

    #[test]
    fn starts_visible_and_runs_frames() {
        let mut s = scheduler();
        assert!(s.is_visible());
        let f0 = s.begin_frame(0.016).unwrap();
        let f1 = s.begin_frame(0.016).unwrap();
        assert_eq!(f0.index, 0);
        assert_eq!(f1.index, 1);
    }

    #[test]
    fn ratio_below_threshold_suspends() {
        let mut s = scheduler();
        assert_eq!(
            s.observe_intersection(0.05),
            Some(VisibilityTransition::BecameHidden)
        );
        for _ in 0..10 {
            assert!(s.begin_frame(0.016).is_none());
        }
        assert_eq!(s.suspended_ticks(), 10);
        assert!(s.last_frame().is_none());
    }

    #[test]
    fn resume_continues_frame_index() {
        let mut s = scheduler();
        s.begin_frame(0.016);
        s.observe_intersection(0.0);
        s.begin_frame(0.016);
        assert_eq!(
            s.observe_intersection(0.1),
            Some(VisibilityTransition::BecameVisible)
        );
        assert_eq!(s.begin_frame(0.016).unwrap().index, 1);
    }

    #[test]
    fn ratio_just_under_threshold_counts_as_visible() {
        let mut s = scheduler();
        s.observe_intersection(0.0);
        assert_eq!(
            s.observe_intersection(0.0995),
            Some(VisibilityTransition::BecameVisible)
        );
        assert!(s.begin_frame(0.016).is_some());
        assert_eq!(
            s.observe_intersection(0.098),
            Some(VisibilityTransition::BecameHidden)
        );
    }

    #[test]
    fn repeated_observations_do_not_retrigger() {
        let mut s = scheduler();
        assert_eq!(s.observe_intersection(0.9), None);
        assert!(s.observe_intersection(0.0).is_some());
        assert_eq!(s.observe_intersection(0.02), None);
        assert_eq!(s.observe_intersection(f64::NAN), None);
    }

    #[test]
    fn device_class_is_fixed() {
        let s = FrameScheduler::new(DeviceClass::Constrained, 0.1);
        assert_eq!(s.device(), DeviceClass::Constrained);
    }
}
