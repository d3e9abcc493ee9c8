use foundation::time::Time;

/// Frame metadata for one host tick.
///
/// The host's per-frame callback drives the clock, so `dt_s` varies per frame;
/// `index` only advances on frames that actually ran.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Delta time reported by the host for this frame (seconds).
    pub dt_s: f64,
    /// Accumulated simulation time at the start of the frame (seconds).
    pub time: Time,
}

impl Frame {
    pub fn first(dt_s: f64) -> Self {
        Self {
            index: 0,
            dt_s: dt_s.max(0.0),
            time: Time(0.0),
        }
    }

    pub fn next(self, dt_s: f64) -> Self {
        Self {
            index: self.index + 1,
            dt_s: dt_s.max(0.0),
            time: self.time.advance(self.dt_s),
        }
    }
}
