/// Time primitives
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct Time(pub f64); // seconds

impl Time {
    pub fn seconds(&self) -> f64 {
        self.0
    }

    pub fn advance(self, dt_s: f64) -> Self {
        Time(self.0 + dt_s.max(0.0))
    }
}
