use serde::{Deserialize, Serialize};

/// Viewport width (CSS px) below which a device counts as constrained.
pub const CONSTRAINED_BREAKPOINT_PX: f64 = 768.0;

/// Coarse performance tier, decided once per mount.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Constrained,
    Full,
}

impl DeviceClass {
    /// Static width heuristic. Non-finite or non-positive widths are treated
    /// as constrained so an unknown viewport never gets the heavy tier.
    pub fn classify(viewport_width_px: f64) -> Self {
        if viewport_width_px.is_finite() && viewport_width_px >= CONSTRAINED_BREAKPOINT_PX {
            DeviceClass::Full
        } else {
            DeviceClass::Constrained
        }
    }

    pub fn is_constrained(self) -> bool {
        self == DeviceClass::Constrained
    }
}
