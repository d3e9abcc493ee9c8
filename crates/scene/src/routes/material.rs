/// Per-route shader inputs.
///
/// `progress` is the one uniform that changes after spawn; the lifecycle
/// manager writes it once per tick and the rendering surface reads it when
/// drawing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RouteMaterial {
    progress: f32,
    pub color: [f32; 3],
    pub trail_length: f32,
}

impl RouteMaterial {
    pub fn new(color: [f32; 3], trail_length: f32) -> Self {
        Self {
            progress: 0.0,
            color,
            trail_length,
        }
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn set_progress(&mut self, progress: f32) {
        self.progress = progress;
    }

    /// Opacity of the fragment at length parameter `along`.
    pub fn alpha_at(&self, along: f32) -> f32 {
        trail_alpha(along, self.progress, self.trail_length)
    }
}

/// Trail opacity along a route tube.
///
/// Visible only between `progress - trail_length` and `progress`; opaque at the
/// head and fading out with a smoothstep towards the tail. `along` is the
/// tube's length parameter in `[0, 1]`, so a progress beyond 1 slides the
/// trail off the end of the arc.
pub fn trail_alpha(along: f32, progress: f32, trail_length: f32) -> f32 {
    if trail_length <= 0.0 {
        return 0.0;
    }
    let tail = progress - trail_length;
    if along > progress || along < tail {
        return 0.0;
    }
    smoothstep(tail, progress, along)
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
