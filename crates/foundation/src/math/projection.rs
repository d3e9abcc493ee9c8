//! Equirectangular mapping between unit-sphere directions and texture space.

use std::f64::consts::PI;

use super::{Vec2, Vec3};

/// Maps a unit direction to equirectangular UV in `[0, 1]`.
///
/// `u` wraps around the Y axis starting from -Z (u = 0) through +Z (u = 0.5);
/// `v` is 0 at the north pole (+Y) and 1 at the south pole.
pub fn unit_to_equirect_uv(dir: Vec3) -> Vec2 {
    let u = 0.5 + dir.x.atan2(dir.z) / (2.0 * PI);
    let v = 0.5 - dir.y.clamp(-1.0, 1.0).asin() / PI;
    Vec2::new(u, v)
}

/// Nearest texel for `uv` on a `width` x `height` grid, clamped to the edges.
pub fn uv_to_texel(uv: Vec2, width: u32, height: u32) -> (u32, u32) {
    let col = (uv.x * width as f64).floor();
    let row = (uv.y * height as f64).floor();
    let col = col.clamp(0.0, width.saturating_sub(1) as f64) as u32;
    let row = row.clamp(0.0, height.saturating_sub(1) as f64) as u32;
    (col, row)
}
