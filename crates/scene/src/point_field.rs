use std::f64::consts::PI;

use foundation::math::Vec3;
use tracing::info;

/// Golden angle in radians, `π·(3 − √5)`.
pub const GOLDEN_ANGLE: f64 = PI * 0.763_932_022_500_210_3;

/// Ordered unit vectors on the sphere, immutable once generated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointField {
    points: Vec<Vec3>,
}

impl PointField {
    /// Fibonacci lattice of `count` near-equal-area directions.
    ///
    /// Index 0 sits on the north pole and the last index on the south pole.
    /// A single point is placed on the north pole.
    pub fn fibonacci(count: usize) -> Self {
        let points = match count {
            0 => Vec::new(),
            1 => vec![Vec3::Y],
            n => {
                let last = (n - 1) as f64;
                (0..n)
                    .map(|i| {
                        let y = 1.0 - (i as f64 / last) * 2.0;
                        let radius_at_y = (1.0 - y * y).max(0.0).sqrt();
                        let theta = GOLDEN_ANGLE * i as f64;
                        Vec3::new(theta.cos() * radius_at_y, y, theta.sin() * radius_at_y)
                    })
                    .collect()
            }
        };
        info!(count = points.len(), "generated point field");
        Self { points }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn scaled(&self, radius: f64) -> impl Iterator<Item = Vec3> + '_ {
        self.points.iter().map(move |p| *p * radius)
    }
}

pub fn generate_points(count: usize) -> PointField {
    PointField::fibonacci(count)
}
