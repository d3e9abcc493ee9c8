use foundation::math::{Vec3, unit_to_equirect_uv};
use runtime::{LandPolarity, VisualizationConfig};
use scene::PointField;
use scene::routes::EndpointSource;
use tracing::{info, warn};

use crate::raster::{RasterError, RasterImage};

/// Brightness test deciding which point-field entries overlie land.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LandMask {
    pub threshold: u8,
    pub polarity: LandPolarity,
    /// Radius accepted points are scaled to (globe radius + surface offset).
    pub radius: f64,
}

impl LandMask {
    pub fn from_config(config: &VisualizationConfig) -> Self {
        Self {
            threshold: config.land_threshold,
            polarity: config.land_polarity,
            radius: config.land_radius(),
        }
    }

    pub fn is_land(&self, sample: u8) -> bool {
        match self.polarity {
            LandPolarity::DarkIsLand => sample < self.threshold,
            LandPolarity::BrightIsLand => sample > self.threshold,
        }
    }

    /// Keeps the points whose raster sample passes the land test, scaled to
    /// the land radius, in point-field order.
    ///
    /// If the raster is unavailable every point is kept so the globe still
    /// shows a point cloud.
    pub fn classify(
        &self,
        points: &PointField,
        raster: Result<&RasterImage, &RasterError>,
    ) -> LandPoints {
        let raster = match raster {
            Ok(raster) => raster,
            Err(err) => {
                warn!(%err, points = points.len(), "land raster unavailable, keeping all points");
                return LandPoints::from_points(points.scaled(self.radius), true);
            }
        };

        let land = points
            .points()
            .iter()
            .filter(|p| self.is_land(raster.sample_uv(unit_to_equirect_uv(**p))))
            .map(|p| *p * self.radius);
        let land = LandPoints::from_points(land, false);
        info!(land = land.len(), of = points.len(), "classified land points");
        land
    }
}

/// Land point positions as a flat `[x0, y0, z0, x1, ...]` buffer ready for
/// upload, plus the point count.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LandPoints {
    positions: Vec<f32>,
    count: usize,
    unfiltered: bool,
}

impl LandPoints {
    fn from_points(points: impl Iterator<Item = Vec3>, unfiltered: bool) -> Self {
        let positions: Vec<f32> = points.flat_map(|p| p.to_f32_array()).collect();
        Self {
            count: positions.len() / 3,
            positions,
            unfiltered,
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// `true` when the raster was unavailable and nothing was filtered out.
    pub fn is_unfiltered(&self) -> bool {
        self.unfiltered
    }

    pub fn point(&self, index: usize) -> Vec3 {
        let p = &self.positions[index * 3..index * 3 + 3];
        Vec3::new(p[0] as f64, p[1] as f64, p[2] as f64)
    }
}

impl EndpointSource for LandPoints {
    fn endpoint_count(&self) -> usize {
        self.len()
    }

    fn endpoint(&self, index: usize) -> Vec3 {
        self.point(index)
    }
}

#[cfg(test)]
mod tests {
    use super::LandMask;
    use crate::raster::{RasterError, RasterImage};
    use approx::assert_abs_diff_eq;
    use runtime::{DeviceClass, LandPolarity, VisualizationConfig};
    use scene::PointField;

    fn mask() -> LandMask {
        LandMask::from_config(&VisualizationConfig::for_device(DeviceClass::Full))
    }

    fn uniform(value: u8) -> RasterImage {
        RasterImage::from_luma(64, 32, vec![value; 64 * 32]).unwrap()
    }

    /// Left half (u < 0.5, i.e. x < 0 on the sphere) dark, right half bright.
    fn half_dark() -> RasterImage {
        let (w, h) = (64u32, 32u32);
        let pixels = (0..h)
            .flat_map(|_| (0..w).map(move |col| if col < w / 2 { 20 } else { 230 }))
            .collect();
        RasterImage::from_luma(w, h, pixels).unwrap()
    }

    #[test]
    fn all_bright_raster_yields_no_land() {
        let field = PointField::fibonacci(1000);
        let land = mask().classify(&field, Ok(&uniform(255)));
        assert!(land.is_empty());
        assert!(land.as_slice().is_empty());
        assert!(!land.is_unfiltered());
    }

    #[test]
    fn missing_raster_keeps_every_point() {
        let field = PointField::fibonacci(1000);
        let err = RasterError::Timeout(8_000);
        let land = mask().classify(&field, Err(&err));
        assert_eq!(land.len(), 1000);
        assert_eq!(land.as_slice().len(), 3000);
        assert!(land.is_unfiltered());
    }

    #[test]
    fn land_points_sit_at_land_radius() {
        let field = PointField::fibonacci(500);
        let m = mask();
        let land = m.classify(&field, Ok(&uniform(0)));
        assert_eq!(land.len(), 500);
        for i in 0..land.len() {
            assert_abs_diff_eq!(land.point(i).length(), m.radius, epsilon = 1e-6);
        }
    }

    #[test]
    fn classification_follows_the_raster() {
        let field = PointField::fibonacci(2000);
        let land = mask().classify(&field, Ok(&half_dark()));
        assert!(land.len() > 900 && land.len() < 1100, "land = {}", land.len());
        for i in 0..land.len() {
            assert!(land.point(i).x <= 1e-6, "point {i} is on the bright half");
        }
    }

    #[test]
    fn polarity_inverts_the_selection() {
        let field = PointField::fibonacci(2000);
        let raster = half_dark();
        let dark = mask().classify(&field, Ok(&raster));
        let bright = LandMask {
            polarity: LandPolarity::BrightIsLand,
            ..mask()
        }
        .classify(&field, Ok(&raster));
        assert_eq!(dark.len() + bright.len(), field.len());
    }

    #[test]
    fn classify_is_idempotent() {
        let field = PointField::fibonacci(1500);
        let raster = half_dark();
        let a = mask().classify(&field, Ok(&raster));
        let b = mask().classify(&field, Ok(&raster));
        assert_eq!(a, b);
    }

    #[test]
    fn threshold_is_strict() {
        let m = mask();
        assert!(m.is_land(m.threshold - 1));
        assert!(!m.is_land(m.threshold));
    }
}
